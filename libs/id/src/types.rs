//! Typed ID definitions and zone codes.
//!
//! Job and worker IDs are assigned by the stores that own those records, so
//! they are carried verbatim rather than generated here.

use serde::{Deserialize, Serialize};

use crate::define_id;

// =============================================================================
// Scheduling entities
// =============================================================================

define_id!(JobId, "job");
define_id!(WorkerId, "worker");

// =============================================================================
// Zones
// =============================================================================

/// A geographic or electrical-grid zone code, e.g. `DE` or `US-CAL-CISO`.
///
/// Zones arrive from external records and may be empty; an empty zone means
/// "unknown" and never takes part in carbon lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zone(String);

impl Zone {
    /// Creates a zone from its code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the zone code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the empty (unknown) zone.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Zone {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for Zone {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl AsRef<str> for Zone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Tests
// =============================================================================
