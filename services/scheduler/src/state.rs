//! Application state shared across request handlers.

use std::sync::Arc;

use crate::scheduler::CycleRunner;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    runner: Arc<CycleRunner>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(runner: Arc<CycleRunner>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { runner }),
        }
    }

    /// Get the cycle runner shared with the interval driver.
    pub fn runner(&self) -> &Arc<CycleRunner> {
        &self.inner.runner
    }
}
