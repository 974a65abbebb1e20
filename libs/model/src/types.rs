//! Job, worker and carbon-intensity records.

use carbon_id::{JobId, WorkerId, Zone};
use serde::{Deserialize, Deserializer, Serialize};

use crate::UpdateJob;

// =============================================================================
// Statuses
// =============================================================================

/// Job lifecycle status.
///
/// Jobs are created `Queued` by the intake service. Only the scheduler moves
/// a job to `Scheduled`; later transitions belong to the worker daemons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Scheduled,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Worker availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Available,
    Running,
}

// =============================================================================
// Records
// =============================================================================

/// A compute job as stored by the job store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,

    /// Zone the job was submitted in. Immutable after creation.
    #[serde(default)]
    pub creation_zone: Zone,

    pub status: JobStatus,

    /// Assigned worker; absent until the job is scheduled.
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub worker_id: Option<WorkerId>,

    /// Zone of the assigned worker.
    #[serde(default)]
    pub compute_zone: Zone,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_intensity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_saving: Option<f64>,
}

impl Job {
    /// Creates a freshly queued job.
    pub fn queued(id: JobId, creation_zone: impl Into<Zone>) -> Self {
        Self {
            id,
            creation_zone: creation_zone.into(),
            status: JobStatus::Queued,
            worker_id: None,
            compute_zone: Zone::default(),
            carbon_intensity: None,
            carbon_saving: None,
        }
    }

    /// Applies an assignment command, moving the job to `Scheduled`.
    ///
    /// This is what a job store does on receipt of an [`UpdateJob`].
    pub fn apply_assignment(&mut self, update: &UpdateJob) {
        self.status = JobStatus::Scheduled;
        self.worker_id = Some(update.worker_id.clone());
        self.compute_zone = update.compute_zone.clone();
        self.carbon_intensity = Some(update.carbon_intensity);
        self.carbon_saving = Some(update.carbon_saving);
    }
}

/// A compute worker as stored by the worker registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,

    /// Zone fixed at registration.
    #[serde(default)]
    pub zone: Zone,

    pub status: WorkerStatus,
}

impl Worker {
    /// Creates an available worker.
    pub fn available(id: WorkerId, zone: impl Into<Zone>) -> Self {
        Self {
            id,
            zone: zone.into(),
            status: WorkerStatus::Available,
        }
    }

    /// Returns true if the worker may receive new work.
    pub fn is_available(&self) -> bool {
        self.status == WorkerStatus::Available
    }
}

/// Carbon intensity of one zone for the current cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonIntensity {
    pub zone: Zone,

    /// Emissions per unit of compute; lower is cleaner.
    pub value: f64,
}

impl CarbonIntensity {
    pub fn new(zone: impl Into<Zone>, value: f64) -> Self {
        Self {
            zone: zone.into(),
            value,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<WorkerId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => WorkerId::parse(s).map(Some).map_err(serde::de::Error::custom),
    }
}

// =============================================================================
// Tests
// =============================================================================
