//! Assignment commands.

use carbon_id::{JobId, WorkerId, Zone};
use serde::{Deserialize, Serialize};

/// Assignment of one job to one worker.
///
/// Emitted once to the job store and once to the worker registry. The
/// scheduler does not persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateJob {
    pub job_id: JobId,
    pub worker_id: WorkerId,

    /// Zone of the worker that will run the job.
    pub compute_zone: Zone,

    /// Carbon intensity of the compute zone at assignment time.
    pub carbon_intensity: f64,

    /// Origin-zone intensity minus compute-zone intensity. Never negative
    /// for commands produced by the distribution.
    pub carbon_saving: f64,
}
