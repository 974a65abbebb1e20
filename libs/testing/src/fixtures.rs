//! Record builders and reference scenarios.

use carbon_model::{
    CarbonIntensity, Job, JobId, JobStatus, UpdateJob, Worker, WorkerId, WorkerStatus,
};

/// A queued job. Panics on an invalid ID.
pub fn job(id: &str, zone: &str) -> Job {
    Job::queued(JobId::parse(id).expect("valid job id"), zone)
}

/// A job already scheduled onto `worker`.
pub fn scheduled_job(id: &str, zone: &str, worker: &str) -> Job {
    let mut job = job(id, zone);
    job.status = JobStatus::Scheduled;
    job.worker_id = Some(WorkerId::parse(worker).expect("valid worker id"));
    job
}

/// A job placed onto `worker` by an earlier cycle, with the carbon figures of
/// that assignment recorded.
pub fn placed_job(
    id: &str,
    zone: &str,
    worker: &str,
    compute_zone: &str,
    carbon_intensity: f64,
    carbon_saving: f64,
) -> Job {
    let mut job = job(id, zone);
    let update = UpdateJob {
        job_id: job.id.clone(),
        worker_id: WorkerId::parse(worker).expect("valid worker id"),
        compute_zone: compute_zone.into(),
        carbon_intensity,
        carbon_saving,
    };
    job.apply_assignment(&update);
    job
}

/// An available worker.
pub fn worker(id: &str, zone: &str) -> Worker {
    Worker::available(WorkerId::parse(id).expect("valid worker id"), zone)
}

/// A worker already running a job.
pub fn running_worker(id: &str, zone: &str) -> Worker {
    let mut worker = worker(id, zone);
    worker.status = WorkerStatus::Running;
    worker
}

/// Carbon data in the given order.
pub fn carbon(entries: &[(&str, f64)]) -> Vec<CarbonIntensity> {
    entries
        .iter()
        .map(|(zone, value)| CarbonIntensity::new(*zone, *value))
        .collect()
}

/// One cycle's worth of collaborator data.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub jobs: Vec<Job>,
    pub workers: Vec<Worker>,
    pub carbon: Vec<CarbonIntensity>,
}

/// Mixed-zone reference scenario.
///
/// Jobs in DE, US, JP, DE, US; workers in JP, CH, FR, DE, US; carbon
/// DE 100, US 10, JP 50, FR 20, CH 5. `job-4` is already running on `w-de`.
///
/// The distribution pass produces exactly:
/// - `job-1` (DE) -> `w-jp`, saving 50
/// - `job-3` (JP) -> `w-fr`, saving 30
/// - `job-5` (US) -> `w-ch`, saving 5
///
/// `w-us` is discarded against `job-5` (equal intensity) and `job-2` stays
/// queued.
pub fn scenario_a() -> Scenario {
    Scenario {
        jobs: vec![
            job("job-1", "DE"),
            job("job-2", "US"),
            job("job-3", "JP"),
            scheduled_job("job-4", "DE", "w-de"),
            job("job-5", "US"),
        ],
        workers: vec![
            worker("w-jp", "JP"),
            worker("w-ch", "CH"),
            worker("w-fr", "FR"),
            running_worker("w-de", "DE"),
            worker("w-us", "US"),
        ],
        carbon: carbon(&[
            ("DE", 100.0),
            ("US", 10.0),
            ("JP", 50.0),
            ("FR", 20.0),
            ("CH", 5.0),
        ]),
    }
}

/// Scenario where one worker has no carbon entry.
///
/// `w-xx` sits in a zone the provider does not know and must never be
/// assigned, even though it is the only worker in a "different" zone.
pub fn scenario_unknown_worker_zone() -> Scenario {
    Scenario {
        jobs: vec![job("job-1", "DE"), job("job-2", "DE")],
        workers: vec![worker("w-fr", "FR"), worker("w-xx", "XX")],
        carbon: carbon(&[("DE", 100.0), ("FR", 20.0)]),
    }
}
