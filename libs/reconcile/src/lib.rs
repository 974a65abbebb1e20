//! Scheduling-cycle primitives.
//!
//! This library holds the pure part of a scheduling cycle. Given the jobs and
//! workers fetched from their stores it decides:
//!
//! - **Reconciliation**: which jobs are already bound to a live worker and
//!   which jobs and workers are free for matching ([`reconcile`]).
//! - **Zone resolution**: which zones need a carbon lookup ([`zones`]).
//! - **Distribution**: which free worker each free job should move to
//!   ([`distribute`]).
//!
//! # Invariants
//!
//! - All functions are pure; nothing is retained between calls
//! - Decisions are deterministic given the same inputs in the same order
//! - An emitted assignment always moves a job to a strictly cleaner zone

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use carbon_model::{Job, JobStatus, UpdateJob, Worker, Zone};

mod distribute;

pub use distribute::{distribute, is_usable, DistributionSummary};

/// A scheduled job whose worker still exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assigned<'a> {
    pub job: &'a Job,
    pub worker: &'a Worker,
}

impl Assigned<'_> {
    /// Returns true if the registry still lists the worker as available,
    /// meaning the worker half of the assignment never landed.
    pub fn needs_confirmation(&self) -> bool {
        self.worker.is_available()
    }

    /// Rebuilds the assignment command for this existing binding.
    ///
    /// Returns `None` when the job record lacks the carbon figures of its
    /// assignment, since the command cannot be restated faithfully.
    pub fn confirmation(&self) -> Option<UpdateJob> {
        Some(UpdateJob {
            job_id: self.job.id.clone(),
            worker_id: self.worker.id.clone(),
            compute_zone: self.worker.zone.clone(),
            carbon_intensity: self.job.carbon_intensity?,
            carbon_saving: self.job.carbon_saving?,
        })
    }
}

/// Partition of one cycle's jobs and workers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation<'a> {
    /// Jobs already bound to a worker present in this cycle.
    pub already_assigned: Vec<Assigned<'a>>,

    /// Queued jobs and scheduled jobs whose worker has disappeared.
    pub unassigned_jobs: Vec<&'a Job>,

    /// Available workers not bound to an already-assigned job.
    pub unassigned_workers: Vec<&'a Worker>,
}

/// Partition jobs and workers into already-assigned and free sets.
///
/// Jobs in `Running` or a terminal status are owned by the worker daemons
/// and appear in no partition. Input order is kept within each partition.
pub fn reconcile<'a>(jobs: &'a [Job], workers: &'a [Worker]) -> Reconciliation<'a> {
    let by_id: HashMap<&str, &Worker> = workers.iter().map(|w| (w.id.as_str(), w)).collect();

    let mut result = Reconciliation::default();
    let mut bound: HashSet<&str> = HashSet::new();

    for job in jobs {
        match job.status {
            JobStatus::Queued => result.unassigned_jobs.push(job),
            JobStatus::Scheduled => {
                let worker = job
                    .worker_id
                    .as_ref()
                    .and_then(|id| by_id.get(id.as_str()).copied());

                match worker {
                    Some(worker) => {
                        bound.insert(worker.id.as_str());
                        result.already_assigned.push(Assigned { job, worker });
                    }
                    // Orphaned: the worker left the registry.
                    None => result.unassigned_jobs.push(job),
                }
            }
            JobStatus::Running | JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => {}
        }
    }

    result.unassigned_workers = workers
        .iter()
        .filter(|w| w.is_available() && !bound.contains(w.id.as_str()))
        .collect();

    result
}

/// Collect the zones that need a carbon lookup.
///
/// Union of job creation zones and worker zones, without the empty zone.
/// The set is ordered for stable logging only.
pub fn zones<'a, J, W>(jobs: J, workers: W) -> BTreeSet<Zone>
where
    J: IntoIterator<Item = &'a Job>,
    W: IntoIterator<Item = &'a Worker>,
{
    jobs.into_iter()
        .map(|j| &j.creation_zone)
        .chain(workers.into_iter().map(|w| &w.zone))
        .filter(|z| !z.is_empty())
        .cloned()
        .collect()
}

/// Default scheduling interval.
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(60);

#[cfg(test)]
mod tests {
    use super::*;
    use carbon_model::{JobId, WorkerId, WorkerStatus};

    fn job(id: &str, zone: &str) -> Job {
        Job::queued(JobId::parse(id).unwrap(), zone)
    }

    fn scheduled(id: &str, zone: &str, worker: &str) -> Job {
        let mut job = job(id, zone);
        job.status = JobStatus::Scheduled;
        job.worker_id = Some(WorkerId::parse(worker).unwrap());
        job
    }

    fn worker(id: &str, zone: &str) -> Worker {
        Worker::available(WorkerId::parse(id).unwrap(), zone)
    }

    #[test]
    fn test_reconcile_queued_jobs_are_unassigned() {
        let jobs = vec![job("j1", "DE"), job("j2", "FR")];
        let workers = vec![worker("w1", "FR")];

        let result = reconcile(&jobs, &workers);

        assert!(result.already_assigned.is_empty());
        assert_eq!(result.unassigned_jobs.len(), 2);
        assert_eq!(result.unassigned_workers.len(), 1);
    }

    #[test]
    fn test_reconcile_bound_job_excludes_worker() {
        let jobs = vec![scheduled("j1", "DE", "w1"), job("j2", "DE")];
        let mut busy = worker("w1", "FR");
        busy.status = WorkerStatus::Running;
        let workers = vec![busy, worker("w2", "CH")];

        let result = reconcile(&jobs, &workers);

        assert_eq!(result.already_assigned.len(), 1);
        assert_eq!(result.already_assigned[0].job.id.as_str(), "j1");
        assert_eq!(result.already_assigned[0].worker.id.as_str(), "w1");
        assert_eq!(result.unassigned_jobs.len(), 1);
        assert_eq!(result.unassigned_jobs[0].id.as_str(), "j2");
        assert_eq!(result.unassigned_workers.len(), 1);
        assert_eq!(result.unassigned_workers[0].id.as_str(), "w2");
    }

    #[test]
    fn test_reconcile_bound_worker_still_available_is_not_free() {
        let jobs = vec![scheduled("j1", "DE", "w1")];
        let workers = vec![worker("w1", "FR")];

        let result = reconcile(&jobs, &workers);

        assert!(result.unassigned_workers.is_empty());
        assert!(result.already_assigned[0].needs_confirmation());
    }

    #[test]
    fn test_reconcile_orphaned_job_is_unassigned() {
        let jobs = vec![scheduled("j1", "DE", "gone")];
        let workers = vec![worker("w1", "FR")];

        let result = reconcile(&jobs, &workers);

        assert!(result.already_assigned.is_empty());
        assert_eq!(result.unassigned_jobs.len(), 1);
        assert_eq!(result.unassigned_workers.len(), 1);
    }

    #[test]
    fn test_reconcile_scheduled_without_worker_is_orphan() {
        let mut j = job("j1", "DE");
        j.status = JobStatus::Scheduled;
        let jobs = vec![j];

        let result = reconcile(&jobs, &[]);

        assert_eq!(result.unassigned_jobs.len(), 1);
    }

    #[test]
    fn test_reconcile_ignores_running_and_terminal_jobs() {
        let mut jobs = Vec::new();
        for (i, status) in [
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ]
        .into_iter()
        .enumerate()
        {
            let mut j = scheduled(&format!("j{i}"), "DE", "w1");
            j.status = status;
            jobs.push(j);
        }
        let workers = vec![worker("w1", "FR")];

        let result = reconcile(&jobs, &workers);

        assert!(result.already_assigned.is_empty());
        assert!(result.unassigned_jobs.is_empty());
        // Only a Scheduled binding reserves a worker.
        assert_eq!(result.unassigned_workers.len(), 1);
    }

    #[test]
    fn test_reconcile_running_worker_is_not_free() {
        let mut w = worker("w1", "FR");
        w.status = WorkerStatus::Running;
        let workers = vec![w];

        let result = reconcile(&[], &workers);

        assert!(result.unassigned_workers.is_empty());
    }

    #[test]
    fn test_confirmation_carries_existing_assignment() {
        let mut j = scheduled("j1", "DE", "w1");
        j.carbon_intensity = Some(20.0);
        j.carbon_saving = Some(80.0);
        let w = worker("w1", "FR");
        let assigned = Assigned { job: &j, worker: &w };

        let update = assigned.confirmation().unwrap();

        assert_eq!(update.job_id.as_str(), "j1");
        assert_eq!(update.worker_id.as_str(), "w1");
        assert_eq!(update.compute_zone, Zone::new("FR"));
        assert_eq!(update.carbon_intensity, 20.0);
        assert_eq!(update.carbon_saving, 80.0);
    }

    #[test]
    fn test_confirmation_requires_carbon_figures() {
        let mut j = scheduled("j1", "DE", "w1");
        j.carbon_intensity = Some(20.0);
        let w = worker("w1", "FR");
        let assigned = Assigned { job: &j, worker: &w };

        assert!(assigned.needs_confirmation());
        assert_eq!(assigned.confirmation(), None);
    }

    #[test]
    fn test_zones_union_without_empty() {
        let jobs = vec![job("j1", "DE"), job("j2", ""), job("j3", "US")];
        let workers = vec![worker("w1", "US"), worker("w2", "CH"), worker("w3", "")];

        let result = zones(&jobs, &workers);

        let expected: BTreeSet<Zone> = ["CH", "DE", "US"].into_iter().map(Zone::from).collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_zones_empty_inputs() {
        assert!(zones(&[], &[]).is_empty());
    }
}
