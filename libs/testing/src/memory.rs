//! In-memory collaborators.
//!
//! Each double behaves like a well-mannered store: assignments are applied to
//! the held records, so a second cycle run against the same doubles sees the
//! outcome of the first. Failures can be injected per call kind.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use carbon_adapters::{
    AdapterError, AdapterResult, CarbonIntensityAdapter, JobAdapter, WorkerAdapter,
};
use carbon_model::{CarbonIntensity, Job, UpdateJob, Worker, WorkerStatus, Zone};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A command received by a double.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AssignJob(UpdateJob),
    AssignWorker(UpdateJob),
}

/// Ordered log of commands shared between doubles.
#[derive(Debug, Clone, Default)]
pub struct CommandLog(Arc<Mutex<Vec<Command>>>);

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, command: Command) {
        lock(&self.0).push(command);
    }

    /// All commands in arrival order.
    pub fn commands(&self) -> Vec<Command> {
        lock(&self.0).clone()
    }

    /// `AssignJob` payloads in arrival order.
    pub fn job_assignments(&self) -> Vec<UpdateJob> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                Command::AssignJob(u) => Some(u),
                Command::AssignWorker(_) => None,
            })
            .collect()
    }

    /// `AssignWorker` payloads in arrival order.
    pub fn worker_assignments(&self) -> Vec<UpdateJob> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                Command::AssignWorker(u) => Some(u),
                Command::AssignJob(_) => None,
            })
            .collect()
    }
}

/// Call budget: succeed `remaining` more times, then fail.
#[derive(Debug, Default)]
struct FailAfter(Option<usize>);

impl FailAfter {
    fn take(&mut self) -> bool {
        match &mut self.0 {
            None => true,
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                true
            }
        }
    }
}

/// Job store double.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<Vec<Job>>,
    log: CommandLog,
    fail_get: Option<String>,
    assign_budget: Mutex<FailAfter>,
}

impl InMemoryJobStore {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self {
            jobs: Mutex::new(jobs),
            ..Self::default()
        }
    }

    /// Record commands into a shared log.
    pub fn with_log(mut self, log: CommandLog) -> Self {
        self.log = log;
        self
    }

    /// Make every `get_jobs` call fail.
    pub fn failing_get(mut self, message: impl Into<String>) -> Self {
        self.fail_get = Some(message.into());
        self
    }

    /// Accept `n` assignments, then fail the rest.
    pub fn failing_assign_after(self, n: usize) -> Self {
        *lock(&self.assign_budget) = FailAfter(Some(n));
        self
    }

    /// Current job records.
    pub fn jobs(&self) -> Vec<Job> {
        lock(&self.jobs).clone()
    }
}

#[async_trait]
impl JobAdapter for InMemoryJobStore {
    async fn get_jobs(&self) -> AdapterResult<Vec<Job>> {
        if let Some(message) = &self.fail_get {
            return Err(AdapterError::Unavailable(message.clone()));
        }
        Ok(self.jobs())
    }

    async fn assign_job(&self, update: &UpdateJob) -> AdapterResult<()> {
        if !lock(&self.assign_budget).take() {
            return Err(AdapterError::Unavailable(format!(
                "job store rejected assignment of {}",
                update.job_id
            )));
        }

        self.log.push(Command::AssignJob(update.clone()));
        let mut jobs = lock(&self.jobs);
        if let Some(job) = jobs.iter_mut().find(|j| j.id == update.job_id) {
            job.apply_assignment(update);
        }
        Ok(())
    }
}

/// Worker registry double.
#[derive(Debug, Default)]
pub struct InMemoryWorkerRegistry {
    workers: Mutex<Vec<Worker>>,
    log: CommandLog,
    fail_get: Option<String>,
    assign_budget: Mutex<FailAfter>,
}

impl InMemoryWorkerRegistry {
    pub fn new(workers: Vec<Worker>) -> Self {
        Self {
            workers: Mutex::new(workers),
            ..Self::default()
        }
    }

    pub fn with_log(mut self, log: CommandLog) -> Self {
        self.log = log;
        self
    }

    pub fn failing_get(mut self, message: impl Into<String>) -> Self {
        self.fail_get = Some(message.into());
        self
    }

    pub fn failing_assign_after(self, n: usize) -> Self {
        *lock(&self.assign_budget) = FailAfter(Some(n));
        self
    }

    pub fn workers(&self) -> Vec<Worker> {
        lock(&self.workers).clone()
    }
}

#[async_trait]
impl WorkerAdapter for InMemoryWorkerRegistry {
    async fn get_workers(&self) -> AdapterResult<Vec<Worker>> {
        if let Some(message) = &self.fail_get {
            return Err(AdapterError::Unavailable(message.clone()));
        }
        Ok(self.workers())
    }

    async fn assign_worker(&self, update: &UpdateJob) -> AdapterResult<()> {
        if !lock(&self.assign_budget).take() {
            return Err(AdapterError::Unavailable(format!(
                "worker registry rejected assignment of {}",
                update.worker_id
            )));
        }

        self.log.push(Command::AssignWorker(update.clone()));
        let mut workers = lock(&self.workers);
        if let Some(worker) = workers.iter_mut().find(|w| w.id == update.worker_id) {
            worker.status = WorkerStatus::Running;
        }
        Ok(())
    }
}

/// Carbon provider double serving a fixed snapshot.
#[derive(Debug, Default)]
pub struct StaticCarbonProvider {
    data: Vec<CarbonIntensity>,
    fail: Option<String>,
    requests: Mutex<Vec<Vec<Zone>>>,
}

impl StaticCarbonProvider {
    pub fn new(data: Vec<CarbonIntensity>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail = Some(message.into());
        self
    }

    /// Zones requested by each call, in call order.
    pub fn requests(&self) -> Vec<Vec<Zone>> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl CarbonIntensityAdapter for StaticCarbonProvider {
    async fn get_carbon_intensities(&self, zones: &[Zone]) -> AdapterResult<Vec<CarbonIntensity>> {
        lock(&self.requests).push(zones.to_vec());

        if let Some(message) = &self.fail {
            return Err(AdapterError::Unavailable(message.clone()));
        }

        let wanted: HashSet<&Zone> = zones.iter().collect();
        Ok(self
            .data
            .iter()
            .filter(|c| wanted.contains(&c.zone))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{carbon, job, worker};
    use carbon_model::{JobStatus, WorkerId};

    fn update(job_id: &str, worker_id: &str) -> UpdateJob {
        UpdateJob {
            job_id: job_id.parse().unwrap(),
            worker_id: worker_id.parse().unwrap(),
            compute_zone: Zone::new("FR"),
            carbon_intensity: 20.0,
            carbon_saving: 80.0,
        }
    }

    #[tokio::test]
    async fn test_job_store_applies_assignment() {
        let store = InMemoryJobStore::new(vec![job("job-1", "DE")]);

        store.assign_job(&update("job-1", "w-fr")).await.unwrap();

        let jobs = store.get_jobs().await.unwrap();
        assert_eq!(jobs[0].status, JobStatus::Scheduled);
        assert_eq!(jobs[0].worker_id, Some(WorkerId::parse("w-fr").unwrap()));
    }

    #[tokio::test]
    async fn test_worker_registry_marks_running() {
        let registry = InMemoryWorkerRegistry::new(vec![worker("w-fr", "FR")]);

        registry.assign_worker(&update("job-1", "w-fr")).await.unwrap();

        assert_eq!(registry.workers()[0].status, WorkerStatus::Running);
    }

    #[tokio::test]
    async fn test_assign_budget() {
        let store = InMemoryJobStore::new(vec![]).failing_assign_after(1);

        assert!(store.assign_job(&update("job-1", "w-1")).await.is_ok());
        assert!(store.assign_job(&update("job-2", "w-2")).await.is_err());
    }

    #[tokio::test]
    async fn test_shared_log_keeps_order() {
        let log = CommandLog::new();
        let store = InMemoryJobStore::new(vec![]).with_log(log.clone());
        let registry = InMemoryWorkerRegistry::new(vec![]).with_log(log.clone());

        store.assign_job(&update("job-1", "w-1")).await.unwrap();
        registry.assign_worker(&update("job-1", "w-1")).await.unwrap();

        assert!(matches!(log.commands()[0], Command::AssignJob(_)));
        assert!(matches!(log.commands()[1], Command::AssignWorker(_)));
    }

    #[tokio::test]
    async fn test_carbon_provider_filters_to_requested_zones() {
        let provider = StaticCarbonProvider::new(carbon(&[("DE", 100.0), ("FR", 20.0)]));

        let data = provider
            .get_carbon_intensities(&[Zone::new("FR")])
            .await
            .unwrap();

        assert_eq!(data, carbon(&[("FR", 20.0)]));
        assert_eq!(provider.requests(), vec![vec![Zone::new("FR")]]);
    }
}
