//! Scheduling cycle orchestrator.
//!
//! One call to [`Scheduler::schedule_job`] runs one complete cycle:
//! - Fetch jobs and workers from their stores
//! - Reconcile existing assignments
//! - Resolve the zones that need a carbon lookup and fetch their intensities
//! - Distribute free jobs to cleaner free workers
//! - Emit confirmations, then new assignments
//!
//! Nothing survives the cycle. Adapter calls run one after another; the first
//! failure aborts the cycle and commands already emitted stay emitted.

use std::collections::HashSet;
use std::sync::Arc;

use carbon_adapters::{AdapterError, CarbonIntensityAdapter, JobAdapter, WorkerAdapter};
use carbon_model::{CarbonIntensity, UpdateJob, Zone};
use carbon_reconcile::{distribute, is_usable, reconcile, zones, DistributionSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Result type for scheduling cycles.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors that abort a cycle.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("cycle aborted at {stage}: {source}")]
    Adapter {
        stage: CycleStage,
        #[source]
        source: AdapterError,
    },

    #[error("cycle aborted at {stage}: collaborator returned no data")]
    EmptyResult { stage: CycleStage },
}

impl SchedulerError {
    /// Stage the cycle was in when it aborted.
    pub fn stage(&self) -> CycleStage {
        match self {
            Self::Adapter { stage, .. } | Self::EmptyResult { stage } => *stage,
        }
    }
}

/// Stages of a scheduling cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStage {
    FetchJobs,
    FetchWorkers,
    Reconcile,
    ResolveZones,
    FetchCarbon,
    Distribute,
    Emit,
    Done,
}

impl CycleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchJobs => "fetch_jobs",
            Self::FetchWorkers => "fetch_workers",
            Self::Reconcile => "reconcile",
            Self::ResolveZones => "resolve_zones",
            Self::FetchCarbon => "fetch_carbon",
            Self::Distribute => "distribute",
            Self::Emit => "emit",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for CycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when a collaborator returns an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyResultPolicy {
    /// Nothing to do: finish the cycle successfully.
    #[default]
    Skip,

    /// Abort the cycle with [`SchedulerError::EmptyResult`].
    Fail,
}

impl std::str::FromStr for EmptyResultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown empty result policy: {other}")),
        }
    }
}

/// Behavioural switches for the orchestrator.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub empty_result_policy: EmptyResultPolicy,

    /// Re-send the worker command for scheduled jobs whose worker is still
    /// listed as available.
    pub confirm_assignments: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            empty_result_policy: EmptyResultPolicy::Skip,
            confirm_assignments: true,
        }
    }
}

/// Outcome of a successful cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub jobs_seen: usize,
    pub workers_seen: usize,
    pub already_assigned: usize,
    pub confirmed: usize,
    pub assignments: Vec<UpdateJob>,
    pub total_carbon_saving: f64,

    /// Stage at which an empty result ended the cycle early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<CycleStage>,
}

impl CycleReport {
    fn new(cycle_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            cycle_id,
            started_at: now,
            finished_at: now,
            jobs_seen: 0,
            workers_seen: 0,
            already_assigned: 0,
            confirmed: 0,
            assignments: Vec::new(),
            total_carbon_saving: 0.0,
            skipped: None,
        }
    }
}

/// The scheduling cycle orchestrator.
#[derive(Clone)]
pub struct Scheduler {
    jobs: Arc<dyn JobAdapter>,
    workers: Arc<dyn WorkerAdapter>,
    carbon: Arc<dyn CarbonIntensityAdapter>,
    options: SchedulerOptions,
}

impl Scheduler {
    /// Create a new scheduler over the three collaborator ports.
    pub fn new(
        jobs: Arc<dyn JobAdapter>,
        workers: Arc<dyn WorkerAdapter>,
        carbon: Arc<dyn CarbonIntensityAdapter>,
        options: SchedulerOptions,
    ) -> Self {
        Self {
            jobs,
            workers,
            carbon,
            options,
        }
    }

    /// Run one scheduling cycle.
    pub async fn schedule_job(&self) -> SchedulerResult<CycleReport> {
        let cycle_id = Uuid::now_v7();
        let span = info_span!("scheduling_cycle", cycle_id = %cycle_id);
        Cycle::new(self, cycle_id).run().instrument(span).await
    }
}

/// State of one in-flight cycle.
struct Cycle<'s> {
    scheduler: &'s Scheduler,
    stage: CycleStage,
    report: CycleReport,
}

impl<'s> Cycle<'s> {
    fn new(scheduler: &'s Scheduler, cycle_id: Uuid) -> Self {
        Self {
            scheduler,
            stage: CycleStage::FetchJobs,
            report: CycleReport::new(cycle_id),
        }
    }

    fn enter(&mut self, stage: CycleStage) {
        debug!(from = %self.stage, to = %stage, "Cycle stage transition");
        self.stage = stage;
    }

    fn abort(&self, source: AdapterError) -> SchedulerError {
        warn!(stage = %self.stage, error = %source, "Scheduling cycle aborted");
        SchedulerError::Adapter {
            stage: self.stage,
            source,
        }
    }

    /// Apply the empty-result policy at the current stage.
    ///
    /// Returns `Ok(())` when the cycle should stop successfully.
    fn on_empty(&mut self) -> SchedulerResult<()> {
        match self.scheduler.options.empty_result_policy {
            EmptyResultPolicy::Fail => {
                warn!(stage = %self.stage, "Collaborator returned no data");
                Err(SchedulerError::EmptyResult { stage: self.stage })
            }
            EmptyResultPolicy::Skip => {
                debug!(stage = %self.stage, "Collaborator returned no data, nothing to do");
                self.report.skipped = Some(self.stage);
                Ok(())
            }
        }
    }

    fn finish(mut self) -> CycleReport {
        self.enter(CycleStage::Done);
        self.report.finished_at = Utc::now();
        self.report
    }

    async fn run(mut self) -> SchedulerResult<CycleReport> {
        let scheduler = self.scheduler;

        let jobs = match scheduler.jobs.get_jobs().await {
            Ok(jobs) => jobs,
            Err(e) => return Err(self.abort(e)),
        };
        self.report.jobs_seen = jobs.len();
        if jobs.is_empty() {
            self.on_empty()?;
            return Ok(self.finish());
        }

        self.enter(CycleStage::FetchWorkers);
        let workers = match scheduler.workers.get_workers().await {
            Ok(workers) => workers,
            Err(e) => return Err(self.abort(e)),
        };
        self.report.workers_seen = workers.len();
        if workers.is_empty() {
            self.on_empty()?;
            return Ok(self.finish());
        }

        self.enter(CycleStage::Reconcile);
        let reconciliation = reconcile(&jobs, &workers);
        self.report.already_assigned = reconciliation.already_assigned.len();
        let mut confirmations: Vec<UpdateJob> = Vec::new();
        if scheduler.options.confirm_assignments {
            for assigned in reconciliation
                .already_assigned
                .iter()
                .filter(|a| a.needs_confirmation())
            {
                match assigned.confirmation() {
                    Some(update) => confirmations.push(update),
                    None => warn!(
                        job_id = %assigned.job.id,
                        worker_id = %assigned.worker.id,
                        "Bound worker still available but job lacks carbon figures, not confirming"
                    ),
                }
            }
        }
        debug!(
            already_assigned = reconciliation.already_assigned.len(),
            unassigned_jobs = reconciliation.unassigned_jobs.len(),
            unassigned_workers = reconciliation.unassigned_workers.len(),
            to_confirm = confirmations.len(),
            "Reconciled jobs and workers"
        );

        self.enter(CycleStage::ResolveZones);
        let zone_set: Vec<Zone> = zones(
            reconciliation.unassigned_jobs.iter().copied(),
            reconciliation.unassigned_workers.iter().copied(),
        )
        .into_iter()
        .collect();
        debug!(zone_count = zone_set.len(), "Resolved zones");

        self.enter(CycleStage::FetchCarbon);
        let carbon = if zone_set.is_empty() {
            debug!("No zones to look up, skipping carbon fetch");
            Vec::new()
        } else {
            let data = match scheduler.carbon.get_carbon_intensities(&zone_set).await {
                Ok(data) => data,
                Err(e) => return Err(self.abort(e)),
            };
            if data.is_empty() {
                self.on_empty()?;
                return Ok(self.finish());
            }
            warn_on_duplicate_zones(&data);
            data
        };

        self.enter(CycleStage::Distribute);
        let assignments = distribute(
            &reconciliation.unassigned_jobs,
            &reconciliation.unassigned_workers,
            &carbon,
        );
        let summary = DistributionSummary::from_assignments(&assignments);
        debug!(
            assignments = summary.assignments,
            total_carbon_saving = summary.total_carbon_saving,
            "Distribution computed"
        );

        self.enter(CycleStage::Emit);
        self.emit(&confirmations, assignments).await?;

        let report = self.finish();
        info!(
            jobs_seen = report.jobs_seen,
            workers_seen = report.workers_seen,
            confirmed = report.confirmed,
            assignments = report.assignments.len(),
            total_carbon_saving = report.total_carbon_saving,
            "Scheduling cycle complete"
        );
        Ok(report)
    }

    /// Send confirmations, then each new assignment to the job store and the
    /// worker registry in that order.
    async fn emit(
        &mut self,
        confirmations: &[UpdateJob],
        assignments: Vec<UpdateJob>,
    ) -> SchedulerResult<()> {
        let scheduler = self.scheduler;

        for update in confirmations {
            if let Err(e) = scheduler.workers.assign_worker(update).await {
                return Err(self.abort(e));
            }
            debug!(job_id = %update.job_id, worker_id = %update.worker_id, "Confirmed assignment");
            self.report.confirmed += 1;
        }

        for update in assignments {
            if let Err(e) = scheduler.jobs.assign_job(&update).await {
                return Err(self.abort(e));
            }
            if let Err(e) = scheduler.workers.assign_worker(&update).await {
                return Err(self.abort(e));
            }
            info!(
                job_id = %update.job_id,
                worker_id = %update.worker_id,
                compute_zone = %update.compute_zone,
                carbon_saving = update.carbon_saving,
                "Assigned job"
            );
            self.report.total_carbon_saving += update.carbon_saving;
            self.report.assignments.push(update);
        }

        Ok(())
    }
}

fn warn_on_duplicate_zones(data: &[CarbonIntensity]) {
    for zone in shadowed_zones(data) {
        warn!(zone = %zone, "Duplicate carbon entry ignored");
    }
}

/// Zones of usable entries that lose to an earlier usable entry.
fn shadowed_zones(data: &[CarbonIntensity]) -> Vec<&Zone> {
    let mut seen = HashSet::new();
    let mut shadowed = Vec::new();
    for entry in data.iter().filter(|e| is_usable(e)) {
        if !seen.insert(&entry.zone) {
            shadowed.push(&entry.zone);
        }
    }
    shadowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_policy_parse() {
        assert_eq!("skip".parse::<EmptyResultPolicy>().unwrap(), EmptyResultPolicy::Skip);
        assert_eq!("FAIL".parse::<EmptyResultPolicy>().unwrap(), EmptyResultPolicy::Fail);
        assert!("ignore".parse::<EmptyResultPolicy>().is_err());
    }

    #[test]
    fn test_cycle_stage_display() {
        assert_eq!(CycleStage::FetchCarbon.to_string(), "fetch_carbon");
        assert_eq!(
            serde_json::to_string(&CycleStage::FetchWorkers).unwrap(),
            "\"fetch_workers\""
        );
    }

    #[test]
    fn test_error_message_names_stage() {
        let err = SchedulerError::EmptyResult {
            stage: CycleStage::FetchJobs,
        };
        assert_eq!(
            err.to_string(),
            "cycle aborted at fetch_jobs: collaborator returned no data"
        );
        assert_eq!(err.stage(), CycleStage::FetchJobs);
    }

    #[test]
    fn test_shadowed_zones_ignore_unusable_entries() {
        let data = vec![
            CarbonIntensity::new("DE", f64::NAN),
            CarbonIntensity::new("DE", 100.0),
            CarbonIntensity::new("", 1.0),
            CarbonIntensity::new("", 2.0),
            CarbonIntensity::new("FR", 20.0),
            CarbonIntensity::new("FR", 30.0),
            CarbonIntensity::new("FR", f64::INFINITY),
        ];

        assert_eq!(shadowed_zones(&data), vec![&Zone::new("FR")]);
    }

    #[test]
    fn test_default_options() {
        let options = SchedulerOptions::default();
        assert_eq!(options.empty_result_policy, EmptyResultPolicy::Skip);
        assert!(options.confirm_assignments);
    }
}
