//! Serialized access to the scheduling cycle.
//!
//! The orchestrator itself does not prevent overlapping cycles. Inside this
//! service both the interval driver and `POST /schedule` go through one
//! [`CycleRunner`], so at most one cycle is in flight at a time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, instrument};

use super::cycle::{CycleReport, CycleStage, Scheduler, SchedulerResult};

/// What started a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Interval,
    Http,
}

/// Outcome of the most recent cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    Completed {
        trigger: Trigger,
        report: CycleReport,
    },
    Failed {
        trigger: Trigger,
        failed_at: DateTime<Utc>,
        stage: CycleStage,
        error: String,
    },
}

/// Runs cycles one at a time and remembers the last outcome.
pub struct CycleRunner {
    scheduler: Scheduler,
    cycle_lock: Mutex<()>,
    last: RwLock<Option<CycleOutcome>>,
}

impl CycleRunner {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            cycle_lock: Mutex::new(()),
            last: RwLock::new(None),
        }
    }

    /// Run one cycle, waiting for any in-flight cycle to finish first.
    #[instrument(skip(self))]
    pub async fn run(&self, trigger: Trigger) -> SchedulerResult<CycleReport> {
        let _guard = self.cycle_lock.lock().await;

        let result = self.scheduler.schedule_job().await;

        let outcome = match &result {
            Ok(report) => CycleOutcome::Completed {
                trigger,
                report: report.clone(),
            },
            Err(e) => {
                error!(error = %e, "Scheduling cycle failed");
                CycleOutcome::Failed {
                    trigger,
                    failed_at: Utc::now(),
                    stage: e.stage(),
                    error: e.to_string(),
                }
            }
        };
        *self.last.write().await = Some(outcome);

        result
    }

    /// Outcome of the most recent cycle, if any ran yet.
    pub async fn last_outcome(&self) -> Option<CycleOutcome> {
        self.last.read().await.clone()
    }
}
