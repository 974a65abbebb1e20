//! Scheduler background worker.
//!
//! Runs the scheduling cycle on a periodic interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, instrument};

use super::runner::{CycleRunner, Trigger};

/// Scheduler worker that drives cycles from a timer.
pub struct SchedulerWorker {
    runner: Arc<CycleRunner>,
    interval: Duration,
}

impl SchedulerWorker {
    /// Create a new scheduler worker.
    pub fn new(runner: Arc<CycleRunner>, interval: Duration) -> Self {
        Self { runner, interval }
    }

    /// Run the scheduler worker until shutdown is signaled.
    ///
    /// A cycle in flight when shutdown arrives runs to completion.
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting scheduler worker"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Don't immediately tick on startup - wait for first interval
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    // Failures are logged by the runner; the next tick retries.
                    let _ = self.runner.run(Trigger::Interval).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Scheduler worker shutting down");
                        break;
                    }
                }
            }
        }
    }
}
