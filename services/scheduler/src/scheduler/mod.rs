//! Scheduler module for carbon-aware job placement.
//!
//! The scheduler is responsible for:
//! - Running the scheduling cycle against the collaborator ports
//! - Serializing cycles triggered by the interval driver and the HTTP API
//! - Keeping the outcome of the most recent cycle for status queries

mod cycle;
mod runner;
mod worker;

pub use cycle::{
    CycleReport, CycleStage, EmptyResultPolicy, Scheduler, SchedulerError, SchedulerOptions,
    SchedulerResult,
};
pub use runner::{CycleOutcome, CycleRunner, Trigger};
pub use worker::SchedulerWorker;
