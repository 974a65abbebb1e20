//! # carbon-id
//!
//! Typed identifiers for the carbon-aware scheduler.
//!
//! ## Design Principles
//!
//! - IDs are opaque: they are minted by the job store and the worker
//!   registry, never by the scheduler
//! - An ID is never empty; "no worker yet" is modelled as `Option<WorkerId>`
//! - IDs are typed so a job ID cannot be passed where a worker ID is expected
//! - Zone codes are plain labels and may be empty on the wire
//!
//! Examples:
//! - `JobId::parse("job-42")`
//! - `WorkerId::parse("worker-de-1")`
//! - `Zone::new("DE")`

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;
