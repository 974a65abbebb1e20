//! # carbon-model
//!
//! Data model shared by the scheduler core and its adapters.
//!
//! ## Design Principles
//!
//! - Records are owned by external stores; the scheduler only reads them and
//!   emits one-way [`UpdateJob`] commands
//! - Statuses are closed enums, never free-form strings
//! - Nothing here is cached across scheduling cycles
//!
//! ## Records
//!
//! - [`Job`]: a compute job pinned to the zone it was submitted in
//! - [`Worker`]: a compute worker registered in a fixed zone
//! - [`CarbonIntensity`]: a per-zone carbon snapshot for one cycle
//! - [`UpdateJob`]: the assignment command for one job/worker match

mod command;
mod types;

pub use carbon_id::{JobId, WorkerId, Zone};
pub use command::UpdateJob;
pub use types::*;
