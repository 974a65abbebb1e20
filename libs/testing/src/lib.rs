//! Test support for the carbon-aware scheduler.
//!
//! - [`fixtures`]: record builders and the reference scenarios
//! - [`memory`]: in-memory job store, worker registry and carbon provider
//!   implementing the adapter ports, with failure injection and a shared
//!   log of emitted commands

pub mod fixtures;
pub mod memory;

pub use fixtures::Scenario;
pub use memory::{Command, CommandLog, InMemoryJobStore, InMemoryWorkerRegistry, StaticCarbonProvider};
