//! Carbon-aware scheduling service library.
//!
//! This crate primarily ships a `carbon-scheduler` binary, but we expose a
//! small library surface to enable integration testing and reuse.

pub mod api;
pub mod config;
pub mod scheduler;
pub mod state;
