//! Adapter ports for the scheduling cycle.
//!
//! The scheduler never touches job, worker or carbon data directly. It talks
//! to three collaborators through the traits below:
//! - [`JobAdapter`]: the job store
//! - [`WorkerAdapter`]: the worker registry
//! - [`CarbonIntensityAdapter`]: the carbon-intensity provider
//!
//! [`http`] implements each port against a JSON REST collaborator.

use async_trait::async_trait;
use carbon_model::{CarbonIntensity, Job, UpdateJob, Worker, Zone};
use thiserror::Error;

pub mod http;

pub use http::{HttpCarbonIntensityAdapter, HttpJobAdapter, HttpWorkerAdapter};

/// Result type for adapter calls.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors returned by collaborators.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The request never produced a response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The collaborator answered with a non-success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The collaborator base URL cannot address a resource.
    #[error("invalid collaborator URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The collaborator is not reachable for a non-HTTP reason.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Job store port.
#[async_trait]
pub trait JobAdapter: Send + Sync {
    /// Fetch every job the store knows about.
    async fn get_jobs(&self) -> AdapterResult<Vec<Job>>;

    /// Record that a job has been assigned to a worker.
    async fn assign_job(&self, update: &UpdateJob) -> AdapterResult<()>;
}

/// Worker registry port.
#[async_trait]
pub trait WorkerAdapter: Send + Sync {
    /// Fetch every registered worker.
    async fn get_workers(&self) -> AdapterResult<Vec<Worker>>;

    /// Record that a worker has been given a job.
    async fn assign_worker(&self, update: &UpdateJob) -> AdapterResult<()>;
}

/// Carbon-intensity provider port.
#[async_trait]
pub trait CarbonIntensityAdapter: Send + Sync {
    /// Fetch the current intensity of each requested zone.
    ///
    /// Zones the provider does not know may be missing from the result.
    async fn get_carbon_intensities(&self, zones: &[Zone]) -> AdapterResult<Vec<CarbonIntensity>>;
}
