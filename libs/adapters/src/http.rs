//! HTTP clients for the collaborator REST APIs.
//!
//! Endpoints:
//! - `GET  {jobs}/jobs`, `POST {jobs}/jobs/{job_id}/assignment`
//! - `GET  {workers}/workers`, `POST {workers}/workers/{worker_id}/assignment`
//! - `GET  {carbon}/carbon-intensity?zone=..&zone=..`
//!
//! Assignment endpoints take an [`UpdateJob`] JSON body. IDs are sent as
//! single percent-encoded path segments.

use std::time::Duration;

use async_trait::async_trait;
use carbon_model::{CarbonIntensity, Job, UpdateJob, Worker, Zone};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::{AdapterError, AdapterResult, CarbonIntensityAdapter, JobAdapter, WorkerAdapter};

/// Build the HTTP client shared by the adapters.
pub fn build_client(timeout: Duration) -> AdapterResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(AdapterError::Client)
}

/// A collaborator reachable at a base URL.
#[derive(Debug, Clone)]
struct Endpoint {
    client: reqwest::Client,
    base_url: String,
}

impl Endpoint {
    fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Base URL extended with percent-encoded path segments.
    fn segments_url(&self, segments: &[&str]) -> AdapterResult<reqwest::Url> {
        let invalid = |reason: String| AdapterError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };

        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> AdapterResult<T> {
        let url = self.url(path);
        debug!(url = %url, "Fetching from collaborator");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| AdapterError::Transport {
                url: url.clone(),
                source,
            })?;

        let response = check_status(&url, response).await?;

        response
            .json()
            .await
            .map_err(|source| AdapterError::Decode { url, source })
    }

    async fn post_json(&self, target: reqwest::Url, body: &UpdateJob) -> AdapterResult<()> {
        let url = target.to_string();
        debug!(
            url = %url,
            job_id = %body.job_id,
            worker_id = %body.worker_id,
            "Posting assignment"
        );

        let response = self
            .client
            .post(target)
            .json(body)
            .send()
            .await
            .map_err(|source| AdapterError::Transport {
                url: url.clone(),
                source,
            })?;

        check_status(&url, response).await?;
        Ok(())
    }
}

async fn check_status(url: &str, response: reqwest::Response) -> AdapterResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!(url = %url, status = %status, body = %body, "Collaborator request failed");
    Err(AdapterError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Job store over HTTP.
#[derive(Debug, Clone)]
pub struct HttpJobAdapter {
    endpoint: Endpoint,
}

impl HttpJobAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(client, base_url),
        }
    }
}

#[async_trait]
impl JobAdapter for HttpJobAdapter {
    async fn get_jobs(&self) -> AdapterResult<Vec<Job>> {
        let jobs: Vec<Job> = self.endpoint.get_json("/jobs", &[]).await?;
        debug!(job_count = jobs.len(), "Fetched jobs");
        Ok(jobs)
    }

    async fn assign_job(&self, update: &UpdateJob) -> AdapterResult<()> {
        let url = self
            .endpoint
            .segments_url(&["jobs", update.job_id.as_str(), "assignment"])?;
        self.endpoint.post_json(url, update).await
    }
}

/// Worker registry over HTTP.
#[derive(Debug, Clone)]
pub struct HttpWorkerAdapter {
    endpoint: Endpoint,
}

impl HttpWorkerAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(client, base_url),
        }
    }
}

#[async_trait]
impl WorkerAdapter for HttpWorkerAdapter {
    async fn get_workers(&self) -> AdapterResult<Vec<Worker>> {
        let workers: Vec<Worker> = self.endpoint.get_json("/workers", &[]).await?;
        debug!(worker_count = workers.len(), "Fetched workers");
        Ok(workers)
    }

    async fn assign_worker(&self, update: &UpdateJob) -> AdapterResult<()> {
        let url = self
            .endpoint
            .segments_url(&["workers", update.worker_id.as_str(), "assignment"])?;
        self.endpoint.post_json(url, update).await
    }
}

/// Carbon-intensity provider over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCarbonIntensityAdapter {
    endpoint: Endpoint,
}

impl HttpCarbonIntensityAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(client, base_url),
        }
    }
}

#[async_trait]
impl CarbonIntensityAdapter for HttpCarbonIntensityAdapter {
    async fn get_carbon_intensities(&self, zones: &[Zone]) -> AdapterResult<Vec<CarbonIntensity>> {
        let query: Vec<(&str, &str)> = zones.iter().map(|z| ("zone", z.as_str())).collect();
        let data: Vec<CarbonIntensity> = self.endpoint.get_json("/carbon-intensity", &query).await?;
        debug!(
            requested = zones.len(),
            received = data.len(),
            "Fetched carbon intensities"
        );
        Ok(data)
    }
}
