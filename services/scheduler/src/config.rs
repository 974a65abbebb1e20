use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use carbon_reconcile::DEFAULT_CYCLE_INTERVAL;

use crate::scheduler::{EmptyResultPolicy, SchedulerOptions};

/// Collaborator endpoints.
#[derive(Debug, Clone)]
pub struct CollaboratorConfig {
    pub jobs_url: String,
    pub workers_url: String,
    pub carbon_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,

    /// Interval between scheduled cycles; `None` disables the driver.
    pub interval: Option<Duration>,

    pub collaborators: CollaboratorConfig,
    pub scheduler: SchedulerOptions,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let listen_addr = var("CARBON_SCHED_LISTEN_ADDR", "127.0.0.1:8080")
            .parse()
            .context("invalid CARBON_SCHED_LISTEN_ADDR")?;

        let log_level = var("CARBON_SCHED_LOG_LEVEL", "info");

        let interval_secs: u64 = match lookup("CARBON_SCHED_INTERVAL_SECS") {
            Some(raw) => raw
                .parse()
                .context("invalid CARBON_SCHED_INTERVAL_SECS")?,
            None => DEFAULT_CYCLE_INTERVAL.as_secs(),
        };
        let interval = (interval_secs > 0).then(|| Duration::from_secs(interval_secs));

        let timeout_secs: u64 = var("CARBON_SCHED_HTTP_TIMEOUT_SECS", "30")
            .parse()
            .context("invalid CARBON_SCHED_HTTP_TIMEOUT_SECS")?;

        let collaborators = CollaboratorConfig {
            jobs_url: var("CARBON_SCHED_JOBS_URL", "http://127.0.0.1:8081"),
            workers_url: var("CARBON_SCHED_WORKERS_URL", "http://127.0.0.1:8082"),
            carbon_url: var("CARBON_SCHED_CARBON_URL", "http://127.0.0.1:8083"),
            timeout: Duration::from_secs(timeout_secs),
        };

        let empty_result_policy: EmptyResultPolicy = var("CARBON_SCHED_EMPTY_RESULT_POLICY", "skip")
            .parse()
            .map_err(anyhow::Error::msg)
            .context("invalid CARBON_SCHED_EMPTY_RESULT_POLICY")?;

        let confirm_assignments = match lookup("CARBON_SCHED_CONFIRM_ASSIGNMENTS") {
            Some(raw) => parse_flag(&raw).context("invalid CARBON_SCHED_CONFIRM_ASSIGNMENTS")?,
            None => true,
        };

        Ok(Self {
            listen_addr,
            log_level,
            interval,
            collaborators,
            scheduler: SchedulerOptions {
                empty_result_policy,
                confirm_assignments,
            },
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => anyhow::bail!("expected one of 1, 0, true, false; got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.interval, Some(DEFAULT_CYCLE_INTERVAL));
        assert_eq!(config.collaborators.timeout, Duration::from_secs(30));
        assert_eq!(
            config.scheduler.empty_result_policy,
            EmptyResultPolicy::Skip
        );
        assert!(config.scheduler.confirm_assignments);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("CARBON_SCHED_INTERVAL_SECS", "15"),
            ("CARBON_SCHED_JOBS_URL", "http://jobs.internal"),
            ("CARBON_SCHED_EMPTY_RESULT_POLICY", "fail"),
            ("CARBON_SCHED_CONFIRM_ASSIGNMENTS", "false"),
        ])
        .unwrap();

        assert_eq!(config.interval, Some(Duration::from_secs(15)));
        assert_eq!(config.collaborators.jobs_url, "http://jobs.internal");
        assert_eq!(
            config.scheduler.empty_result_policy,
            EmptyResultPolicy::Fail
        );
        assert!(!config.scheduler.confirm_assignments);
    }

    #[test]
    fn test_zero_interval_disables_driver() {
        let config = config(&[("CARBON_SCHED_INTERVAL_SECS", "0")]).unwrap();
        assert_eq!(config.interval, None);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config(&[("CARBON_SCHED_LISTEN_ADDR", "nowhere")]).is_err());
        assert!(config(&[("CARBON_SCHED_INTERVAL_SECS", "soon")]).is_err());
        assert!(config(&[("CARBON_SCHED_EMPTY_RESULT_POLICY", "maybe")]).is_err());
        assert!(config(&[("CARBON_SCHED_CONFIRM_ASSIGNMENTS", "yes")]).is_err());
        assert!(config(&[("CARBON_SCHED_CONFIRM_ASSIGNMENTS", "ture")]).is_err());
    }

    #[test]
    fn test_confirm_assignments_flag_values() {
        for (raw, expected) in [("1", true), ("TRUE", true), ("0", false), ("False", false)] {
            let config = config(&[("CARBON_SCHED_CONFIRM_ASSIGNMENTS", raw)]).unwrap();
            assert_eq!(config.scheduler.confirm_assignments, expected, "value {raw}");
        }
    }
}
