//! Application configuration structures.

use laneq_core::LoggingConfig;
use laneq_jobs::{Job, JobResult, JobsConfig, Priority};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Worker, scheduler and retry settings.
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Demo handler configuration.
    #[serde(default)]
    pub handler: HandlerConfig,

    /// Jobs enqueued at startup.
    #[serde(default)]
    pub seed: Vec<SeedJob>,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "laneq".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Demo email handler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Recipient for which every send fails.
    #[serde(default = "default_failing_recipient")]
    pub failing_recipient: String,

    /// Simulated send latency in milliseconds.
    #[serde(default = "default_latency")]
    pub latency_ms: u64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            failing_recipient: default_failing_recipient(),
            latency_ms: default_latency(),
        }
    }
}

fn default_failing_recipient() -> String {
    "error@error.com".to_string()
}

fn default_latency() -> u64 {
    500
}

impl HandlerConfig {
    /// Returns the simulated latency as Duration.
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// A job described in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedJob {
    /// Job ID; generated when absent.
    #[serde(default)]
    pub id: Option<String>,

    /// Job type tag.
    #[serde(rename = "type", default = "default_job_type")]
    pub job_type: String,

    /// Priority name: high, medium or low.
    #[serde(default = "default_priority")]
    pub priority: String,

    /// Opaque payload.
    #[serde(default)]
    pub payload: HashMap<String, String>,

    /// Retry budget; falls back to `jobs.retry.default_max_retries`.
    #[serde(default)]
    pub max_retries: Option<u32>,

    /// Delay before the job becomes visible, in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
}

fn default_job_type() -> String {
    "email".to_string()
}

fn default_priority() -> String {
    "low".to_string()
}

impl SeedJob {
    /// Parsed priority.
    pub fn priority(&self) -> JobResult<Priority> {
        self.priority.parse()
    }

    /// Delay before enqueue, `None` for immediate jobs.
    pub fn delay(&self) -> Option<Duration> {
        (self.delay_ms > 0).then(|| Duration::from_millis(self.delay_ms))
    }

    /// Build the job, rejecting an unknown priority.
    pub fn to_job(&self, default_max_retries: u32) -> JobResult<Job> {
        let mut job = Job::new(self.job_type.clone(), self.priority()?)
            .with_payload_map(self.payload.clone())
            .with_max_retries(self.max_retries.unwrap_or(default_max_retries));

        if let Some(id) = &self.id {
            job = job.with_id(id.as_str());
        }
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laneq_jobs::JobError;

    fn seed(priority: &str) -> SeedJob {
        SeedJob {
            id: Some("welcome-1".to_string()),
            job_type: "email".to_string(),
            priority: priority.to_string(),
            payload: HashMap::from([("to".to_string(), "user@example.com".to_string())]),
            max_retries: None,
            delay_ms: 0,
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.app.name, "laneq");
        assert_eq!(config.handler.failing_recipient, "error@error.com");
        assert_eq!(config.handler.latency(), Duration::from_millis(500));
        assert_eq!(config.jobs.worker.concurrency, 1);
        assert!(config.seed.is_empty());
    }

    #[test]
    fn test_seed_to_job() {
        let job = seed("High").to_job(3).unwrap();
        assert_eq!(job.id.as_str(), "welcome-1");
        assert_eq!(job.priority(), Priority::High);
        assert_eq!(job.max_retries(), 3);
        assert_eq!(job.payload_value("to"), Some("user@example.com"));
    }

    #[test]
    fn test_seed_overrides_max_retries() {
        let mut s = seed("low");
        s.max_retries = Some(0);
        assert_eq!(s.to_job(3).unwrap().max_retries(), 0);
    }

    #[test]
    fn test_seed_rejects_unknown_priority() {
        let err = seed("urgent").to_job(3).unwrap_err();
        assert!(matches!(err, JobError::InvalidPriority(_)));
    }

    #[test]
    fn test_seed_delay() {
        let mut s = seed("medium");
        assert_eq!(s.delay(), None);
        s.delay_ms = 1500;
        assert_eq!(s.delay(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_seed_defaults_from_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [[seed]]
            payload = { to = "a@b.c" }
            "#,
        )
        .unwrap();

        let s = &config.seed[0];
        assert_eq!(s.job_type, "email");
        assert_eq!(s.priority, "low");
        assert!(s.id.is_none());
        assert_eq!(s.delay_ms, 0);
    }
}
