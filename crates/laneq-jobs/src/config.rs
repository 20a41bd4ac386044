//! Job queue configuration.

use crate::retry::RetryStrategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the job queue system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Worker pool configuration.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Delay scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of workers.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Longest a worker sleeps on an empty store before polling again, in
    /// milliseconds.
    #[serde(default = "default_idle_interval")]
    pub idle_interval_ms: u64,

    /// Handler execution timeout in seconds (0 = no timeout).
    #[serde(default = "default_job_timeout")]
    pub job_timeout_secs: u64,

    /// Shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            idle_interval_ms: default_idle_interval(),
            job_timeout_secs: default_job_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

fn default_concurrency() -> usize {
    1
}

fn default_idle_interval() -> u64 {
    1000
}

fn default_job_timeout() -> u64 {
    300 // 5 minutes
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl WorkerConfig {
    /// Returns idle interval as Duration.
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    /// Returns job timeout as Duration, `None` when disabled.
    pub fn job_timeout(&self) -> Option<Duration> {
        (self.job_timeout_secs > 0).then(|| Duration::from_secs(self.job_timeout_secs))
    }

    /// Returns shutdown timeout as Duration.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Delay scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Poller tick in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    500
}

impl SchedulerConfig {
    /// Returns poll interval as Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Backoff strategy.
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Backoff time unit in milliseconds.
    #[serde(default = "default_unit")]
    pub unit_ms: u64,

    /// Backoff multiplier.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Maximum delay in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Retry budget for jobs that do not set one.
    #[serde(default = "default_max_retries")]
    pub default_max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::default(),
            unit_ms: default_unit(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay(),
            default_max_retries: default_max_retries(),
        }
    }
}

fn default_unit() -> u64 {
    1000 // 1 second
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> u64 {
    3_600_000 // 1 hour
}

fn default_max_retries() -> u32 {
    crate::job::DEFAULT_MAX_RETRIES
}
