//! Backoff policies for failed jobs.
//!
//! The retry budget belongs to each job (`max_retries`); the policy only
//! decides how long a failed job waits before it becomes visible again.

use crate::config::RetryConfig;
use crate::job::Job;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry strategy enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    /// `unit * multiplier^retry_count`.
    #[default]
    Exponential,
    /// `unit` every time.
    Fixed,
    /// `unit * retry_count`.
    Linear,
}

/// Backoff policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retry strategy.
    pub strategy: RetryStrategy,

    /// Base time unit in milliseconds.
    pub unit_ms: u64,

    /// Backoff multiplier (exponential only).
    pub multiplier: f64,

    /// Maximum delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Base-2 exponential backoff with the given unit.
    pub fn exponential(unit: Duration) -> Self {
        Self {
            strategy: RetryStrategy::Exponential,
            unit_ms: duration_ms(unit),
            multiplier: 2.0,
            max_delay_ms: 3_600_000, // 1 hour
        }
    }

    /// Constant delay between retries.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            strategy: RetryStrategy::Fixed,
            unit_ms: duration_ms(delay),
            multiplier: 1.0,
            max_delay_ms: duration_ms(delay),
        }
    }

    /// Delay growing by `increment` per retry.
    pub fn linear(increment: Duration) -> Self {
        Self {
            strategy: RetryStrategy::Linear,
            unit_ms: duration_ms(increment),
            multiplier: 1.0,
            max_delay_ms: 3_600_000,
        }
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = duration_ms(delay);
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// True while the job still has retry budget left.
    ///
    /// Call after [`Job::record_failure`].
    pub fn should_retry(&self, job: &Job) -> bool {
        !job.is_exhausted()
    }

    /// Delay before the retry that follows failure number `retry_count`.
    pub fn backoff_for(&self, retry_count: u32) -> Duration {
        let unit = self.unit_ms as f64;
        let delay = match self.strategy {
            RetryStrategy::Exponential => {
                let exp = i32::try_from(retry_count).unwrap_or(i32::MAX);
                unit * self.multiplier.powi(exp)
            }
            RetryStrategy::Fixed => unit,
            RetryStrategy::Linear => unit * f64::from(retry_count),
        };

        let capped = delay.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            strategy: config.strategy,
            unit_ms: config.unit_ms,
            multiplier: config.multiplier,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
