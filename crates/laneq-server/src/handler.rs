//! Demo email handler.

use async_trait::async_trait;
use laneq_config::HandlerConfig;
use laneq_jobs::{Job, JobError, JobHandler};
use std::time::Duration;
use tracing::info;

/// Payload key holding the recipient.
pub const RECIPIENT_KEY: &str = "to";

/// Pretends to send an email.
///
/// Each send takes `latency`; sends to `failing_recipient` always fail so the
/// retry and dead-letter paths can be watched end to end.
#[derive(Debug, Clone)]
pub struct EmailHandler {
    failing_recipient: String,
    latency: Duration,
}

impl EmailHandler {
    /// Create a handler.
    pub fn new(failing_recipient: impl Into<String>, latency: Duration) -> Self {
        Self {
            failing_recipient: failing_recipient.into(),
            latency,
        }
    }
}

impl From<&HandlerConfig> for EmailHandler {
    fn from(config: &HandlerConfig) -> Self {
        Self::new(config.failing_recipient.clone(), config.latency())
    }
}

#[async_trait]
impl JobHandler for EmailHandler {
    async fn execute(&self, job: &Job) -> Result<(), JobError> {
        let to = job.payload_value(RECIPIENT_KEY).unwrap_or_default();
        info!(job_id = %job.id, to, attempt = job.attempt(), "Sending email");

        tokio::time::sleep(self.latency).await;

        if to == self.failing_recipient {
            return Err(JobError::failed(format!("simulated error sending to {}", to)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laneq_jobs::Priority;

    fn handler() -> EmailHandler {
        EmailHandler::from(&HandlerConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_succeeds_after_latency() {
        let job = Job::new("email", Priority::High).with_payload("to", "user@example.com");

        let started = tokio::time::Instant::now();
        handler().execute(&job).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_recipient_fails() {
        let job = Job::new("email", Priority::Low).with_payload("to", "error@error.com");

        let err = handler().execute(&job).await.unwrap_err();
        assert!(matches!(err, JobError::ExecutionFailed(_)));
        assert!(err.to_string().contains("error@error.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_recipient_succeeds() {
        let job = Job::new("email", Priority::Low);
        assert!(handler().execute(&job).await.is_ok());
    }
}
