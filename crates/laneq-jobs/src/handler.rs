//! Handler contract between the worker loop and job-specific logic.

use crate::error::JobError;
use crate::job::Job;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

/// Executes one job.
///
/// `Ok(())` ends the job's lifecycle. Any error is treated as a failed attempt
/// and drives the retry / dead-letter path; it never reaches the producer.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Run the job.
    async fn execute(&self, job: &Job) -> Result<(), JobError>;
}

type HandlerFn = Box<dyn Fn(Job) -> BoxFuture<'static, Result<(), JobError>> + Send + Sync>;

/// Adapts an async closure into a [`JobHandler`].
///
/// ```rust,ignore
/// let handler = FnHandler::new(|job: Job| async move {
///     println!("sending to {:?}", job.payload_value("to"));
///     Ok(())
/// });
/// ```
pub struct FnHandler {
    f: HandlerFn,
}

impl FnHandler {
    /// Wrap `f`. The closure receives its own copy of the job.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Job) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        Self {
            f: Box::new(move |job| f(job).boxed()),
        }
    }
}

impl std::fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl JobHandler for FnHandler {
    async fn execute(&self, job: &Job) -> Result<(), JobError> {
        (self.f)(job.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Priority;

    #[test]
    fn test_fn_handler_success() {
        let handler = FnHandler::new(|_job: Job| async { Ok(()) });
        let job = Job::new("noop", Priority::Low);
        assert!(tokio_test::block_on(handler.execute(&job)).is_ok());
    }

    #[test]
    fn test_fn_handler_sees_payload() {
        let handler = FnHandler::new(|job: Job| async move {
            match job.payload_value("to") {
                Some("error@error.com") => Err(JobError::failed("simulated error")),
                _ => Ok(()),
            }
        });

        let ok = Job::new("email", Priority::High).with_payload("to", "user@example.com");
        let bad = Job::new("email", Priority::High).with_payload("to", "error@error.com");

        assert!(tokio_test::block_on(handler.execute(&ok)).is_ok());
        let err = tokio_test::block_on(handler.execute(&bad)).unwrap_err();
        assert!(err.to_string().contains("simulated error"));
    }
}
