//! Job error types.

use thiserror::Error;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Job-related errors.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job execution failed.
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),

    /// Job timed out.
    #[error("Job timed out after {0} ms")]
    Timeout(u64),

    /// Priority value outside High/Medium/Low.
    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    /// Worker error.
    #[error("Worker error: {0}")]
    Worker(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JobError {
    /// Creates an execution failure with the given reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        JobError::ExecutionFailed(reason.into())
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::ExecutionFailed(_) => "execution_failed",
            JobError::Timeout(_) => "timeout",
            JobError::InvalidPriority(_) => "invalid_priority",
            JobError::Worker(_) => "worker",
            JobError::Configuration(_) => "configuration",
            JobError::Internal(_) => "internal",
        }
    }
}

impl From<laneq_core::LaneqError> for JobError {
    fn from(err: laneq_core::LaneqError) -> Self {
        JobError::Internal(err.to_string())
    }
}

impl From<JobError> for laneq_core::LaneqError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Configuration(msg) => laneq_core::LaneqError::Configuration(msg),
            JobError::InvalidPriority(value) => {
                laneq_core::LaneqError::Validation(format!("Invalid priority: {}", value))
            }
            other => laneq_core::LaneqError::Job(other.to_string()),
        }
    }
}
