//! Shared fixtures for queue integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use laneq_jobs::{
    DelayScheduler, Job, JobError, JobHandler, PriorityStore, RetryPolicy, SchedulerConfig,
    WorkerPool, WorkerPoolConfig,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const FAILING_RECIPIENT: &str = "error@error.com";

/// One handler invocation.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub job_id: String,
    pub retry_count: u32,
    pub at: Instant,
}

/// Handler that records every call and fails for the failing recipient.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    attempts: Mutex<Vec<Attempt>>,
    latency: Duration,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().clone()
    }

    pub fn attempts_for(&self, job_id: &str) -> Vec<Attempt> {
        self.attempts
            .lock()
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect()
    }

    pub fn order(&self) -> Vec<String> {
        self.attempts.lock().iter().map(|a| a.job_id.clone()).collect()
    }
}

#[async_trait]
impl JobHandler for RecordingHandler {
    async fn execute(&self, job: &Job) -> Result<(), JobError> {
        self.attempts.lock().push(Attempt {
            job_id: job.id.to_string(),
            retry_count: job.retry_count(),
            at: Instant::now(),
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match job.payload_value("to") {
            Some(FAILING_RECIPIENT) => Err(JobError::failed("simulated error")),
            _ => Ok(()),
        }
    }
}

/// Store, scheduler and pool wired together.
pub struct Harness {
    pub store: Arc<PriorityStore>,
    pub scheduler: Arc<DelayScheduler>,
    pub handler: Arc<RecordingHandler>,
    pub pool: WorkerPool,
}

impl Harness {
    pub fn new(concurrency: usize) -> Self {
        Self::with_handler(concurrency, RecordingHandler::new())
    }

    pub fn with_handler(concurrency: usize, handler: RecordingHandler) -> Self {
        let store = Arc::new(PriorityStore::new());
        let scheduler = DelayScheduler::start(
            store.clone(),
            &SchedulerConfig {
                poll_interval_ms: 500,
            },
        );
        let handler = Arc::new(handler);
        let pool = WorkerPool::new(
            store.clone(),
            scheduler.clone(),
            handler.clone(),
            WorkerPoolConfig {
                concurrency,
                ..WorkerPoolConfig::default()
            },
        )
        .with_retry_policy(RetryPolicy::default());

        Self {
            store,
            scheduler,
            handler,
            pool,
        }
    }
}

pub fn failing_job(id: &str, priority: laneq_jobs::Priority, max_retries: u32) -> Job {
    Job::new("email", priority)
        .with_id(id)
        .with_payload("to", FAILING_RECIPIENT)
        .with_max_retries(max_retries)
}

pub fn ok_job(id: &str, priority: laneq_jobs::Priority) -> Job {
    Job::new("email", priority)
        .with_id(id)
        .with_payload("to", "user@example.com")
}
