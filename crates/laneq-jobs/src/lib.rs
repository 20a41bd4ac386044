//! Laneq Jobs - In-Memory Priority Job Queue
//!
//! An in-process job queue with:
//! - Three priority lanes (high, medium, low), FIFO within a lane
//! - Per-priority dead-letter lanes for jobs that ran out of retries
//! - A delay scheduler that keeps jobs invisible until their fire time
//! - A worker pool with exponential backoff through the delay scheduler
//!
//! # Architecture
//!
//! ```text
//!  Producer ──enqueue──────────────────────────┐
//!     │                                        ▼
//!     └──schedule──► DelayScheduler ──poll──► PriorityStore
//!                      ▲  (min-heap)          ┌──────┬────────┬─────┐
//!                      │                      │ high │ medium │ low │
//!                      │                      └──────┴────────┴─────┘
//!                      │                                 │ dequeue
//!                      │ retry (backoff)                 ▼
//!                      └───────────────────────────  WorkerPool
//!                                                        │ retries exhausted
//!                                                        ▼
//!                                               dead-letter lanes
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use laneq_jobs::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(PriorityStore::new());
//! let scheduler = DelayScheduler::start(store.clone(), &SchedulerConfig::default());
//!
//! let handler = Arc::new(FnHandler::new(|job: Job| async move {
//!     println!("sending to {:?}", job.payload_value("to"));
//!     Ok(())
//! }));
//!
//! let pool = WorkerPool::new(
//!     store.clone(),
//!     scheduler.clone(),
//!     handler,
//!     WorkerPoolConfig::default(),
//! );
//! pool.start()?;
//!
//! store.enqueue(Job::new("email", Priority::High).with_payload("to", "user@example.com"));
//! scheduler.schedule(Job::new("email", Priority::Low), Duration::from_secs(5));
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod job;
pub mod metrics;
pub mod queue;
pub mod retry;
pub mod scheduler;
pub mod worker;

pub use config::{JobsConfig, RetryConfig, SchedulerConfig, WorkerConfig};
pub use error::{JobError, JobResult};
pub use handler::{FnHandler, JobHandler};
pub use job::{Job, JobId, DEFAULT_MAX_RETRIES};
pub use metrics::{register_metrics, JobMetrics, SchedulerMetrics, WorkerMetrics};
pub use queue::{LaneCounts, LaneSnapshot, Priority, PriorityStore, QueueStats};
pub use retry::{RetryPolicy, RetryStrategy};
pub use scheduler::{DelayScheduler, SchedulerStats};
pub use worker::{JobOutcome, Worker, WorkerPool, WorkerPoolConfig, WorkerPoolStats};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::SchedulerConfig;
    pub use crate::handler::{FnHandler, JobHandler};
    pub use crate::job::Job;
    pub use crate::queue::{Priority, PriorityStore};
    pub use crate::retry::RetryPolicy;
    pub use crate::scheduler::DelayScheduler;
    pub use crate::worker::{WorkerPool, WorkerPoolConfig};
    pub use crate::{JobError, JobId, JobResult};
    pub use std::time::Duration;
}
