//! Queue runtime: store, scheduler and worker pool wired from configuration.

use crate::handler::RECIPIENT_KEY;
use laneq_config::{AppConfig, SeedJob};
use laneq_core::{LaneqError, LaneqResult};
use laneq_jobs::{
    DelayScheduler, Job, JobHandler, LaneSnapshot, PriorityStore, RetryPolicy, WorkerPool,
    WorkerPoolConfig,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Running queue components.
pub struct QueueRuntime {
    store: Arc<PriorityStore>,
    scheduler: Arc<DelayScheduler>,
    pool: WorkerPool,
    default_max_retries: u32,
}

impl QueueRuntime {
    /// Build the components from `config` and start the poller and workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: &AppConfig, handler: Arc<dyn JobHandler>) -> LaneqResult<Self> {
        let store = Arc::new(PriorityStore::new());
        let scheduler = DelayScheduler::start(store.clone(), &config.jobs.scheduler);

        let pool = WorkerPool::new(
            store.clone(),
            scheduler.clone(),
            handler,
            WorkerPoolConfig::from(&config.jobs.worker),
        )
        .with_retry_policy(RetryPolicy::from(&config.jobs.retry));

        if let Err(e) = pool.start() {
            scheduler.stop();
            return Err(e.into());
        }

        Ok(Self {
            store,
            scheduler,
            pool,
            default_max_retries: config.jobs.retry.default_max_retries,
        })
    }

    /// Shared store.
    pub fn store(&self) -> &Arc<PriorityStore> {
        &self.store
    }

    /// Shared scheduler.
    pub fn scheduler(&self) -> &Arc<DelayScheduler> {
        &self.scheduler
    }

    /// Worker pool.
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Enqueue configured jobs: immediately, or through the scheduler when
    /// they carry a delay.
    ///
    /// Every seed is checked before any is submitted.
    pub fn seed(&self, seeds: &[SeedJob]) -> LaneqResult<SeedSummary> {
        let jobs = seeds
            .iter()
            .map(|seed| {
                seed.to_job(self.default_max_retries)
                    .map(|job| (job, seed.delay()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(LaneqError::from)?;

        let mut summary = SeedSummary::default();
        for (job, delay) in jobs {
            match delay {
                Some(delay) => {
                    debug!(
                        job_id = %job.id,
                        delay_ms = delay.as_millis() as u64,
                        "Scheduling seed job"
                    );
                    self.scheduler.schedule(job, delay);
                    summary.scheduled += 1;
                }
                None => {
                    debug!(job_id = %job.id, priority = %job.priority(), "Enqueueing seed job");
                    self.store.enqueue(job);
                    summary.enqueued += 1;
                }
            }
        }

        info!(
            enqueued = summary.enqueued,
            scheduled = summary.scheduled,
            "Seed jobs submitted"
        );
        Ok(summary)
    }

    /// Current contents of the pending and dead-letter lanes.
    pub fn report(&self) -> QueueReport {
        QueueReport {
            pending: lines(&self.store.list_all()),
            dead_letter: lines(&self.store.list_all_dead_letter()),
            delayed: self.scheduler.pending(),
        }
    }

    /// Stop workers and poller, wait for in-flight jobs, and report what is
    /// left.
    pub async fn shutdown(self) -> LaneqResult<QueueReport> {
        let drained = self.pool.shutdown().await;
        self.scheduler.stop();
        drained?;

        Ok(self.report())
    }
}

/// Outcome of [`QueueRuntime::seed`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Jobs placed directly in their lane.
    pub enqueued: usize,
    /// Jobs placed in the delay heap.
    pub scheduled: usize,
}

/// One job in a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLine {
    /// Job ID.
    pub id: String,
    /// Recipient from the payload, if any.
    pub to: Option<String>,
    /// Lane name.
    pub priority: String,
    /// Failed attempts so far.
    pub retry_count: u32,
    /// Retry budget.
    pub max_retries: u32,
}

impl From<&Job> for JobLine {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.to_string(),
            to: job.payload_value(RECIPIENT_KEY).map(str::to_string),
            priority: job.priority().to_string(),
            retry_count: job.retry_count(),
            max_retries: job.max_retries(),
        }
    }
}

impl fmt::Display for JobLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to={} priority={} retries={}/{}",
            self.id,
            self.to.as_deref().unwrap_or("-"),
            self.priority,
            self.retry_count,
            self.max_retries
        )
    }
}

/// Snapshot of what is left in the queue, in drain order.
#[derive(Debug, Clone, Default)]
pub struct QueueReport {
    /// Pending jobs, high lane first.
    pub pending: Vec<JobLine>,
    /// Dead-lettered jobs, high lane first.
    pub dead_letter: Vec<JobLine>,
    /// Jobs still waiting in the delay heap.
    pub delayed: usize,
}

fn lines(snapshot: &LaneSnapshot) -> Vec<JobLine> {
    snapshot.iter().map(JobLine::from).collect()
}
