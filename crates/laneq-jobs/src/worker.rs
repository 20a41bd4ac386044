//! Worker pool for processing jobs.
//!
//! Each worker loops on the priority store: take the highest-priority job,
//! run the handler, and on failure either hand the job to the delay scheduler
//! with a backoff or move it to the dead-letter lanes.

use crate::config::WorkerConfig;
use crate::error::{JobError, JobResult};
use crate::handler::JobHandler;
use crate::job::Job;
use crate::metrics::{JobMetrics, WorkerMetrics};
use crate::queue::PriorityStore;
use crate::retry::RetryPolicy;
use crate::scheduler::DelayScheduler;
use futures::FutureExt;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Number of concurrent workers.
    pub concurrency: usize,

    /// Longest wait on an empty store before looking again.
    pub idle_interval: Duration,

    /// Job execution timeout, `None` for unbounded.
    pub job_timeout: Option<Duration>,

    /// How long `shutdown` waits for in-flight jobs.
    pub shutdown_timeout: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::from(&WorkerConfig::default())
    }
}

impl From<&WorkerConfig> for WorkerPoolConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            idle_interval: config.idle_interval(),
            job_timeout: config.job_timeout(),
            shutdown_timeout: config.shutdown_timeout(),
        }
    }
}

/// What happened to a job after one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Handler succeeded; the job is gone.
    Completed,
    /// Handler failed and the job was scheduled again.
    Retrying {
        /// Failures so far.
        retry_count: u32,
        /// Delay before the job is visible again.
        backoff: Duration,
    },
    /// Handler failed with no retries left; the job is in dead-letter.
    DeadLettered {
        /// Failures so far.
        retry_count: u32,
    },
}

#[derive(Debug, Default)]
struct PoolCounters {
    processed: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
    dead_lettered: AtomicU64,
}

/// A single worker.
///
/// Workers are normally driven by a [`WorkerPool`]; [`Worker::process`] is
/// public so one attempt can be run in isolation.
pub struct Worker {
    id: String,
    store: Arc<PriorityStore>,
    scheduler: Arc<DelayScheduler>,
    handler: Arc<dyn JobHandler>,
    retry_policy: RetryPolicy,
    idle_interval: Duration,
    job_timeout: Option<Duration>,
    counters: Arc<PoolCounters>,
}

impl Worker {
    /// Create a standalone worker.
    pub fn new(
        store: Arc<PriorityStore>,
        scheduler: Arc<DelayScheduler>,
        handler: Arc<dyn JobHandler>,
        retry_policy: RetryPolicy,
        config: &WorkerPoolConfig,
    ) -> Self {
        Self {
            id: format!("worker-{}", Uuid::new_v4()),
            store,
            scheduler,
            handler,
            retry_policy,
            idle_interval: config.idle_interval,
            job_timeout: config.job_timeout,
            counters: Arc::new(PoolCounters::default()),
        }
    }

    /// Get the worker ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run one attempt of `job` and route it according to the result.
    pub async fn process(&self, job: Job) -> JobOutcome {
        debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            priority = %job.priority(),
            attempt = job.attempt(),
            "Processing job"
        );

        let started = Instant::now();
        let result = self.execute(&job).await;
        let elapsed = started.elapsed();

        match result {
            Ok(()) => {
                debug!(
                    job_id = %job.id,
                    duration_ms = elapsed.as_millis() as u64,
                    "Job completed successfully"
                );
                self.counters.processed.fetch_add(1, Ordering::Relaxed);
                JobMetrics::job_completed(job.priority(), &job.job_type, elapsed);
                JobOutcome::Completed
            }
            Err(e) => {
                JobMetrics::job_failed(job.priority(), &job.job_type, e.kind(), elapsed);
                self.handle_failure(job, e)
            }
        }
    }

    async fn execute(&self, job: &Job) -> Result<(), JobError> {
        let attempt = AssertUnwindSafe(self.handler.execute(job)).catch_unwind();

        let result = match self.job_timeout {
            Some(limit) => match timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => return Err(JobError::Timeout(limit.as_millis() as u64)),
            },
            None => attempt.await,
        };

        result.unwrap_or_else(|_| Err(JobError::failed("handler panicked")))
    }

    fn handle_failure(&self, mut job: Job, error: JobError) -> JobOutcome {
        let retry_count = job.record_failure();
        self.counters.failed.fetch_add(1, Ordering::Relaxed);

        if self.retry_policy.should_retry(&job) {
            let backoff = self.retry_policy.backoff_for(retry_count);
            warn!(
                job_id = %job.id,
                retry_count,
                max_retries = job.max_retries(),
                backoff_ms = backoff.as_millis() as u64,
                error = %error,
                "Job failed, scheduling retry"
            );
            self.counters.retried.fetch_add(1, Ordering::Relaxed);
            JobMetrics::job_retried(job.priority(), retry_count);
            self.scheduler.schedule(job, backoff);
            JobOutcome::Retrying {
                retry_count,
                backoff,
            }
        } else {
            warn!(
                job_id = %job.id,
                retry_count,
                max_retries = job.max_retries(),
                error = %error,
                "Job failed with no retries left"
            );
            self.counters.dead_lettered.fetch_add(1, Ordering::Relaxed);
            self.store.move_to_dead_letter(job);
            JobOutcome::DeadLettered { retry_count }
        }
    }

    async fn run(self, running: Arc<AtomicBool>, mut shutdown_rx: broadcast::Receiver<()>) {
        debug!(worker_id = %self.id, "Worker started");

        while running.load(Ordering::SeqCst) {
            match self.store.dequeue() {
                Some(job) => {
                    self.process(job).await;
                }
                None => {
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        _ = self.store.wait_for_job(self.idle_interval) => {}
                    }
                }
            }
        }

        debug!(worker_id = %self.id, "Worker stopped");
    }
}

/// Worker pool statistics.
#[derive(Debug, Clone)]
pub struct WorkerPoolStats {
    /// Pool ID.
    pub id: String,

    /// Is running.
    pub running: bool,

    /// Configured concurrency.
    pub concurrency: usize,

    /// Jobs completed.
    pub jobs_processed: u64,

    /// Failed attempts.
    pub jobs_failed: u64,

    /// Retries scheduled.
    pub jobs_retried: u64,

    /// Jobs moved to dead-letter.
    pub jobs_dead_lettered: u64,
}

/// Worker pool for concurrent job processing.
pub struct WorkerPool {
    /// Unique pool ID.
    id: String,

    /// Job source and dead-letter destination.
    store: Arc<PriorityStore>,

    /// Destination of retries.
    scheduler: Arc<DelayScheduler>,

    /// Job handler shared by every worker.
    handler: Arc<dyn JobHandler>,

    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Backoff policy.
    retry_policy: RetryPolicy,

    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,

    /// Running flag.
    running: Arc<AtomicBool>,

    /// Spawned worker tasks.
    handles: Mutex<Vec<JoinHandle<()>>>,

    /// Counters shared with the workers.
    counters: Arc<PoolCounters>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl WorkerPool {
    /// Create a new worker pool.
    pub fn new(
        store: Arc<PriorityStore>,
        scheduler: Arc<DelayScheduler>,
        handler: Arc<dyn JobHandler>,
        config: WorkerPoolConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            id: format!("worker-pool-{}", Uuid::new_v4()),
            store,
            scheduler,
            handler,
            config,
            retry_policy: RetryPolicy::default(),
            shutdown_tx,
            running: Arc::new(AtomicBool::new(false)),
            handles: Mutex::new(Vec::new()),
            counters: Arc::new(PoolCounters::default()),
        }
    }

    /// Sets the backoff policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Spawn `concurrency` workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> JobResult<()> {
        if self.config.concurrency == 0 {
            return Err(JobError::Configuration(
                "Worker concurrency must be at least 1".to_string(),
            ));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(JobError::Worker("Worker pool already running".to_string()));
        }

        info!(
            pool_id = %self.id,
            concurrency = self.config.concurrency,
            idle_interval_ms = self.config.idle_interval.as_millis() as u64,
            "Starting worker pool"
        );
        WorkerMetrics::update_concurrency(&self.id, self.config.concurrency);

        let mut handles = self.handles.lock();
        for _ in 0..self.config.concurrency {
            let worker = Worker {
                id: format!("{}-{}", self.id, Uuid::new_v4()),
                store: self.store.clone(),
                scheduler: self.scheduler.clone(),
                handler: self.handler.clone(),
                retry_policy: self.retry_policy.clone(),
                idle_interval: self.config.idle_interval,
                job_timeout: self.config.job_timeout,
                counters: self.counters.clone(),
            };

            let span = tracing::info_span!("worker", worker_id = %worker.id);
            let running = self.running.clone();
            let shutdown_rx = self.shutdown_tx.subscribe();
            handles.push(tokio::spawn(worker.run(running, shutdown_rx).instrument(span)));
        }

        Ok(())
    }

    /// Signal every worker to stop after its current job.
    pub fn stop(&self) {
        info!(pool_id = %self.id, "Stopping worker pool...");
        self.running.store(false, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }

    /// Stop the pool and wait for in-flight jobs, up to the shutdown timeout.
    pub async fn shutdown(&self) -> JobResult<()> {
        self.stop();

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.handles.lock());
        info!(pool_id = %self.id, workers = handles.len(), "Waiting for workers to finish...");

        let joined = timeout(
            self.config.shutdown_timeout,
            futures::future::join_all(handles),
        )
        .await;

        let stats = self.stats();
        info!(
            pool_id = %self.id,
            processed = stats.jobs_processed,
            failed = stats.jobs_failed,
            retried = stats.jobs_retried,
            dead_lettered = stats.jobs_dead_lettered,
            "Worker pool stopped"
        );

        match joined {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        error!(pool_id = %self.id, error = %e, "Worker task ended abnormally");
                    }
                }
                Ok(())
            }
            Err(_) => Err(JobError::Worker(format!(
                "Workers did not finish within {:?}",
                self.config.shutdown_timeout
            ))),
        }
    }

    /// Check if the pool is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the pool ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get pool statistics.
    pub fn stats(&self) -> WorkerPoolStats {
        WorkerPoolStats {
            id: self.id.clone(),
            running: self.is_running(),
            concurrency: self.config.concurrency,
            jobs_processed: self.counters.processed.load(Ordering::Relaxed),
            jobs_failed: self.counters.failed.load(Ordering::Relaxed),
            jobs_retried: self.counters.retried.load(Ordering::Relaxed),
            jobs_dead_lettered: self.counters.dead_lettered.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::handler::FnHandler;
    use crate::queue::Priority;

    fn failing_handler() -> Arc<dyn JobHandler> {
        Arc::new(FnHandler::new(|_job: Job| async {
            Err(JobError::failed("boom"))
        }))
    }

    fn worker_with(
        handler: Arc<dyn JobHandler>,
        config: &WorkerPoolConfig,
    ) -> (Worker, Arc<PriorityStore>, Arc<DelayScheduler>) {
        let store = Arc::new(PriorityStore::new());
        let scheduler = DelayScheduler::start(store.clone(), &SchedulerConfig::default());
        let worker = Worker::new(
            store.clone(),
            scheduler.clone(),
            handler,
            RetryPolicy::default(),
            config,
        );
        (worker, store, scheduler)
    }

    #[test]
    fn test_worker_pool_config_from_worker_config() {
        let config = WorkerPoolConfig::default();
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.idle_interval, Duration::from_secs(1));
        assert_eq!(config.job_timeout, Some(Duration::from_secs(300)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_completes_job() {
        let handler: Arc<dyn JobHandler> = Arc::new(FnHandler::new(|_job: Job| async { Ok(()) }));
        let (worker, store, scheduler) = worker_with(handler, &WorkerPoolConfig::default());

        let outcome = worker.process(Job::new("email", Priority::High)).await;

        assert_eq!(outcome, JobOutcome::Completed);
        assert!(store.is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_schedules_retry_with_backoff() {
        let (worker, store, scheduler) =
            worker_with(failing_handler(), &WorkerPoolConfig::default());

        let outcome = worker.process(Job::new("email", Priority::Low)).await;

        assert_eq!(
            outcome,
            JobOutcome::Retrying {
                retry_count: 1,
                backoff: Duration::from_secs(2),
            }
        );
        assert!(store.is_empty());
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_due_in(), Some(Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_job_is_dead_lettered() {
        let (worker, store, scheduler) =
            worker_with(failing_handler(), &WorkerPoolConfig::default());

        let mut job = Job::new("email", Priority::Medium).with_id("x").with_max_retries(1);
        job.record_failure();

        let outcome = worker.process(job).await;

        assert_eq!(outcome, JobOutcome::DeadLettered { retry_count: 2 });
        assert_eq!(scheduler.pending(), 0);
        let dead = store.list_all_dead_letter();
        assert_eq!(dead.medium.len(), 1);
        assert_eq!(dead.medium[0].retry_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let handler: Arc<dyn JobHandler> = Arc::new(FnHandler::new(|_job: Job| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }));
        let config = WorkerPoolConfig {
            job_timeout: Some(Duration::from_secs(1)),
            ..WorkerPoolConfig::default()
        };
        let (worker, _store, scheduler) = worker_with(handler, &config);

        let outcome = worker.process(Job::new("email", Priority::High)).await;

        assert!(matches!(outcome, JobOutcome::Retrying { retry_count: 1, .. }));
        assert_eq!(scheduler.pending(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_panic_counts_as_failure() {
        let handler: Arc<dyn JobHandler> = Arc::new(FnHandler::new(|job: Job| async move {
            if job.payload_value("to").is_some() {
                panic!("handler bug");
            }
            Ok(())
        }));
        let (worker, _store, scheduler) = worker_with(handler, &WorkerPoolConfig::default());

        let job = Job::new("email", Priority::High).with_payload("to", "a@b.c");
        let outcome = worker.process(job).await;

        assert!(matches!(outcome, JobOutcome::Retrying { retry_count: 1, .. }));
        assert_eq!(scheduler.pending(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_rejects_double_start_and_zero_concurrency() {
        let store = Arc::new(PriorityStore::new());
        let scheduler = DelayScheduler::start(store.clone(), &SchedulerConfig::default());
        let handler: Arc<dyn JobHandler> = Arc::new(FnHandler::new(|_job: Job| async { Ok(()) }));

        let idle = WorkerPool::new(
            store.clone(),
            scheduler.clone(),
            handler.clone(),
            WorkerPoolConfig {
                concurrency: 0,
                ..WorkerPoolConfig::default()
            },
        );
        assert!(matches!(idle.start(), Err(JobError::Configuration(_))));
        assert!(!idle.is_running());

        let pool = WorkerPool::new(store, scheduler, handler, WorkerPoolConfig::default());
        pool.start().unwrap();
        assert!(matches!(pool.start(), Err(JobError::Worker(_))));

        pool.shutdown().await.unwrap();
        assert!(!pool.is_running());
    }
}
