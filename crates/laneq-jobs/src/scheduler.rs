//! Delay scheduler: a time-ordered heap of jobs that are not visible yet,
//! drained into the priority store by a background poller.

use crate::config::SchedulerConfig;
use crate::job::Job;
use crate::metrics::SchedulerMetrics;
use crate::queue::PriorityStore;
use parking_lot::Mutex;
use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, Instrument};
use uuid::Uuid;

/// Stand-in fire time for delays past what `Instant` can represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A job waiting in the heap.
///
/// Ordered by `(fire_at, seq)`; `seq` is assigned on insertion so entries with
/// the same fire time come out in the order they were scheduled.
#[derive(Debug)]
struct ScheduledEntry {
    fire_at: Instant,
    seq: u64,
    job: Job,
}

impl PartialEq for ScheduledEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for ScheduledEntry {}

impl PartialOrd for ScheduledEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.fire_at
            .cmp(&other.fire_at)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

#[derive(Debug, Default)]
struct DelayHeap {
    entries: BinaryHeap<Reverse<ScheduledEntry>>,
    next_seq: u64,
}

impl DelayHeap {
    fn push(&mut self, job: Job, fire_at: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Reverse(ScheduledEntry { fire_at, seq, job }));
    }

    fn pop_due(&mut self, now: Instant) -> Option<Job> {
        if self.entries.peek()?.0.fire_at > now {
            return None;
        }
        self.entries.pop().map(|Reverse(entry)| entry.job)
    }
}

/// Scheduler statistics.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    /// Scheduler ID.
    pub id: String,

    /// Is the poller running.
    pub running: bool,

    /// Jobs currently waiting in the heap.
    pub delayed: usize,

    /// Jobs promoted since start.
    pub jobs_promoted: u64,
}

/// Delay scheduler.
///
/// The heap has its own lock. Due jobs are popped under that lock and handed
/// to the store only after it is released, so the heap lock and the store
/// lock are never held together.
pub struct DelayScheduler {
    /// Unique scheduler ID.
    id: String,

    /// Pending entries.
    heap: Mutex<DelayHeap>,

    /// Destination of promoted jobs.
    store: Arc<PriorityStore>,

    /// Poller tick.
    poll_interval: Duration,

    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,

    /// Running flag.
    running: AtomicBool,

    /// Jobs promoted counter.
    jobs_promoted: AtomicU64,
}

impl std::fmt::Debug for DelayScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayScheduler")
            .field("id", &self.id)
            .field("poll_interval", &self.poll_interval)
            .field("delayed", &self.pending())
            .field("running", &self.is_running())
            .finish()
    }
}

impl DelayScheduler {
    /// Create a scheduler feeding `store` and start its poller.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(store: Arc<PriorityStore>, config: &SchedulerConfig) -> Arc<Self> {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let scheduler = Arc::new(Self {
            id: format!("scheduler-{}", Uuid::new_v4()),
            heap: Mutex::new(DelayHeap::default()),
            store,
            poll_interval: config.poll_interval(),
            shutdown_tx,
            running: AtomicBool::new(true),
            jobs_promoted: AtomicU64::new(0),
        });

        info!(
            scheduler_id = %scheduler.id,
            poll_interval_ms = scheduler.poll_interval.as_millis() as u64,
            "Starting delay scheduler"
        );

        let span = tracing::info_span!("delay_scheduler", scheduler_id = %scheduler.id);
        tokio::spawn(scheduler.clone().run_poller(shutdown_rx).instrument(span));

        scheduler
    }

    /// Make `job` visible to workers once `delay` has elapsed.
    ///
    /// There is no way to take a job back out once scheduled.
    pub fn schedule(&self, job: Job, delay: Duration) {
        let now = Instant::now();
        let fire_at = now.checked_add(delay).unwrap_or(now + FAR_FUTURE);
        trace!(
            job_id = %job.id,
            delay_ms = delay.as_millis() as u64,
            "Scheduling delayed job"
        );

        let delayed = {
            let mut heap = self.heap.lock();
            heap.push(job, fire_at);
            heap.entries.len()
        };
        SchedulerMetrics::job_scheduled(delayed);
    }

    /// Move every job whose fire time has passed into the store.
    ///
    /// This is one poller tick; it drains the whole overdue backlog and
    /// returns how many jobs were promoted.
    pub fn promote_due(&self) -> usize {
        let now = Instant::now();
        let (due, delayed) = {
            let mut heap = self.heap.lock();
            let due: Vec<Job> = std::iter::from_fn(|| heap.pop_due(now)).collect();
            (due, heap.entries.len())
        };

        let count = due.len();
        for job in due {
            debug!(job_id = %job.id, priority = %job.priority(), "Promoting delayed job");
            self.store.enqueue(job);
        }

        if count > 0 {
            self.jobs_promoted.fetch_add(count as u64, Ordering::Relaxed);
            SchedulerMetrics::jobs_promoted(count, delayed);
        }
        count
    }

    /// Number of jobs waiting in the heap.
    pub fn pending(&self) -> usize {
        self.heap.lock().entries.len()
    }

    /// Time until the earliest entry is due, zero if it already is.
    pub fn next_due_in(&self) -> Option<Duration> {
        let heap = self.heap.lock();
        let entry = &heap.entries.peek()?.0;
        Some(entry.fire_at.saturating_duration_since(Instant::now()))
    }

    /// Stop the poller. Jobs still in the heap stay there.
    pub fn stop(&self) {
        info!(scheduler_id = %self.id, "Stopping delay scheduler...");
        let _ = self.shutdown_tx.send(());
    }

    /// Check if the poller is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Poller tick.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Get scheduler ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get scheduler statistics.
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            id: self.id.clone(),
            running: self.is_running(),
            delayed: self.pending(),
            jobs_promoted: self.jobs_promoted.load(Ordering::Relaxed),
        }
    }

    async fn run_poller(self: Arc<Self>, mut shutdown_rx: broadcast::Receiver<()>) {
        // `interval` rejects a zero period.
        let mut ticker = interval(self.poll_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(scheduler_id = %self.id, "Received shutdown signal");
                    break;
                }

                _ = ticker.tick() => {
                    self.promote_due();
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            scheduler_id = %self.id,
            delayed = self.pending(),
            promoted = self.jobs_promoted.load(Ordering::Relaxed),
            "Delay scheduler stopped"
        );
    }
}
