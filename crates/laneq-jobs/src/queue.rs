//! Priority store: three FIFO lanes of pending jobs plus three dead-letter
//! lanes, all guarded by one lock.

use crate::error::JobError;
use crate::job::{Job, JobId};
use crate::metrics::JobMetrics;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

/// Job priority levels.
///
/// The numeric codes are the ones accepted at the producer boundary; any
/// other value is rejected before a job can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Priority {
    /// Drained first.
    High = 1,
    /// Drained once High is empty.
    Medium = 2,
    /// Drained once High and Medium are empty.
    Low = 3,
}

impl Priority {
    /// All priorities in drain order.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    fn lane(self) -> usize {
        self as usize - 1
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(JobError::InvalidPriority(s.to_string())),
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = JobError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            other => Err(JobError::InvalidPriority(other.to_string())),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

type LaneSet = [VecDeque<Job>; 3];

#[derive(Debug, Default)]
struct Lanes {
    pending: LaneSet,
    dead_letter: LaneSet,
}

impl Lanes {
    /// Pending and dead-letter lengths of one priority.
    fn depth(&self, priority: Priority) -> (usize, usize) {
        (
            self.pending[priority.lane()].len(),
            self.dead_letter[priority.lane()].len(),
        )
    }
}

fn pop_by_priority(lanes: &mut LaneSet) -> Option<Job> {
    lanes.iter_mut().find_map(VecDeque::pop_front)
}

// First match wins when IDs are duplicated.
fn remove_by_id(lane: &mut VecDeque<Job>, id: &JobId) -> Option<Job> {
    let position = lane.iter().position(|job| &job.id == id)?;
    lane.remove(position)
}

fn snapshot(lanes: &LaneSet) -> LaneSnapshot {
    LaneSnapshot {
        high: lanes[Priority::High.lane()].iter().cloned().collect(),
        medium: lanes[Priority::Medium.lane()].iter().cloned().collect(),
        low: lanes[Priority::Low.lane()].iter().cloned().collect(),
    }
}

/// Point-in-time copy of three lanes, each in FIFO order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LaneSnapshot {
    /// High lane.
    pub high: Vec<Job>,
    /// Medium lane.
    pub medium: Vec<Job>,
    /// Low lane.
    pub low: Vec<Job>,
}

impl LaneSnapshot {
    /// Jobs of one lane.
    pub fn lane(&self, priority: Priority) -> &[Job] {
        match priority {
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
        }
    }

    /// Total number of jobs across lanes.
    pub fn len(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }

    /// True if every lane is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All jobs in drain order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.high.iter().chain(self.medium.iter()).chain(self.low.iter())
    }
}

/// Per-lane job counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneCounts {
    /// High lane length.
    pub high: usize,
    /// Medium lane length.
    pub medium: usize,
    /// Low lane length.
    pub low: usize,
}

impl LaneCounts {
    fn of(lanes: &LaneSet) -> Self {
        Self {
            high: lanes[Priority::High.lane()].len(),
            medium: lanes[Priority::Medium.lane()].len(),
            low: lanes[Priority::Low.lane()].len(),
        }
    }

    /// Sum over lanes.
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Queue statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Pending jobs per lane.
    pub pending: LaneCounts,
    /// Dead-lettered jobs per lane.
    pub dead_letter: LaneCounts,
}

/// In-memory priority store.
///
/// Every operation takes the same lock, which covers both the pending and the
/// dead-letter lanes and is released before the call returns. Lanes are
/// unbounded.
#[derive(Debug, Default)]
pub struct PriorityStore {
    lanes: Mutex<Lanes>,
    job_available: Notify,
}

impl PriorityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job to the tail of its lane and wake one idle worker.
    pub fn enqueue(&self, job: Job) {
        let priority = job.priority();
        trace!(job_id = %job.id, priority = %priority, "Enqueue job");

        let (pending, dead_letter) = {
            let mut lanes = self.lanes.lock();
            lanes.pending[priority.lane()].push_back(job);
            lanes.depth(priority)
        };

        JobMetrics::job_enqueued(priority);
        JobMetrics::update_lane_depth(priority, pending, dead_letter);
        self.job_available.notify_one();
    }

    /// Remove and return the head of the highest-priority non-empty lane.
    ///
    /// `None` means all lanes are empty.
    pub fn dequeue(&self) -> Option<Job> {
        let (job, (pending, dead_letter)) = {
            let mut lanes = self.lanes.lock();
            let job = pop_by_priority(&mut lanes.pending)?;
            let depth = lanes.depth(job.priority());
            (job, depth)
        };

        JobMetrics::job_dequeued(job.priority());
        JobMetrics::update_lane_depth(job.priority(), pending, dead_letter);
        Some(job)
    }

    /// Remove the first job in `job`'s lane with the same ID.
    ///
    /// Returns false, and changes nothing, if no such job is pending.
    pub fn remove(&self, job: &Job) -> bool {
        let priority = job.priority();
        let depth = {
            let mut lanes = self.lanes.lock();
            remove_by_id(&mut lanes.pending[priority.lane()], &job.id)
                .map(|_| lanes.depth(priority))
        };

        let Some((pending, dead_letter)) = depth else {
            return false;
        };
        debug!(job_id = %job.id, priority = %priority, "Removed pending job");
        JobMetrics::update_lane_depth(priority, pending, dead_letter);
        true
    }

    /// Move a job into the dead-letter lane of its priority.
    ///
    /// Drops the first pending entry with the same ID if there is one, then
    /// appends `job` to dead-letter. Both steps happen under one lock hold.
    pub fn move_to_dead_letter(&self, job: Job) {
        let priority = job.priority();
        let lane = priority.lane();

        let job_id = job.id.clone();
        let (retry_count, max_retries) = (job.retry_count(), job.max_retries());

        let (was_pending, pending, dead_letter) = {
            let mut lanes = self.lanes.lock();
            let was_pending = remove_by_id(&mut lanes.pending[lane], &job_id).is_some();
            lanes.dead_letter[lane].push_back(job);
            let (pending, dead_letter) = lanes.depth(priority);
            (was_pending, pending, dead_letter)
        };

        warn!(
            job_id = %job_id,
            priority = %priority,
            retry_count,
            max_retries,
            was_pending,
            "Job moved to dead-letter queue"
        );
        JobMetrics::job_dead_lettered(priority);
        JobMetrics::update_lane_depth(priority, pending, dead_letter);
    }

    /// Remove and return the head of the highest-priority non-empty
    /// dead-letter lane.
    pub fn dequeue_dead_letter(&self) -> Option<Job> {
        let (job, (pending, dead_letter)) = {
            let mut lanes = self.lanes.lock();
            let job = pop_by_priority(&mut lanes.dead_letter)?;
            let depth = lanes.depth(job.priority());
            (job, depth)
        };

        JobMetrics::update_lane_depth(job.priority(), pending, dead_letter);
        Some(job)
    }

    /// Copy of the pending lanes.
    pub fn list_all(&self) -> LaneSnapshot {
        snapshot(&self.lanes.lock().pending)
    }

    /// Copy of the dead-letter lanes.
    pub fn list_all_dead_letter(&self) -> LaneSnapshot {
        snapshot(&self.lanes.lock().dead_letter)
    }

    /// Lane counts for pending and dead-letter jobs.
    pub fn stats(&self) -> QueueStats {
        let lanes = self.lanes.lock();
        QueueStats {
            pending: LaneCounts::of(&lanes.pending),
            dead_letter: LaneCounts::of(&lanes.dead_letter),
        }
    }

    /// Number of pending jobs.
    pub fn len(&self) -> usize {
        self.lanes.lock().pending.iter().map(VecDeque::len).sum()
    }

    /// True if no job is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until a job is enqueued or `timeout` elapses.
    ///
    /// Returns true when woken by an enqueue. A wake-up does not guarantee a
    /// job is still there; callers dequeue and loop.
    pub async fn wait_for_job(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.job_available.notified())
            .await
            .is_ok()
    }
}
