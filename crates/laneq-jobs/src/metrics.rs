//! Metrics for job queue monitoring.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding process installs a recorder.

use crate::queue::Priority;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Metric names for the job queue system.
pub mod names {
    /// Total jobs enqueued into a lane.
    pub const JOBS_ENQUEUED_TOTAL: &str = "laneq_jobs_enqueued_total";
    /// Total jobs dequeued for processing.
    pub const JOBS_DEQUEUED_TOTAL: &str = "laneq_jobs_dequeued_total";
    /// Total jobs completed successfully.
    pub const JOBS_COMPLETED_TOTAL: &str = "laneq_jobs_completed_total";
    /// Total failed attempts.
    pub const JOBS_FAILED_TOTAL: &str = "laneq_jobs_failed_total";
    /// Total retries scheduled.
    pub const JOBS_RETRIED_TOTAL: &str = "laneq_jobs_retried_total";
    /// Total jobs sent to dead letter lanes.
    pub const JOBS_DEAD_LETTERED_TOTAL: &str = "laneq_jobs_dead_lettered_total";

    /// Current pending jobs per lane.
    pub const JOBS_PENDING: &str = "laneq_jobs_pending";
    /// Current dead letter jobs per lane.
    pub const JOBS_DEAD_LETTER: &str = "laneq_jobs_dead_letter";

    /// Handler execution duration in seconds.
    pub const JOB_DURATION_SECONDS: &str = "laneq_job_duration_seconds";

    /// Total jobs placed in the delay heap.
    pub const SCHEDULER_JOBS_SCHEDULED_TOTAL: &str = "laneq_scheduler_jobs_scheduled_total";
    /// Total jobs promoted from the delay heap.
    pub const SCHEDULER_JOBS_PROMOTED_TOTAL: &str = "laneq_scheduler_jobs_promoted_total";
    /// Current size of the delay heap.
    pub const SCHEDULER_JOBS_DELAYED: &str = "laneq_scheduler_jobs_delayed";

    /// Worker pool concurrency.
    pub const WORKERS_CONCURRENCY: &str = "laneq_workers_concurrency";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::JOBS_ENQUEUED_TOTAL, "Total number of jobs enqueued");
    describe_counter!(
        names::JOBS_DEQUEUED_TOTAL,
        "Total number of jobs dequeued for processing"
    );
    describe_counter!(
        names::JOBS_COMPLETED_TOTAL,
        "Total number of jobs completed successfully"
    );
    describe_counter!(names::JOBS_FAILED_TOTAL, "Total number of failed attempts");
    describe_counter!(names::JOBS_RETRIED_TOTAL, "Total number of job retries");
    describe_counter!(
        names::JOBS_DEAD_LETTERED_TOTAL,
        "Total number of jobs sent to dead letter lanes"
    );

    describe_gauge!(names::JOBS_PENDING, "Current number of pending jobs");
    describe_gauge!(names::JOBS_DEAD_LETTER, "Current number of dead letter jobs");

    describe_histogram!(
        names::JOB_DURATION_SECONDS,
        "Job handler execution duration in seconds"
    );

    describe_counter!(
        names::SCHEDULER_JOBS_SCHEDULED_TOTAL,
        "Total number of jobs placed in the delay heap"
    );
    describe_counter!(
        names::SCHEDULER_JOBS_PROMOTED_TOTAL,
        "Total number of delayed jobs promoted to their lane"
    );
    describe_gauge!(
        names::SCHEDULER_JOBS_DELAYED,
        "Current number of jobs waiting in the delay heap"
    );

    describe_gauge!(names::WORKERS_CONCURRENCY, "Worker pool concurrency setting");
}

/// Job metrics recorder.
#[derive(Clone)]
pub struct JobMetrics;

impl JobMetrics {
    /// Record a job enqueued.
    pub fn job_enqueued(priority: Priority) {
        counter!(names::JOBS_ENQUEUED_TOTAL, "priority" => priority.as_str()).increment(1);
    }

    /// Record a job dequeued.
    pub fn job_dequeued(priority: Priority) {
        counter!(names::JOBS_DEQUEUED_TOTAL, "priority" => priority.as_str()).increment(1);
    }

    /// Record a job completed.
    pub fn job_completed(priority: Priority, job_type: &str, duration: Duration) {
        counter!(
            names::JOBS_COMPLETED_TOTAL,
            "priority" => priority.as_str(),
            "job_type" => job_type.to_string()
        )
        .increment(1);

        histogram!(
            names::JOB_DURATION_SECONDS,
            "job_type" => job_type.to_string(),
            "status" => "completed"
        )
        .record(duration.as_secs_f64());
    }

    /// Record a failed attempt.
    pub fn job_failed(
        priority: Priority,
        job_type: &str,
        error_kind: &'static str,
        duration: Duration,
    ) {
        counter!(
            names::JOBS_FAILED_TOTAL,
            "priority" => priority.as_str(),
            "job_type" => job_type.to_string(),
            "error_kind" => error_kind
        )
        .increment(1);

        histogram!(
            names::JOB_DURATION_SECONDS,
            "job_type" => job_type.to_string(),
            "status" => "failed"
        )
        .record(duration.as_secs_f64());
    }

    /// Record a retry being scheduled.
    pub fn job_retried(priority: Priority, retry_count: u32) {
        counter!(
            names::JOBS_RETRIED_TOTAL,
            "priority" => priority.as_str(),
            "retry_count" => retry_count.to_string()
        )
        .increment(1);
    }

    /// Record a job sent to dead letter.
    pub fn job_dead_lettered(priority: Priority) {
        counter!(names::JOBS_DEAD_LETTERED_TOTAL, "priority" => priority.as_str()).increment(1);
    }

    /// Update lane size gauges.
    pub fn update_lane_depth(priority: Priority, pending: usize, dead_letter: usize) {
        gauge!(names::JOBS_PENDING, "priority" => priority.as_str()).set(pending as f64);
        gauge!(names::JOBS_DEAD_LETTER, "priority" => priority.as_str()).set(dead_letter as f64);
    }
}

/// Scheduler metrics recorder.
#[derive(Clone)]
pub struct SchedulerMetrics;

impl SchedulerMetrics {
    /// Record a job placed in the delay heap.
    pub fn job_scheduled(delayed: usize) {
        counter!(names::SCHEDULER_JOBS_SCHEDULED_TOTAL).increment(1);
        gauge!(names::SCHEDULER_JOBS_DELAYED).set(delayed as f64);
    }

    /// Record jobs promoted by one poller tick.
    pub fn jobs_promoted(count: usize, delayed: usize) {
        counter!(names::SCHEDULER_JOBS_PROMOTED_TOTAL).increment(count as u64);
        gauge!(names::SCHEDULER_JOBS_DELAYED).set(delayed as f64);
    }
}

/// Worker metrics recorder.
#[derive(Clone)]
pub struct WorkerMetrics;

impl WorkerMetrics {
    /// Update worker pool concurrency.
    pub fn update_concurrency(pool_id: &str, concurrency: usize) {
        gauge!(names::WORKERS_CONCURRENCY, "pool_id" => pool_id.to_string())
            .set(concurrency as f64);
    }
}
