//! Job definitions.

use crate::queue::Priority;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Retry budget used when the producer does not set one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Unique job identifier.
///
/// Uniqueness is the producer's responsibility; the queue never checks it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates a job ID from a string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the job ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A unit of work.
///
/// `priority` and `max_retries` are fixed once the job is built; the only
/// field that changes afterwards is `retry_count`, and only through
/// [`Job::record_failure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job ID.
    pub id: JobId,

    /// Free-form type tag, e.g. `email`.
    #[serde(rename = "type")]
    pub job_type: String,

    /// Opaque payload handed to the handler.
    pub payload: HashMap<String, String>,

    /// Lane the job lives in.
    priority: Priority,

    /// Failed attempts so far.
    retry_count: u32,

    /// Failed attempts tolerated before dead-lettering.
    max_retries: u32,

    /// When the job was created.
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Creates a job with a generated ID and the default retry budget.
    pub fn new(job_type: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: JobId::new(),
            job_type: job_type.into(),
            payload: HashMap::new(),
            priority,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            created_at: Utc::now(),
        }
    }

    /// Use a caller-supplied ID.
    pub fn with_id(mut self, id: impl Into<JobId>) -> Self {
        self.id = id.into();
        self
    }

    /// Add a payload entry.
    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Add several payload entries.
    pub fn with_payload_map(mut self, payload: impl IntoIterator<Item = (String, String)>) -> Self {
        self.payload.extend(payload);
        self
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Lane priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Failed attempts so far.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Failed attempts tolerated before dead-lettering.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// 1-based number of the attempt currently being made.
    pub fn attempt(&self) -> u32 {
        self.retry_count + 1
    }

    /// Looks up a payload value.
    pub fn payload_value(&self, key: &str) -> Option<&str> {
        self.payload.get(key).map(String::as_str)
    }

    /// Count one failed attempt and return the new retry count.
    pub fn record_failure(&mut self) -> u32 {
        self.retry_count += 1;
        self.retry_count
    }

    /// True once the retry budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.retry_count > self.max_retries
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, priority: {}, retries: {}/{})",
            self.id, self.job_type, self.priority, self.retry_count, self.max_retries
        )
    }
}
