//! Job and job identifier types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier under which a job's outcome is stored.
///
/// The pool never interprets the token; callers may bring their own or use
/// [`JobId::generate`] for a random UUIDv4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create an id from any string token
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random UUIDv4 id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A request to find every prime in `[start, end]`.
///
/// Jobs are created once at submission and never mutated; the range is
/// validated by the worker that picks the job up, not by the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    start: i64,
    end: i64,
}

impl Job {
    /// Create a new job
    pub fn new(id: impl Into<JobId>, start: i64, end: i64) -> Self {
        Self {
            id: id.into(),
            start,
            end,
        }
    }

    /// The job's id
    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Requested start of the range, as submitted
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Requested end of the range, as submitted
    pub fn end(&self) -> i64 {
        self.end
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({}, [{}, {}])", self.id, self.start, self.end)
    }
}
