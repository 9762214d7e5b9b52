//! Shared store of job outcomes keyed by job id.
//!
//! Workers write outcomes, callers read or consume them. Every operation,
//! reads included, takes the same lock, and the consuming fetch
//! ([`ResultStore::take`]) checks and removes under one acquisition so a
//! concurrent writer can never slip in between.

use crate::core::{JobId, PrimeError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The state of a live result entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "primes", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Submitted and not finished yet
    Processing,
    /// Finished; holds the primes as a JSON array
    Completed(String),
}

impl JobOutcome {
    /// Returns `true` if the job is still running or queued
    pub fn is_processing(&self) -> bool {
        matches!(self, JobOutcome::Processing)
    }

    /// Returns the serialized primes if the job has completed
    pub fn as_completed(&self) -> Option<&str> {
        match self {
            JobOutcome::Completed(primes) => Some(primes),
            JobOutcome::Processing => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            JobOutcome::Processing => "processing",
            JobOutcome::Completed(_) => "completed",
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Processing => f.write_str("Processing"),
            JobOutcome::Completed(primes) => f.write_str(primes),
        }
    }
}

/// Result of a consuming single-entry fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The job finished; its entry has been removed
    Completed(String),
    /// The job is still pending; nothing was removed
    Processing,
    /// Unknown id, already consumed, or the job failed
    NotFound,
}

/// Synchronized mapping from job id to [`JobOutcome`].
#[derive(Debug, Default)]
pub struct ResultStore {
    entries: Mutex<HashMap<JobId, JobOutcome>>,
}

impl ResultStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an outcome for `id`.
    ///
    /// A `Completed` outcome always overwrites. A `Processing` outcome is only
    /// accepted for an id with no live entry, so an entry never moves from
    /// `Completed` back to `Processing` and an id is never in flight twice.
    ///
    /// # Errors
    ///
    /// Returns [`PrimeError::DuplicateJobId`] if `Processing` is written over
    /// a live entry.
    pub fn put(&self, id: JobId, outcome: JobOutcome) -> Result<()> {
        let mut entries = self.entries.lock();
        if outcome.is_processing() && entries.contains_key(&id) {
            return Err(PrimeError::duplicate_job_id(id.as_str()));
        }
        log::debug!("Result for job {} updated to {}", id, outcome.label());
        entries.insert(id, outcome);
        Ok(())
    }

    /// Mark `id` as submitted
    pub fn insert_processing(&self, id: JobId) -> Result<()> {
        self.put(id, JobOutcome::Processing)
    }

    /// Record the serialized primes for `id`
    pub fn complete(&self, id: JobId, primes: String) {
        let mut entries = self.entries.lock();
        log::debug!("Result for job {} stored", id);
        entries.insert(id, JobOutcome::Completed(primes));
    }

    /// Read the entry for `id` without consuming it
    pub fn get(&self, id: &JobId) -> Option<JobOutcome> {
        self.entries.lock().get(id).cloned()
    }

    /// Snapshot of every live entry. Nothing is removed.
    pub fn get_all(&self) -> HashMap<JobId, JobOutcome> {
        self.entries.lock().clone()
    }

    /// Remove the entry for `id`, returning it if present
    pub fn delete(&self, id: &JobId) -> Option<JobOutcome> {
        self.entries.lock().remove(id)
    }

    /// Consuming fetch: a `Completed` entry is returned and removed, a
    /// `Processing` entry is reported and left in place.
    pub fn take(&self, id: &JobId) -> FetchOutcome {
        let mut entries = self.entries.lock();
        match entries.remove(id) {
            Some(JobOutcome::Completed(primes)) => {
                log::debug!("Result for job {} retrieved and removed", id);
                FetchOutcome::Completed(primes)
            }
            Some(JobOutcome::Processing) => {
                entries.insert(id.clone(), JobOutcome::Processing);
                FetchOutcome::Processing
            }
            None => FetchOutcome::NotFound,
        }
    }

    /// Returns `true` if `id` has a live entry
    pub fn contains(&self, id: &JobId) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if there are no live entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
