//! Bounded job queue feeding the dispatcher.
//!
//! [`JobQueue`] is a FIFO buffer with a fixed capacity. Submitters block on
//! [`JobQueue::send`] while it is full, so load turns into backpressure on
//! callers instead of dropped work. Errors hand the job back to the caller.

mod backpressure;
mod bounded;

pub use backpressure::{BackpressureStats, BackpressureStatsSnapshot};
pub use bounded::JobQueue;

use crate::core::Job;

/// Errors that can occur during queue operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Queue is full (non-blocking send only)
    Full(Job),
    /// Queue is closed and not accepting new jobs
    Closed(Job),
    /// Queue is empty (for try_recv / recv_timeout)
    Empty,
    /// Queue is closed and drained
    Disconnected,
}

impl QueueError {
    /// Recover the job carried by a send error
    pub fn into_job(self) -> Option<Job> {
        match self {
            QueueError::Full(job) | QueueError::Closed(job) => Some(job),
            QueueError::Empty | QueueError::Disconnected => None,
        }
    }
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::Full(job) => write!(f, "queue is full, cannot accept job {}", job.id()),
            QueueError::Closed(job) => write!(f, "queue is closed, cannot accept job {}", job.id()),
            QueueError::Empty => write!(f, "queue is empty"),
            QueueError::Disconnected => write!(f, "queue is disconnected"),
        }
    }
}

impl std::error::Error for QueueError {}

/// Result type for queue operations.
pub type QueueResult<T> = std::result::Result<T, QueueError>;
