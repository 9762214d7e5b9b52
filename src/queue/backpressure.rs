//! Backpressure accounting for the bounded job queue.
//!
//! The queue never drops or rejects a job while open; a full queue makes the
//! submitter wait. These counters record how often that happened and for
//! how long, so callers can tell when `queue_capacity` is too small.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Statistics for backpressure events.
#[derive(Debug, Default)]
pub struct BackpressureStats {
    /// Jobs accepted by the queue
    jobs_enqueued: AtomicU64,
    /// Sends that found the queue full and had to wait
    blocked_sends: AtomicU64,
    /// Total time submitters spent waiting for space (microseconds)
    blocked_time_us: AtomicU64,
}

impl BackpressureStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an accepted job.
    pub fn record_enqueued(&self) {
        self.jobs_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a send that had to wait for space.
    pub fn record_blocked(&self, waited: Duration) {
        self.blocked_sends.fetch_add(1, Ordering::Relaxed);
        self.blocked_time_us
            .fetch_add(waited.as_micros() as u64, Ordering::Relaxed);
    }

    /// Gets the number of jobs accepted.
    pub fn jobs_enqueued(&self) -> u64 {
        self.jobs_enqueued.load(Ordering::Relaxed)
    }

    /// Gets the number of sends that blocked.
    pub fn blocked_sends(&self) -> u64 {
        self.blocked_sends.load(Ordering::Relaxed)
    }

    /// Gets the total time spent blocked, in microseconds.
    pub fn blocked_time_us(&self) -> u64 {
        self.blocked_time_us.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> BackpressureStatsSnapshot {
        BackpressureStatsSnapshot {
            jobs_enqueued: self.jobs_enqueued(),
            blocked_sends: self.blocked_sends(),
            blocked_time_us: self.blocked_time_us(),
        }
    }
}

/// A snapshot of backpressure statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackpressureStatsSnapshot {
    /// Jobs accepted by the queue
    pub jobs_enqueued: u64,
    /// Sends that found the queue full and had to wait
    pub blocked_sends: u64,
    /// Total time submitters spent waiting for space (microseconds)
    pub blocked_time_us: u64,
}
