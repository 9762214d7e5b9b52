//! Tracing integration for observability.
//!
//! Available with the `tracing` feature. Workers open a `worker` span for
//! their lifetime and a `job_execution` span per job; the functions in
//! [`metrics`] emit events that a metrics layer can turn into counters,
//! gauges and histograms.
//!
//! # Example
//!
//! ```rust,ignore
//! use prime_pool::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("prime_pool=trace".parse().unwrap()))
//!     .init();
//!
//! let pool = PrimePool::with_workers(4)?;
//! pool.start()?;
//! pool.submit("a", 1, 1_000_000)?;
//! ```

/// Metrics recording functions.
///
/// Field names follow the `counter.*`, `gauge.*` and `histogram.*`
/// convention understood by tracing-to-metrics bridges.
pub mod metrics {
    use std::time::Duration;

    /// Records a job accepted by the queue.
    #[inline]
    pub fn record_submission(queue_depth: usize) {
        tracing::trace!(
            counter.jobs_submitted = 1,
            gauge.queue_depth = queue_depth as i64,
            "job submitted"
        );
    }

    /// Records a finished computation. `success` is false when the range was
    /// rejected or the computation failed.
    #[inline]
    pub fn record_completion(duration: Duration, success: bool) {
        let duration_ms = duration.as_millis() as u64;
        if success {
            tracing::trace!(
                counter.jobs_completed = 1,
                histogram.job_duration_ms = duration_ms,
                "primes stored"
            );
        } else {
            tracing::trace!(
                counter.jobs_failed = 1,
                histogram.job_duration_ms = duration_ms,
                "job failed; entry deleted"
            );
        }
    }

    /// Records a computation that panicked.
    #[inline]
    pub fn record_panic(duration: Duration) {
        tracing::trace!(
            counter.jobs_panicked = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job panicked; entry deleted"
        );
    }

    /// Records a worker taking a job.
    #[inline]
    pub fn record_worker_busy(worker_id: usize) {
        tracing::trace!(gauge.workers_busy = 1, worker_id, "worker busy");
    }

    /// Records a worker going back to the idle registry.
    #[inline]
    pub fn record_worker_idle(worker_id: usize) {
        tracing::trace!(gauge.workers_busy = -1i64, worker_id, "worker idle");
    }

    /// Records pool startup.
    #[inline]
    pub fn record_pool_start(num_workers: usize, queue_capacity: usize) {
        tracing::info!(
            workers = num_workers,
            queue_capacity,
            "prime pool started"
        );
    }

    /// Records pool shutdown.
    #[inline]
    pub fn record_pool_shutdown(jobs_completed: u64, jobs_failed: u64) {
        tracing::info!(jobs_completed, jobs_failed, "prime pool shutdown complete");
    }
}
