//! Worker thread implementation

use crate::core::{compute_job, Job, PrimeComputer, PrimeError, Result};
use crate::pool::dispatcher::{IdleRegistry, WorkerSlot};
use crate::store::ResultStore;
use crossbeam::channel::{self, Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::{debug, span, Level};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Jobs whose primes were stored
    pub jobs_completed: AtomicU64,
    /// Jobs rejected by validation or failing computation
    pub jobs_failed: AtomicU64,
    /// Jobs whose computation panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent processing jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment jobs completed counter
    pub fn increment_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs failed counter
    pub fn increment_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs panicked counter
    pub fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total jobs completed
    pub fn get_jobs_completed(&self) -> u64 {
        self.jobs_completed.load(Ordering::Relaxed)
    }

    /// Get total jobs failed
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Get jobs handled in any way
    pub fn get_jobs_handled(&self) -> u64 {
        self.get_jobs_completed() + self.get_jobs_failed() + self.get_jobs_panicked()
    }

    /// Get average processing time per handled job in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.get_jobs_handled();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// Everything a worker thread needs to process jobs
struct WorkerContext {
    id: usize,
    registry: Arc<IdleRegistry>,
    store: Arc<ResultStore>,
    computer: Arc<dyn PrimeComputer>,
    stats: Arc<WorkerStats>,
}

/// A worker thread that computes one job at a time.
///
/// Each time it is free the worker pushes a [`WorkerSlot`] into the shared
/// [`IdleRegistry`] and waits until the dispatcher assigns a job through
/// that slot or the worker is told to stop.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    name: String,
    thread: Option<thread::JoinHandle<()>>,
    stop: Sender<()>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a worker thread named `name`
    pub fn spawn(
        id: usize,
        name: String,
        registry: Arc<IdleRegistry>,
        store: Arc<ResultStore>,
        computer: Arc<dyn PrimeComputer>,
    ) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let (stop, stop_signal) = channel::bounded(1);
        let context = WorkerContext {
            id,
            registry,
            store,
            computer,
            stats: Arc::clone(&stats),
        };

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || Self::run(context, stop_signal))
            .map_err(|e| PrimeError::spawn_with_source(name.as_str(), "cannot start worker", e))?;

        Ok(Self {
            id,
            name,
            thread: Some(thread),
            stop,
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Ask the worker to exit once it is idle.
    ///
    /// A job already assigned runs to completion first.
    pub fn stop(&self) {
        let _ = self.stop.try_send(());
    }

    /// Join the worker thread
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| PrimeError::join(self.name.as_str(), "worker panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop: register idle, wait for a job or stop, repeat.
    fn run(context: WorkerContext, stop_signal: Receiver<()>) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = context.id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        let (assignment, assigned) = channel::bounded::<Job>(1);

        loop {
            if !context
                .registry
                .register(WorkerSlot::new(context.id, assignment.clone()))
            {
                break;
            }

            channel::select! {
                recv(assigned) -> job => match job {
                    Ok(job) => {
                        #[cfg(feature = "tracing")]
                        crate::tracing::metrics::record_worker_busy(context.id);

                        Self::execute_job(&context, job);

                        #[cfg(feature = "tracing")]
                        crate::tracing::metrics::record_worker_idle(context.id);
                    }
                    Err(_) => break,
                },
                recv(stop_signal) -> _ => {
                    // select! picks randomly when both are ready; never drop
                    // a job the dispatcher already handed over.
                    if let Ok(job) = assigned.try_recv() {
                        Self::execute_job(&context, job);
                    }
                    break;
                }
            }
        }

        log::debug!(
            "Worker {} exiting after {} jobs ({} failed, {} panicked)",
            context.id,
            context.stats.get_jobs_handled(),
            context.stats.get_jobs_failed(),
            context.stats.get_jobs_panicked()
        );
    }

    /// Compute a single job with panic protection and record its outcome.
    ///
    /// Success stores the serialized primes. Any failure removes the job's
    /// entry instead of recording an error, so callers later see `NotFound`.
    fn execute_job(context: &WorkerContext, job: Job) {
        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job_id = %job.id());
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();

        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            compute_job(context.computer.as_ref(), &job)
        }));
        let elapsed = start.elapsed();

        match outcome {
            Ok(Ok(primes)) => {
                context.store.complete(job.id().clone(), primes);
                context.stats.increment_completed();
                #[cfg(feature = "tracing")]
                {
                    debug!(duration_ms = elapsed.as_millis() as u64, "job completed");
                    crate::tracing::metrics::record_completion(elapsed, true);
                }
            }
            Ok(Err(e)) => {
                if e.is_job_failure() {
                    log::warn!("Worker {}: {} failed: {}; deleting its entry", context.id, job, e);
                } else {
                    log::error!(
                        "Worker {}: unexpected error for {}: {}; deleting its entry",
                        context.id,
                        job,
                        e
                    );
                }
                context.store.delete(job.id());
                context.stats.increment_failed();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_completion(elapsed, false);
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                log::error!(
                    "Worker {}: {} panicked: {}; deleting its entry",
                    context.id,
                    job,
                    panic_msg
                );
                context.store.delete(job.id());
                context.stats.increment_panicked();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_panic(elapsed);
            }
        }

        context
            .stats
            .add_processing_time(elapsed.as_micros() as u64);
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

            self.stop();
            let start = Instant::now();
            while !thread.is_finished() {
                if start.elapsed() >= JOIN_TIMEOUT {
                    log::warn!(
                        "Worker {} did not finish within {}s during drop; thread may be leaked",
                        self.id,
                        JOIN_TIMEOUT.as_secs()
                    );
                    return;
                }
                thread::sleep(Duration::from_millis(10));
            }
            if thread.join().is_err() {
                log::error!("Worker {} panicked during shutdown", self.id);
            }
        }
    }
}
