//! Prime pool: submission, retrieval and lifecycle

use crate::core::{AtkinSieve, Job, JobId, PrimeComputer, PrimeError, Result};
use crate::pool::dispatcher::{Dispatcher, IdleRegistry};
use crate::pool::worker::{Worker, WorkerStats};
use crate::queue::{BackpressureStatsSnapshot, JobQueue};
use crate::store::{FetchOutcome, JobOutcome, ResultStore};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the prime pool
#[derive(Debug, Clone)]
pub struct PrimePoolConfig {
    /// Number of worker threads (0 = number of CPUs)
    pub worker_count: usize,
    /// Capacity of the job queue (0 = twice the worker count)
    pub queue_capacity: usize,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// How often the dispatcher checks for shutdown while the queue is empty.
    /// Default: 100ms
    pub poll_interval: Duration,
}

impl Default for PrimePoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            queue_capacity: 0,
            thread_name_prefix: "prime-worker".to_string(),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl PrimePoolConfig {
    /// Create a new configuration with the given number of workers
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: if worker_count == 0 {
                num_cpus::get()
            } else {
                worker_count
            },
            ..Default::default()
        }
    }

    /// Set the job queue capacity (0 = twice the worker count)
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the dispatcher poll interval.
    ///
    /// Shorter intervals make shutdown faster at the cost of more wakeups.
    ///
    /// # Panics
    ///
    /// Panics if interval is zero.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "poll interval must be non-zero");
        self.poll_interval = interval;
        self
    }

    /// Queue capacity after applying the default
    pub fn effective_queue_capacity(&self) -> usize {
        if self.queue_capacity == 0 {
            self.worker_count.saturating_mul(2)
        } else {
            self.queue_capacity
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(PrimeError::invalid_config(
                "worker_count",
                "Number of workers must be greater than 0",
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(PrimeError::invalid_config(
                "poll_interval",
                "Poll interval must be non-zero",
            ));
        }
        Ok(())
    }
}

/// A pool of workers computing prime ranges in the background.
///
/// Callers [`submit`](Self::submit) a range under an id and later collect
/// the result with [`fetch_one`](Self::fetch_one), which hands a finished
/// result out exactly once. Failed jobs leave no trace: their id simply
/// reads as [`FetchOutcome::NotFound`].
///
/// # Example
///
/// ```rust
/// use prime_pool::prelude::*;
/// use std::time::Duration;
///
/// # fn main() -> Result<()> {
/// let pool = PrimePool::with_workers(2)?;
/// pool.start()?;
///
/// pool.submit("a", 1, 10)?;
/// let primes = loop {
///     match pool.fetch_one(&JobId::new("a")) {
///         FetchOutcome::Completed(primes) => break primes,
///         FetchOutcome::Processing => std::thread::sleep(Duration::from_millis(5)),
///         FetchOutcome::NotFound => unreachable!("valid range"),
///     }
/// };
/// assert_eq!(primes, "[2,3,5,7]");
/// assert_eq!(pool.fetch_one(&JobId::new("a")), FetchOutcome::NotFound);
///
/// pool.shutdown()?;
/// # Ok(())
/// # }
/// ```
pub struct PrimePool {
    config: PrimePoolConfig,
    computer: Arc<dyn PrimeComputer>,
    store: Arc<ResultStore>,
    workers: RwLock<Vec<Worker>>,
    dispatcher: RwLock<Option<Dispatcher>>,
    queue: RwLock<Option<Arc<JobQueue>>>,
    registry: RwLock<Option<Arc<IdleRegistry>>>,
    running: AtomicBool,
    total_jobs_submitted: AtomicU64,
}

impl std::fmt::Debug for PrimePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimePool")
            .field("config", &self.config)
            .field("computer", &self.computer.name())
            .field("running", &self.running.load(Ordering::Relaxed))
            .field(
                "total_jobs_submitted",
                &self.total_jobs_submitted.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl PrimePool {
    /// Create a pool with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(PrimePoolConfig::default())
    }

    /// Create a pool with the given number of workers
    pub fn with_workers(worker_count: usize) -> Result<Self> {
        Self::with_config(PrimePoolConfig::new(worker_count))
    }

    /// Create a pool with custom configuration, computing with the Sieve of Atkin
    pub fn with_config(config: PrimePoolConfig) -> Result<Self> {
        Self::with_computer(config, Arc::new(AtkinSieve))
    }

    /// Create a pool that runs jobs through a custom [`PrimeComputer`]
    pub fn with_computer(config: PrimePoolConfig, computer: Arc<dyn PrimeComputer>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            computer,
            store: Arc::new(ResultStore::new()),
            workers: RwLock::new(Vec::new()),
            dispatcher: RwLock::new(None),
            queue: RwLock::new(None),
            registry: RwLock::new(None),
            running: AtomicBool::new(false),
            total_jobs_submitted: AtomicU64::new(0),
        })
    }

    /// Start the workers and the dispatcher.
    ///
    /// The pool can be restarted after [`shutdown`](Self::shutdown); a new
    /// queue is created while the result store is kept.
    pub fn start(&self) -> Result<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PrimeError::already_running(
                &self.config.thread_name_prefix,
                self.config.worker_count,
            ));
        }

        if let Err(e) = self.spawn_threads() {
            self.running.store(false, Ordering::Release);
            let _ = self.stop_threads();
            return Err(e);
        }

        log::info!(
            "Prime pool '{}' started: {} workers, queue capacity {}",
            self.config.thread_name_prefix,
            self.config.worker_count,
            self.config.effective_queue_capacity()
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(
            self.config.worker_count,
            self.config.effective_queue_capacity(),
        );

        Ok(())
    }

    fn spawn_threads(&self) -> Result<()> {
        let queue = Arc::new(JobQueue::new(self.config.effective_queue_capacity()));
        let registry = Arc::new(IdleRegistry::new(self.config.worker_count));
        *self.queue.write() = Some(Arc::clone(&queue));
        *self.registry.write() = Some(Arc::clone(&registry));

        for id in 0..self.config.worker_count {
            let worker = Worker::spawn(
                id,
                format!("{}-{}", self.config.thread_name_prefix, id),
                Arc::clone(&registry),
                Arc::clone(&self.store),
                Arc::clone(&self.computer),
            )?;
            self.workers.write().push(worker);
        }

        let dispatcher = Dispatcher::spawn(
            format!("{}-dispatcher", self.config.thread_name_prefix),
            queue,
            registry,
            Arc::clone(&self.store),
            self.config.poll_interval,
        )?;
        *self.dispatcher.write() = Some(dispatcher);

        Ok(())
    }

    /// Submit a job computing the primes in `[start, end]` under `id`.
    ///
    /// The id is marked [`JobOutcome::Processing`] before the job is queued.
    /// Blocks while the queue is full and returns as soon as the job is
    /// queued; it never waits for the computation. The range itself is not
    /// checked here: a bad range is discovered by the worker, which removes
    /// the entry.
    ///
    /// # Errors
    ///
    /// - [`PrimeError::NotRunning`] if the pool has not been started
    /// - [`PrimeError::DuplicateJobId`] if `id` already has a live entry
    /// - [`PrimeError::ShuttingDown`] if the pool shut down while waiting
    pub fn submit(&self, id: impl Into<JobId>, start: i64, end: i64) -> Result<()> {
        if !self.running.load(Ordering::Acquire) {
            return Err(PrimeError::not_running(&self.config.thread_name_prefix));
        }

        let queue = self
            .queue
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| PrimeError::not_running(&self.config.thread_name_prefix))?;

        let id = id.into();
        self.store.insert_processing(id.clone())?;
        log::debug!("Queueing primes in [{}, {}] for job {}", start, end, id);

        match queue.send(Job::new(id, start, end)) {
            Ok(()) => {
                self.total_jobs_submitted.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_submission(queue.len());
                Ok(())
            }
            Err(e) => {
                if let Some(job) = e.into_job() {
                    self.store.delete(job.id());
                }
                Err(PrimeError::shutting_down(queue.len()))
            }
        }
    }

    /// Submit a job under a freshly generated UUIDv4 id and return the id
    pub fn submit_new(&self, start: i64, end: i64) -> Result<JobId> {
        let id = JobId::generate();
        self.submit(id.clone(), start, end)?;
        Ok(id)
    }

    /// Consuming fetch of a single result.
    ///
    /// A completed result is returned once and then removed; a pending job
    /// reports `Processing` and stays in place. Unknown, consumed and failed
    /// ids all read as `NotFound`.
    pub fn fetch_one(&self, id: &JobId) -> FetchOutcome {
        self.store.take(id)
    }

    /// Snapshot of every live entry. Nothing is consumed.
    pub fn fetch_all(&self) -> HashMap<JobId, JobOutcome> {
        self.store.get_all()
    }

    /// The shared result store
    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// The pool configuration
    pub fn config(&self) -> &PrimePoolConfig {
        &self.config
    }

    /// Get the number of worker threads
    pub fn num_workers(&self) -> usize {
        self.config.worker_count
    }

    /// Get the job queue capacity
    pub fn queue_capacity(&self) -> usize {
        self.config.effective_queue_capacity()
    }

    /// Check if the pool is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Get total number of jobs submitted
    pub fn total_jobs_submitted(&self) -> u64 {
        self.total_jobs_submitted.load(Ordering::Relaxed)
    }

    /// Get current number of queued jobs (approximate)
    pub fn queue_len(&self) -> usize {
        self.queue.read().as_ref().map(|q| q.len()).unwrap_or(0)
    }

    /// Get number of workers currently waiting for a job (approximate)
    pub fn idle_workers(&self) -> usize {
        self.registry
            .read()
            .as_ref()
            .map(|r| r.idle_count())
            .unwrap_or(0)
    }

    /// Get backpressure counters of the current queue
    pub fn backpressure(&self) -> BackpressureStatsSnapshot {
        self.queue
            .read()
            .as_ref()
            .map(|q| q.stats().snapshot())
            .unwrap_or_default()
    }

    /// Get number of jobs the dispatcher has handed to workers
    pub fn jobs_dispatched(&self) -> u64 {
        self.dispatcher
            .read()
            .as_ref()
            .map(|d| d.jobs_dispatched())
            .unwrap_or(0)
    }

    /// Get statistics for all workers
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.workers.read().iter().map(|w| w.stats()).collect()
    }

    /// Get total jobs completed across all workers
    pub fn total_jobs_completed(&self) -> u64 {
        let workers = self.workers.read();
        workers.iter().map(|w| w.stats().get_jobs_completed()).sum()
    }

    /// Get total jobs failed across all workers
    pub fn total_jobs_failed(&self) -> u64 {
        let workers = self.workers.read();
        workers.iter().map(|w| w.stats().get_jobs_failed()).sum()
    }

    /// Get total jobs panicked across all workers
    pub fn total_jobs_panicked(&self) -> u64 {
        let workers = self.workers.read();
        workers.iter().map(|w| w.stats().get_jobs_panicked()).sum()
    }

    /// Shutdown the pool and wait for all threads to finish
    ///
    /// # Graceful Shutdown
    ///
    /// 1. Stops accepting new jobs
    /// 2. Closes the queue; the dispatcher hands every queued job to a worker
    /// 3. Stops each worker once it is idle and joins it
    ///
    /// Results already stored stay available for fetching.
    pub fn shutdown(&self) -> Result<()> {
        if self
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let stats = self.get_stats();
        let result = self.stop_threads();

        let completed: u64 = stats.iter().map(|s| s.get_jobs_completed()).sum();
        let failed: u64 = stats.iter().map(|s| s.get_jobs_failed()).sum();
        log::info!(
            "Prime pool '{}' shut down",
            self.config.thread_name_prefix
        );
        log::debug!("{} jobs completed, {} failed before shutdown", completed, failed);
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_shutdown(completed, failed);

        result
    }

    fn stop_threads(&self) -> Result<()> {
        let queue = self.queue.read().as_ref().map(Arc::clone);
        if let Some(queue) = &queue {
            queue.close();
        }

        let mut result = Ok(());
        if let Some(dispatcher) = self.dispatcher.write().take() {
            result = dispatcher.join();
        }

        // The closed queue is already drained unless the dispatcher died.
        if let Some(queue) = &queue {
            while let Ok(job) = queue.try_recv() {
                log::warn!("Dropping {} left by the dispatcher; deleting its entry", job);
                self.store.delete(job.id());
            }
        }

        let workers = std::mem::take(&mut *self.workers.write());
        for worker in &workers {
            worker.stop();
        }
        for worker in workers {
            if let Err(e) = worker.join() {
                result = result.and(Err(e));
            }
        }

        *self.queue.write() = None;
        *self.registry.write() = None;
        result
    }
}

impl Drop for PrimePool {
    fn drop(&mut self) {
        if self.running.load(Ordering::Acquire) {
            if let Err(e) = self.shutdown() {
                log::error!(
                    "Failed to shutdown prime pool '{}' during drop: {}",
                    self.config.thread_name_prefix,
                    e
                );
            }
        }
    }
}
