//! Matching of queued jobs to idle workers.
//!
//! Idle workers announce themselves by pushing a [`WorkerSlot`] into the
//! [`IdleRegistry`]. The [`Dispatcher`] thread takes the next job from the
//! [`JobQueue`], pops a slot (waiting if every worker is busy) and hands the
//! job over. Matching happens inline, so at most one dequeued job is ever
//! waiting for a worker.

use crate::core::{Job, PrimeError, Result};
use crate::queue::{JobQueue, QueueError};
use crate::store::ResultStore;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Handle to one idle worker, valid for a single assignment.
#[derive(Debug)]
pub struct WorkerSlot {
    worker_id: usize,
    assignment: Sender<Job>,
}

impl WorkerSlot {
    /// Create a slot that delivers jobs through `assignment`
    pub fn new(worker_id: usize, assignment: Sender<Job>) -> Self {
        Self {
            worker_id,
            assignment,
        }
    }

    /// ID of the worker behind this slot
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Hand a job to the worker, consuming the slot.
    ///
    /// Returns the job if the worker has already exited.
    pub fn assign(self, job: Job) -> std::result::Result<(), Job> {
        self.assignment.send(job).map_err(|e| e.into_inner())
    }
}

/// Bounded registry of idle workers.
///
/// A worker holds at most one slot in the registry at a time, so a capacity
/// of `worker_count` means registering never blocks. Pop order is FIFO
/// across registrations but workers that free up together race to register.
#[derive(Debug)]
pub struct IdleRegistry {
    sender: Sender<WorkerSlot>,
    receiver: Receiver<WorkerSlot>,
}

impl IdleRegistry {
    /// Create a registry for `worker_count` workers
    pub fn new(worker_count: usize) -> Self {
        let (sender, receiver) = channel::bounded(worker_count.max(1));
        Self { sender, receiver }
    }

    /// Announce an idle worker. Returns `false` if the registry is gone.
    pub fn register(&self, slot: WorkerSlot) -> bool {
        self.sender.send(slot).is_ok()
    }

    /// Wait for the next idle worker.
    pub fn acquire(&self) -> Option<WorkerSlot> {
        self.receiver.recv().ok()
    }

    /// Wait up to `timeout` for the next idle worker.
    pub fn acquire_timeout(&self, timeout: Duration) -> Option<WorkerSlot> {
        match self.receiver.recv_timeout(timeout) {
            Ok(slot) => Some(slot),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Number of workers currently waiting for a job
    pub fn idle_count(&self) -> usize {
        self.receiver.len()
    }
}

/// Dispatcher thread moving jobs from the queue to idle workers.
///
/// The thread exits once the queue is closed and every queued job has been
/// handed to a worker.
#[derive(Debug)]
pub struct Dispatcher {
    name: String,
    thread: Option<thread::JoinHandle<()>>,
    jobs_dispatched: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Spawn the dispatcher thread
    pub fn spawn(
        name: String,
        queue: Arc<JobQueue>,
        registry: Arc<IdleRegistry>,
        store: Arc<ResultStore>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let jobs_dispatched = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&jobs_dispatched);

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || Self::run(&queue, &registry, &store, &counter, poll_interval))
            .map_err(|e| {
                PrimeError::spawn_with_source(name.as_str(), "cannot start dispatcher", e)
            })?;

        Ok(Self {
            name,
            thread: Some(thread),
            jobs_dispatched,
        })
    }

    /// Number of jobs handed to workers so far
    pub fn jobs_dispatched(&self) -> u64 {
        self.jobs_dispatched.load(Ordering::Relaxed)
    }

    /// Wait for the dispatcher to drain the closed queue and exit
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| PrimeError::join(self.name.as_str(), "dispatcher panicked"))?;
        }
        Ok(())
    }

    fn run(
        queue: &JobQueue,
        registry: &IdleRegistry,
        store: &ResultStore,
        jobs_dispatched: &AtomicU64,
        poll_interval: Duration,
    ) {
        loop {
            match queue.recv_timeout(poll_interval) {
                Ok(job) => {
                    if Self::dispatch(job, registry, store) {
                        jobs_dispatched.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Err(QueueError::Empty) => continue,
                Err(_) => break,
            }
        }
        log::debug!("Dispatcher exiting: queue closed and drained");
    }

    /// Block until a worker accepts `job`. Returns `false` if no worker is
    /// left, in which case the job's entry is removed.
    fn dispatch(mut job: Job, registry: &IdleRegistry, store: &ResultStore) -> bool {
        while let Some(slot) = registry.acquire() {
            let worker_id = slot.worker_id();
            match slot.assign(job) {
                Ok(()) => {
                    log::trace!("Dispatched job to worker {}", worker_id);
                    return true;
                }
                Err(returned) => {
                    log::warn!(
                        "Worker {} exited before accepting {}; trying another",
                        worker_id,
                        returned
                    );
                    job = returned;
                }
            }
        }

        log::error!("No workers left to run {}; deleting its entry", job);
        store.delete(job.id());
        false
    }
}
