//! Bounded FIFO queue with capacity limit.

use super::{BackpressureStats, QueueError, QueueResult};
use crate::core::Job;
use crossbeam::channel::{self, Receiver, Sender, TryRecvError, TrySendError};
use parking_lot::RwLock;
use std::time::{Duration, Instant};

/// How long a blocked sender holds the send guard before letting a pending
/// [`JobQueue::close`] through.
const CLOSE_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// A bounded FIFO queue of pending jobs.
///
/// [`send`](Self::send) blocks while the queue is full and only fails once
/// the queue is closed. Closing drops the only sender under a write guard,
/// while every send runs under the read guard, so a send either lands
/// before the close or fails with [`QueueError::Closed`]. Jobs already
/// queued when it closes can still be received; after that receivers get
/// [`QueueError::Disconnected`].
///
/// # Example
///
/// ```rust
/// use prime_pool::core::Job;
/// use prime_pool::queue::{JobQueue, QueueError};
///
/// let queue = JobQueue::new(2);
/// queue.send(Job::new("a", 1, 10)).unwrap();
/// queue.send(Job::new("b", 1, 20)).unwrap();
///
/// // Queue is now full - try_send hands the job back
/// match queue.try_send(Job::new("c", 1, 30)) {
///     Err(QueueError::Full(job)) => assert_eq!(job.id().as_str(), "c"),
///     _ => panic!("expected Full error"),
/// }
/// assert_eq!(queue.recv().unwrap().id().as_str(), "a");
/// ```
#[derive(Debug)]
pub struct JobQueue {
    sender: RwLock<Option<Sender<Job>>>,
    receiver: Receiver<Job>,
    capacity: usize,
    stats: BackpressureStats,
}

impl JobQueue {
    /// Creates a new bounded queue with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        let (sender, receiver) = channel::bounded(capacity);
        Self {
            sender: RwLock::new(Some(sender)),
            receiver,
            capacity,
            stats: BackpressureStats::new(),
        }
    }

    /// Returns the maximum capacity of this queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Backpressure counters for this queue.
    pub fn stats(&self) -> &BackpressureStats {
        &self.stats
    }

    /// Enqueues a job, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] with the job if the queue is closed
    /// before the job is accepted, even if space frees up afterwards.
    pub fn send(&self, job: Job) -> QueueResult<()> {
        let mut job = match self.try_send(job) {
            Err(QueueError::Full(job)) => job,
            other => return other,
        };

        let started = Instant::now();
        loop {
            // Released between attempts so close() cannot starve.
            let guard = self.sender.read();
            let Some(sender) = guard.as_ref() else {
                return Err(QueueError::Closed(job));
            };
            match sender.send_timeout(job, CLOSE_CHECK_INTERVAL) {
                Ok(()) => {
                    self.stats.record_blocked(started.elapsed());
                    self.stats.record_enqueued();
                    return Ok(());
                }
                Err(channel::SendTimeoutError::Timeout(returned)) => job = returned,
                Err(channel::SendTimeoutError::Disconnected(returned)) => {
                    return Err(QueueError::Closed(returned));
                }
            }
        }
    }

    /// Attempts to enqueue a job without blocking.
    ///
    /// # Errors
    ///
    /// - [`QueueError::Full`] if the queue is at capacity
    /// - [`QueueError::Closed`] if the queue has been closed
    pub fn try_send(&self, job: Job) -> QueueResult<()> {
        let guard = self.sender.read();
        let Some(sender) = guard.as_ref() else {
            return Err(QueueError::Closed(job));
        };
        sender
            .try_send(job)
            .map(|()| self.stats.record_enqueued())
            .map_err(|e| match e {
                TrySendError::Full(job) => QueueError::Full(job),
                TrySendError::Disconnected(job) => QueueError::Closed(job),
            })
    }

    /// Receives a job, blocking until one is available.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Disconnected`] once the queue is closed and empty.
    pub fn recv(&self) -> QueueResult<Job> {
        self.receiver.recv().map_err(|_| QueueError::Disconnected)
    }

    /// Attempts to receive a job without blocking.
    pub fn try_recv(&self) -> QueueResult<Job> {
        self.receiver.try_recv().map_err(|e| match e {
            TryRecvError::Empty => QueueError::Empty,
            TryRecvError::Disconnected => QueueError::Disconnected,
        })
    }

    /// Receives a job with a timeout.
    ///
    /// # Returns
    ///
    /// - `Ok(job)` if a job was received within the timeout
    /// - `Err(QueueError::Empty)` if no job arrived within the timeout
    /// - `Err(QueueError::Disconnected)` if the queue is closed and empty
    pub fn recv_timeout(&self, timeout: Duration) -> QueueResult<Job> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            channel::RecvTimeoutError::Timeout => QueueError::Empty,
            channel::RecvTimeoutError::Disconnected => QueueError::Disconnected,
        })
    }

    /// Closes the queue. New sends fail; queued jobs can still be received.
    ///
    /// Waits for any send attempt in progress to finish or time out, so once
    /// this returns no further job can enter the queue.
    pub fn close(&self) {
        self.sender.write().take();
    }

    /// Returns `true` if the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Returns the current number of queued jobs.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if no jobs are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
