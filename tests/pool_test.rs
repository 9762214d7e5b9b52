//! End-to-end tests for submission, dispatch, backpressure and shutdown

use crossbeam::channel::{self, Receiver, Sender};
use prime_pool::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Computes with the Sieve of Atkin, but only after the test opens the gate
/// once for it. Tracks how many computations run at the same time.
struct GatedComputer {
    gate: Receiver<()>,
    started: Sender<i64>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl GatedComputer {
    fn new() -> (Arc<Self>, Sender<()>, Receiver<i64>) {
        let (open, gate) = channel::unbounded();
        let (started, started_rx) = channel::unbounded();
        let computer = Arc::new(Self {
            gate,
            started,
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        (computer, open, started_rx)
    }
}

impl PrimeComputer for GatedComputer {
    fn primes_in_range(&self, start: i64, end: i64) -> Result<Vec<u64>> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _ = self.started.send(start);

        let _ = self.gate.recv();

        self.running.fetch_sub(1, Ordering::SeqCst);
        AtkinSieve.primes_in_range(start, end)
    }

    fn name(&self) -> &str {
        "GatedComputer"
    }
}

struct PanicOnThirteen;

impl PrimeComputer for PanicOnThirteen {
    fn primes_in_range(&self, start: i64, end: i64) -> Result<Vec<u64>> {
        if start == 13 {
            panic!("unlucky range");
        }
        AtkinSieve.primes_in_range(start, end)
    }
}

fn wait_for(pool: &PrimePool, id: &str) -> FetchOutcome {
    let id = JobId::new(id);
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        match pool.fetch_one(&id) {
            FetchOutcome::Processing if Instant::now() < deadline => {
                thread::sleep(Duration::from_millis(5));
            }
            outcome => return outcome,
        }
    }
}

fn gated_pool(workers: usize, capacity: usize) -> (PrimePool, Arc<GatedComputer>, Sender<()>, Receiver<i64>) {
    let (computer, open, started) = GatedComputer::new();
    let config = PrimePoolConfig::new(workers)
        .with_queue_capacity(capacity)
        .with_poll_interval(Duration::from_millis(10));
    let pool = PrimePool::with_computer(config, computer.clone() as Arc<dyn PrimeComputer>)
        .expect("Failed to create pool");
    pool.start().expect("Failed to start pool");
    (pool, computer, open, started)
}

#[test]
fn test_submit_then_fetch_once() {
    let pool = PrimePool::with_workers(2).expect("Failed to create pool");
    pool.start().expect("Failed to start pool");

    pool.submit("a", 1, 10).expect("Failed to submit job");
    pool.submit("b", 10, 30).expect("Failed to submit job");

    assert_eq!(wait_for(&pool, "a"), FetchOutcome::Completed("[2,3,5,7]".to_string()));
    assert_eq!(
        wait_for(&pool, "b"),
        FetchOutcome::Completed("[11,13,17,19,23,29]".to_string())
    );

    // Consumed results are gone for good
    assert_eq!(pool.fetch_one(&JobId::new("a")), FetchOutcome::NotFound);
    assert!(pool.fetch_all().is_empty());

    pool.shutdown().expect("Failed to shutdown pool");
}

#[test]
fn test_invalid_ranges_read_as_not_found() {
    let pool = PrimePool::with_workers(2).expect("Failed to create pool");
    pool.start().expect("Failed to start pool");

    // Submission accepts the range; the worker rejects it and removes the entry
    for (id, start, end) in [("reversed", 5, 1), ("zero", 1, 0), ("one", 1, 1), ("negative", -10, -3)] {
        pool.submit(id, start, end).expect("Failed to submit job");
    }
    for id in ["reversed", "zero", "one", "negative"] {
        assert_eq!(wait_for(&pool, id), FetchOutcome::NotFound, "job {}", id);
    }
    assert_eq!(pool.total_jobs_failed(), 4);

    // A negative start with a valid end is clamped rather than rejected
    pool.submit("clamped", -10, 5).expect("Failed to submit job");
    assert_eq!(wait_for(&pool, "clamped"), FetchOutcome::Completed("[2,3,5]".to_string()));

    pool.shutdown().expect("Failed to shutdown pool");
}

#[test]
fn test_fetch_reports_processing_without_consuming() {
    let (pool, _computer, open, started) = gated_pool(1, 4);

    pool.submit("slow", 1, 100).expect("Failed to submit job");
    started.recv_timeout(Duration::from_secs(5)).expect("job never started");

    for _ in 0..3 {
        assert_eq!(pool.fetch_one(&JobId::new("slow")), FetchOutcome::Processing);
    }
    assert_eq!(
        pool.fetch_all().get(&JobId::new("slow")),
        Some(&JobOutcome::Processing)
    );

    open.send(()).unwrap();
    assert!(matches!(wait_for(&pool, "slow"), FetchOutcome::Completed(_)));
    pool.shutdown().expect("Failed to shutdown pool");
}

#[test]
fn test_at_most_n_jobs_run_concurrently() {
    let workers = 3;
    let (pool, computer, open, started) = gated_pool(workers, 16);

    for i in 0..12 {
        pool.submit(format!("job-{}", i), 1, 1_000)
            .expect("Failed to submit job");
    }
    for _ in 0..workers {
        started.recv_timeout(Duration::from_secs(5)).expect("worker never started");
    }

    // Every worker is busy and nothing else has started
    thread::sleep(Duration::from_millis(100));
    assert_eq!(computer.running.load(Ordering::SeqCst), workers);
    assert!(started.try_recv().is_err());
    assert_eq!(pool.idle_workers(), 0);

    for _ in 0..12 {
        open.send(()).unwrap();
    }
    for i in 0..12 {
        assert!(matches!(
            wait_for(&pool, &format!("job-{}", i)),
            FetchOutcome::Completed(_)
        ));
    }
    assert_eq!(computer.peak.load(Ordering::SeqCst), workers);
    assert_eq!(pool.total_jobs_completed(), 12);

    pool.shutdown().expect("Failed to shutdown pool");
}

#[test]
fn test_full_queue_blocks_submitter() {
    let (pool, _computer, open, started) = gated_pool(1, 1);
    let pool = Arc::new(pool);

    // j1 occupies the only worker
    pool.submit("j1", 1, 10).expect("Failed to submit job");
    started.recv_timeout(Duration::from_secs(5)).expect("job never started");

    // j2 is held by the dispatcher waiting for a worker, j3 fills the queue
    pool.submit("j2", 1, 20).expect("Failed to submit job");
    pool.submit("j3", 1, 30).expect("Failed to submit job");

    let p = Arc::clone(&pool);
    let blocked = thread::spawn(move || p.submit("j4", 1, 40));

    thread::sleep(Duration::from_millis(200));
    assert!(!blocked.is_finished(), "submit should block while the queue is full");
    assert_eq!(pool.queue_len(), 1);
    // Blocked submission is already visible as pending
    assert_eq!(pool.fetch_one(&JobId::new("j4")), FetchOutcome::Processing);

    // Finishing j1 frees the worker, which pulls the chain forward
    open.send(()).unwrap();
    blocked
        .join()
        .expect("Thread panicked")
        .expect("Failed to submit job");
    assert!(pool.backpressure().blocked_sends >= 1);

    for _ in 0..3 {
        open.send(()).unwrap();
    }
    for id in ["j1", "j2", "j3", "j4"] {
        assert!(matches!(wait_for(&pool, id), FetchOutcome::Completed(_)), "job {}", id);
    }

    pool.shutdown().expect("Failed to shutdown pool");
}

#[test]
fn test_shutdown_releases_blocked_submitter() {
    let (pool, _computer, open, started) = gated_pool(1, 1);
    let pool = Arc::new(pool);

    pool.submit("j1", 1, 10).expect("Failed to submit job");
    started.recv_timeout(Duration::from_secs(5)).expect("job never started");
    pool.submit("j2", 1, 20).expect("Failed to submit job");
    pool.submit("j3", 1, 30).expect("Failed to submit job");

    let p = Arc::clone(&pool);
    let blocked = thread::spawn(move || p.submit("j4", 1, 40));
    thread::sleep(Duration::from_millis(100));

    let p = Arc::clone(&pool);
    let shutdown = thread::spawn(move || p.shutdown());

    let result = blocked.join().expect("Thread panicked");
    assert!(matches!(result, Err(PrimeError::ShuttingDown { .. })));
    assert!(!pool.store().contains(&JobId::new("j4")));

    // Queued work still runs to completion before the workers exit
    for _ in 0..3 {
        open.send(()).unwrap();
    }
    shutdown
        .join()
        .expect("Thread panicked")
        .expect("Failed to shutdown pool");

    let results = pool.fetch_all();
    assert_eq!(results.len(), 3);
    assert_eq!(
        results.get(&JobId::new("j1")),
        Some(&JobOutcome::Completed("[2,3,5,7]".to_string()))
    );
    assert!(results.values().all(|outcome| !outcome.is_processing()));
}

#[test]
fn test_shutdown_racing_submitters_leaves_no_processing_entries() {
    for round in 0..50 {
        let config = PrimePoolConfig::new(1)
            .with_queue_capacity(1)
            .with_poll_interval(Duration::from_millis(5));
        let pool = Arc::new(PrimePool::with_config(config).expect("Failed to create pool"));
        pool.start().expect("Failed to start pool");

        let submitters: Vec<_> = (0..6)
            .map(|t| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    (0..10)
                        .map(|i| JobId::new(format!("{}-{}-{}", round, t, i)))
                        .filter(|id| pool.submit(id.clone(), 1, 20_000).is_ok())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(2));
        pool.shutdown().expect("Failed to shutdown pool");

        for submitter in submitters {
            for id in submitter.join().expect("Thread panicked") {
                // Accepted jobs either ran to completion or were never kept
                assert_ne!(
                    pool.store().get(&id),
                    Some(JobOutcome::Processing),
                    "job {} accepted but left pending after shutdown",
                    id
                );
            }
        }
        assert!(pool.fetch_all().values().all(|outcome| !outcome.is_processing()));
    }
}

#[test]
fn test_panicking_job_removes_entry() {
    let config = PrimePoolConfig::new(1);
    let pool = PrimePool::with_computer(config, Arc::new(PanicOnThirteen))
        .expect("Failed to create pool");
    pool.start().expect("Failed to start pool");

    pool.submit("boom", 13, 20).expect("Failed to submit job");
    pool.submit("after", 1, 5).expect("Failed to submit job");

    assert_eq!(wait_for(&pool, "after"), FetchOutcome::Completed("[2,3,5]".to_string()));
    assert_eq!(wait_for(&pool, "boom"), FetchOutcome::NotFound);
    assert_eq!(pool.total_jobs_panicked(), 1);
    assert!(pool.is_running());

    pool.shutdown().expect("Failed to shutdown pool");
}

#[test]
fn test_duplicate_id_rejected_until_consumed() {
    let (pool, _computer, open, started) = gated_pool(1, 2);

    pool.submit("dup", 1, 10).expect("Failed to submit job");
    started.recv_timeout(Duration::from_secs(5)).expect("job never started");

    let err = pool.submit("dup", 1, 20).unwrap_err();
    assert!(matches!(err, PrimeError::DuplicateJobId { ref id } if id == "dup"));
    assert_eq!(pool.total_jobs_submitted(), 1);

    open.send(()).unwrap();
    assert_eq!(wait_for(&pool, "dup"), FetchOutcome::Completed("[2,3,5,7]".to_string()));

    // Consumed ids are free again
    pool.submit("dup", 1, 3).expect("Failed to resubmit job");
    open.send(()).unwrap();
    assert_eq!(wait_for(&pool, "dup"), FetchOutcome::Completed("[2,3]".to_string()));

    pool.shutdown().expect("Failed to shutdown pool");
}

#[test]
fn test_submit_requires_running_pool() {
    let pool = PrimePool::with_workers(1).expect("Failed to create pool");
    assert!(matches!(pool.submit("a", 1, 10), Err(PrimeError::NotRunning { .. })));
    assert!(matches!(pool.submit_new(1, 10), Err(PrimeError::NotRunning { .. })));
    assert!(pool.fetch_all().is_empty());
}

#[test]
fn test_many_producers_each_result_consumed_once() {
    let pool = Arc::new(PrimePool::with_workers(4).expect("Failed to create pool"));
    pool.start().expect("Failed to start pool");

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                (0..20)
                    .map(|i| pool.submit_new(1, 100 + i).expect("Failed to submit job"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let ids: Vec<JobId> = producers
        .into_iter()
        .flat_map(|p| p.join().expect("Thread panicked"))
        .collect();
    assert_eq!(ids.len(), 80);

    let consumed = Arc::new(AtomicUsize::new(0));
    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let ids = ids.clone();
            let consumed = Arc::clone(&consumed);
            thread::spawn(move || {
                let deadline = Instant::now() + Duration::from_secs(10);
                while !pool.store().is_empty() && Instant::now() < deadline {
                    for id in &ids {
                        if let FetchOutcome::Completed(_) = pool.fetch_one(id) {
                            consumed.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                    thread::sleep(Duration::from_millis(1));
                }
            })
        })
        .collect();
    for consumer in consumers {
        consumer.join().expect("Thread panicked");
    }

    assert_eq!(consumed.load(Ordering::SeqCst), 80);
    assert_eq!(pool.total_jobs_submitted(), 80);

    pool.shutdown().expect("Failed to shutdown pool");
}
