//! Prime jobs example
//!
//! Submits a batch of ranges, polls for results with the consuming fetch and
//! shows how invalid ranges and backpressure behave.
//!
//! Run with: RUST_LOG=debug cargo run --example prime_jobs

use prime_pool::prelude::*;
use std::thread;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Prime Pool - Prime Jobs Example ===\n");

    let config = PrimePoolConfig::new(3)
        .with_queue_capacity(2)
        .with_thread_name_prefix("prime");
    let pool = PrimePool::with_config(config)?;

    println!("1. Configuration:");
    println!("   Workers: {}", pool.num_workers());
    println!("   Queue capacity: {}", pool.queue_capacity());

    pool.start()?;

    println!("\n2. Submitting jobs:");
    let jobs = [
        ("tiny", 1, 10),
        ("teens", 10, 20),
        ("big", 1, 2_000_000),
        ("reversed", 5, 1),
        ("too-small", 1, 1),
    ];
    let submit_started = Instant::now();
    for (id, start, end) in jobs {
        pool.submit(id, start, end)?;
        println!("   {:<10} [{}, {}] submitted", id, start, end);
    }
    let generated = pool.submit_new(100, 200)?;
    println!("   {:<10} [100, 200] submitted", generated);
    println!(
        "   All submitted in {:?} ({} blocked sends)",
        submit_started.elapsed(),
        pool.backpressure().blocked_sends
    );

    println!("\n3. Snapshot while running:");
    for (id, outcome) in pool.fetch_all() {
        let shown = match outcome.as_completed() {
            Some(primes) if primes.len() > 40 => format!("{}...", &primes[..40]),
            _ => outcome.to_string(),
        };
        println!("   {:<36} {}", id, shown);
    }

    println!("\n4. Collecting results:");
    let mut pending: Vec<JobId> = jobs.iter().map(|(id, _, _)| JobId::new(*id)).collect();
    pending.push(generated);
    while !pending.is_empty() {
        pending.retain(|id| match pool.fetch_one(id) {
            FetchOutcome::Completed(primes) => {
                let count = serde_json::from_str::<Vec<u64>>(&primes)
                    .map(|p| p.len())
                    .unwrap_or(0);
                println!("   {:<36} {} primes", id, count);
                false
            }
            FetchOutcome::NotFound => {
                println!("   {:<36} not found (invalid range)", id);
                false
            }
            FetchOutcome::Processing => true,
        });
        thread::sleep(Duration::from_millis(10));
    }

    println!("\n5. Fetching a consumed result again:");
    println!("   tiny -> {:?}", pool.fetch_one(&JobId::new("tiny")));

    println!("\n6. Worker statistics:");
    for (i, stats) in pool.get_stats().iter().enumerate() {
        println!(
            "   Worker {}: {} completed, {} failed, avg {:.1}us",
            i,
            stats.get_jobs_completed(),
            stats.get_jobs_failed(),
            stats.get_average_processing_time_us()
        );
    }

    pool.shutdown()?;
    println!("\n=== Example completed successfully ===");
    Ok(())
}
