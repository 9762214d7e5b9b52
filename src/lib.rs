//! # Prime Pool
//!
//! A background job system that finds the primes in integer ranges on a
//! fixed pool of worker threads.
//!
//! ## Features
//!
//! - **Bounded Job Queue**: Submitters block while the queue is full
//! - **Idle Worker Dispatch**: Each job goes to a worker that has announced itself idle
//! - **Result Store**: Thread-safe results with an exactly-once consuming fetch
//! - **Sieve of Atkin**: Default prime computation, swappable via [`PrimeComputer`]
//! - **Panic Isolation**: A panicking computation removes its entry and the worker keeps running
//! - **Graceful Shutdown**: Queued jobs are finished before worker threads are joined
//!
//! ## Quick Start
//!
//! ```rust
//! use prime_pool::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let pool = PrimePool::with_workers(4)?;
//! pool.start()?;
//!
//! pool.submit("small", 1, 10)?;
//! let id = pool.submit_new(1, 100)?;
//!
//! // Poll until the result is ready; a completed result is handed out once
//! loop {
//!     match pool.fetch_one(&id) {
//!         FetchOutcome::Completed(primes) => {
//!             assert!(primes.starts_with("[2,3,5,7,"));
//!             break;
//!         }
//!         FetchOutcome::Processing => std::thread::sleep(Duration::from_millis(5)),
//!         FetchOutcome::NotFound => unreachable!("valid range"),
//!     }
//! }
//!
//! pool.shutdown()?;
//! // Results stored before shutdown stay readable
//! assert_eq!(
//!     pool.fetch_all().get(&JobId::new("small")),
//!     Some(&JobOutcome::Completed("[2,3,5,7]".to_string()))
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Pool Configuration
//!
//! ```rust
//! use prime_pool::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let config = PrimePoolConfig::new(8)
//!     .with_queue_capacity(32)
//!     .with_thread_name_prefix("sieve")
//!     .with_poll_interval(Duration::from_millis(20));
//!
//! let pool = PrimePool::with_config(config)?;
//! pool.start()?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Computation
//!
//! ```rust
//! use prime_pool::prelude::*;
//! use std::sync::Arc;
//!
//! struct TrialDivision;
//!
//! impl PrimeComputer for TrialDivision {
//!     fn primes_in_range(&self, start: i64, end: i64) -> Result<Vec<u64>> {
//!         let (start, end) = prime_pool::core::validate_range(start, end)?;
//!         Ok((start.max(2)..=end)
//!             .filter(|n| (2..*n).take_while(|d| d * d <= *n).all(|d| n % d != 0))
//!             .collect())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "TrialDivision"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let pool = PrimePool::with_computer(PrimePoolConfig::new(2), Arc::new(TrialDivision))?;
//! pool.start()?;
//! pool.submit("t", 10, 20)?;
//! # pool.shutdown()?;
//! # assert_eq!(pool.fetch_one(&JobId::new("t")), FetchOutcome::Completed("[11,13,17,19]".to_string()));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;
pub mod store;
#[cfg(feature = "tracing")]
pub mod tracing;

pub use core::{AtkinSieve, Job, JobId, PrimeComputer, PrimeError, Result};
pub use pool::{PrimePool, PrimePoolConfig, WorkerStats};
pub use store::{FetchOutcome, JobOutcome, ResultStore};
