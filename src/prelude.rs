//! Convenient re-exports for common types and traits

pub use crate::core::{AtkinSieve, Job, JobId, PrimeComputer, PrimeError, Result};
pub use crate::pool::{PrimePool, PrimePoolConfig, WorkerStats};
pub use crate::store::{FetchOutcome, JobOutcome, ResultStore};
