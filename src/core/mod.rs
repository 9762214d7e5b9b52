//! Core types for the prime pool: jobs, errors and the prime computation

pub mod error;
pub mod job;
pub mod sieve;

pub use error::{PrimeError, Result};
pub use job::{Job, JobId};
pub use sieve::{
    compute_job, serialize_primes, sieve_of_atkin, validate_range, AtkinSieve, PrimeComputer,
};
