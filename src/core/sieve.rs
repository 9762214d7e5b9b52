//! Prime computation for a numeric range using the Sieve of Atkin

use crate::core::error::{PrimeError, Result};
use crate::core::job::Job;

/// Computes the primes contained in a numeric range.
///
/// Implementations must be pure with respect to shared state: workers call
/// them concurrently and only the returned value is recorded.
pub trait PrimeComputer: Send + Sync {
    /// Return every prime in `[start, end]` in ascending order.
    ///
    /// # Errors
    ///
    /// - [`PrimeError::InvalidRange`] or [`PrimeError::RangeTooSmall`] when
    ///   [`validate_range`] rejects the range
    /// - [`PrimeError::ComputationFailure`] if the primes cannot be extracted
    fn primes_in_range(&self, start: i64, end: i64) -> Result<Vec<u64>>;

    /// Name used in logs
    fn name(&self) -> &str {
        "PrimeComputer"
    }
}

/// The default computer, backed by [`sieve_of_atkin`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AtkinSieve;

impl PrimeComputer for AtkinSieve {
    fn primes_in_range(&self, start: i64, end: i64) -> Result<Vec<u64>> {
        sieve_of_atkin(start, end)
    }

    fn name(&self) -> &str {
        "AtkinSieve"
    }
}

/// Check a requested range and clamp its start to 1.
///
/// A range counts as inverted only when its start lies above the clamp
/// floor: `(5, 1)` is `InvalidRange`, while `(1, 0)` and `(-3, -7)` end at
/// or below 1 and are `RangeTooSmall`.
pub fn validate_range(start: i64, end: i64) -> Result<(u64, u64)> {
    if end < start && start > 1 {
        return Err(PrimeError::invalid_range(start, end));
    }
    if end <= 1 {
        return Err(PrimeError::range_too_small(end));
    }
    Ok((start.max(1) as u64, end as u64))
}

/// Find every prime in `[start, end]` with the Sieve of Atkin.
///
/// A number is a candidate when it is hit an odd number of times by the
/// quadratic forms `4x²+y²`, `3x²+y²` and `3x²−y²` in their residue classes
/// modulo 12. Candidates divisible by a square are then cleared.
///
/// # Example
///
/// ```rust
/// use prime_pool::core::sieve_of_atkin;
///
/// assert_eq!(sieve_of_atkin(1, 10).unwrap(), vec![2, 3, 5, 7]);
/// assert_eq!(sieve_of_atkin(-4, 2).unwrap(), vec![2]);
/// assert!(sieve_of_atkin(5, 1).is_err());
/// ```
pub fn sieve_of_atkin(start: i64, end: i64) -> Result<Vec<u64>> {
    let (start, end) = validate_range(start, end)?;

    if end == 2 {
        return Ok(vec![2]);
    }

    let mut is_prime = allocate_sieve(end)?;
    let root = integer_sqrt(end);

    for x in 1..=root {
        let xx = x * x;
        for y in 1..=root {
            let yy = y * y;

            let n = 4 * xx + yy;
            if n <= end && (n % 12 == 1 || n % 12 == 5) {
                is_prime[n as usize] ^= true;
            }

            let n = 3 * xx + yy;
            if n <= end && n % 12 == 7 {
                is_prime[n as usize] ^= true;
            }

            if x > y {
                let n = 3 * xx - yy;
                if n <= end && n % 12 == 11 {
                    is_prime[n as usize] ^= true;
                }
            }
        }
    }

    // Clear squareful composites; the end itself is included.
    for n in 5..=root {
        if is_prime[n as usize] {
            let square = n * n;
            for multiple in (square..=end).step_by(square as usize) {
                is_prime[multiple as usize] = false;
            }
        }
    }

    is_prime[2] = true;
    is_prime[3] = true;

    Ok((start..=end).filter(|&x| is_prime[x as usize]).collect())
}

/// Serialize a prime list the way it is stored for callers: a JSON array.
pub fn serialize_primes(primes: &[u64]) -> Result<String> {
    Ok(serde_json::to_string(primes)?)
}

/// Run a computer on a job and serialize the outcome.
pub fn compute_job(computer: &dyn PrimeComputer, job: &Job) -> Result<String> {
    let primes = computer.primes_in_range(job.start(), job.end())?;
    serialize_primes(&primes)
}

fn allocate_sieve(end: u64) -> Result<Vec<bool>> {
    let len = usize::try_from(end)
        .ok()
        .and_then(|limit| limit.checked_add(1))
        .ok_or_else(|| {
            PrimeError::computation(format!("range end {} exceeds addressable memory", end))
        })?;

    let mut sieve = Vec::new();
    sieve.try_reserve_exact(len).map_err(|e| {
        PrimeError::computation(format!("cannot allocate sieve of {} entries: {}", len, e))
    })?;
    sieve.resize(len, false);
    Ok(sieve)
}

fn integer_sqrt(n: u64) -> u64 {
    let mut root = (n as f64).sqrt() as u64;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}
