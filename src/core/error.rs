//! Error types for the prime pool

/// Result type for prime pool operations
pub type Result<T> = std::result::Result<T, PrimeError>;

/// Errors that can occur while computing primes or running the pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PrimeError {
    /// The range end lies below its start
    #[error("Invalid range: end {end} cannot be less than start {start}")]
    InvalidRange {
        /// Requested start of the range
        start: i64,
        /// Requested end of the range
        end: i64,
    },

    /// The range end is too small to contain a prime
    #[error("Range too small: end {end} cannot be less than 2")]
    RangeTooSmall {
        /// Requested end of the range
        end: i64,
    },

    /// Prime extraction or serialization failed
    #[error("Prime computation failed: {message}")]
    ComputationFailure {
        /// Error message
        message: String,
    },

    /// A live result entry already exists for this id
    #[error("Job id '{id}' already has a live result entry")]
    DuplicateJobId {
        /// The conflicting job id
        id: String,
    },

    /// Pool is already running with details
    #[error("Prime pool '{pool_name}' is already running with {worker_count} workers")]
    AlreadyRunning {
        /// Name of the pool
        pool_name: String,
        /// Number of worker threads
        worker_count: usize,
    },

    /// Pool is not running
    #[error("Prime pool '{pool_name}' is not running")]
    NotRunning {
        /// Name of the pool
        pool_name: String,
    },

    /// Pool is shutting down and refuses new jobs
    #[error("Prime pool is shutting down ({pending_jobs} jobs pending)")]
    ShuttingDown {
        /// Number of jobs still queued
        pending_jobs: usize,
    },

    /// Failed to spawn a pool thread
    #[error("Failed to spawn thread '{thread_name}': {message}")]
    SpawnError {
        /// Name of the thread that failed to spawn
        thread_name: String,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a pool thread
    #[error("Failed to join thread '{thread_name}': {message}")]
    JoinError {
        /// Name of the thread that failed to join
        thread_name: String,
        /// Error message
        message: String,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },
}

impl PrimeError {
    /// Create an invalid range error
    pub fn invalid_range(start: i64, end: i64) -> Self {
        PrimeError::InvalidRange { start, end }
    }

    /// Create a range too small error
    pub fn range_too_small(end: i64) -> Self {
        PrimeError::RangeTooSmall { end }
    }

    /// Create a computation failure
    pub fn computation(message: impl Into<String>) -> Self {
        PrimeError::ComputationFailure {
            message: message.into(),
        }
    }

    /// Create a duplicate job id error
    pub fn duplicate_job_id(id: impl Into<String>) -> Self {
        PrimeError::DuplicateJobId { id: id.into() }
    }

    /// Create an already running error
    pub fn already_running(pool_name: impl Into<String>, worker_count: usize) -> Self {
        PrimeError::AlreadyRunning {
            pool_name: pool_name.into(),
            worker_count,
        }
    }

    /// Create a not running error
    pub fn not_running(pool_name: impl Into<String>) -> Self {
        PrimeError::NotRunning {
            pool_name: pool_name.into(),
        }
    }

    /// Create a shutting down error
    pub fn shutting_down(pending_jobs: usize) -> Self {
        PrimeError::ShuttingDown { pending_jobs }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_name: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PrimeError::SpawnError {
            thread_name: thread_name.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_name: impl Into<String>, message: impl Into<String>) -> Self {
        PrimeError::JoinError {
            thread_name: thread_name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PrimeError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for errors produced by validating or computing a job,
    /// as opposed to pool lifecycle errors.
    pub fn is_job_failure(&self) -> bool {
        matches!(
            self,
            PrimeError::InvalidRange { .. }
                | PrimeError::RangeTooSmall { .. }
                | PrimeError::ComputationFailure { .. }
        )
    }
}

impl From<serde_json::Error> for PrimeError {
    fn from(err: serde_json::Error) -> Self {
        PrimeError::computation(format!("serialization failed: {}", err))
    }
}
