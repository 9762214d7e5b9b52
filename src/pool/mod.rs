//! Prime pool, dispatcher and worker implementations

pub mod dispatcher;
pub mod prime_pool;
pub mod worker;

pub use dispatcher::{Dispatcher, IdleRegistry, WorkerSlot};
pub use prime_pool::{PrimePool, PrimePoolConfig};
pub use worker::{Worker, WorkerStats};
