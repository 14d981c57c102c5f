//! Thread pool, worker and manager implementations

pub mod config;
pub mod manager;
pub(crate) mod shared;
pub mod stats;
pub mod thread_pool;
pub(crate) mod worker;

pub use config::ThreadPoolConfig;
pub use manager::{LoadSnapshot, Resize};
pub use stats::{PoolCounters, PoolStats};
pub use thread_pool::ThreadPool;
