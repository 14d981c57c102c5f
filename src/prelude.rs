//! Convenient re-exports for common types and traits

pub use crate::core::{ArgJob, BoxedJob, ClosureJob, Job, Result, ThreadError};
pub use crate::pool::{PoolStats, ThreadPool, ThreadPoolConfig};
