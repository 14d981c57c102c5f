//! # Dynamic Thread Pool
//!
//! An elastic thread pool: producers push jobs into a bounded FIFO queue, a
//! set of worker threads runs them, and a manager thread resizes that set
//! between a minimum and a maximum according to load.
//!
//! ## Features
//!
//! - **Bounded Queue**: Fixed-capacity ring buffer; producers block while it is full
//! - **Elastic Workers**: The manager adds workers when jobs back up and retires idle ones
//! - **Thread Safety**: Built on parking_lot and crossbeam
//! - **Clean Shutdown**: Every worker and the manager are joined before the pool goes away
//! - **Statistics**: Live, busy and queued gauges plus cumulative job counters
//!
//! ## Quick Start
//!
//! ```rust
//! use dynamic_thread_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! // At least 2 workers, at most 6, up to 10 pending jobs
//! let pool = ThreadPool::new(2, 6, 10)?;
//!
//! for i in 0..10 {
//!     pool.execute(move || {
//!         println!("Job {} executing", i);
//!         Ok(())
//!     });
//! }
//!
//! // Run everything that was queued, then stop
//! pool.shutdown_graceful()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use dynamic_thread_pool::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let config = ThreadPoolConfig::new(3, 10, 100)
//!     .with_thread_name_prefix("my-worker")
//!     .with_manager_interval(Duration::from_millis(500))
//!     .with_resize_step(2);
//!
//! let pool = ThreadPool::with_config(config)?;
//! assert_eq!(pool.live_workers(), 3);
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Jobs
//!
//! ```rust
//! use dynamic_thread_pool::prelude::*;
//!
//! struct MyJob {
//!     data: String,
//! }
//!
//! impl Job for MyJob {
//!     fn execute(&mut self) -> Result<()> {
//!         println!("Processing: {}", self.data);
//!         Ok(())
//!     }
//!
//!     fn job_type(&self) -> &str {
//!         "MyJob"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! # let pool = ThreadPool::new(1, 2, 4)?;
//! pool.submit(MyJob {
//!     data: "test".to_string(),
//! });
//! # pool.shutdown_graceful()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Statistics
//!
//! ```rust
//! use dynamic_thread_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! # let pool = ThreadPool::new(2, 4, 16)?;
//! # for _ in 0..10 {
//! #     pool.execute(|| Ok(()));
//! # }
//! # pool.shutdown_graceful()?;
//! let stats = pool.stats();
//! println!(
//!     "{} live, {} busy, {} completed",
//!     stats.live_workers, stats.busy_workers, stats.tasks_completed
//! );
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;
#[cfg(feature = "tracing")]
pub mod telemetry;

pub use core::{ArgJob, BoxedJob, ClosureJob, Job, Result, ThreadError};
pub use pool::{PoolStats, ThreadPool, ThreadPoolConfig};
