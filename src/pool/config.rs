//! Configuration for the dynamic thread pool.

use crate::core::{Result, ThreadError};
use std::time::Duration;

/// Default time between two manager checks.
pub const DEFAULT_MANAGER_INTERVAL: Duration = Duration::from_secs(3);

/// Default number of workers spawned or retired per manager check.
pub const DEFAULT_RESIZE_STEP: usize = 2;

/// Configuration for a [`ThreadPool`](crate::ThreadPool).
///
/// # Example
///
/// ```rust
/// use dynamic_thread_pool::ThreadPoolConfig;
/// use std::time::Duration;
///
/// let config = ThreadPoolConfig::new(2, 8, 64)
///     .with_thread_name_prefix("ingest")
///     .with_manager_interval(Duration::from_millis(500))
///     .with_resize_step(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct ThreadPoolConfig {
    /// Workers kept alive even when idle.
    pub min_workers: usize,
    /// Upper bound on live workers.
    pub max_workers: usize,
    /// Number of pending jobs the queue holds before producers block.
    pub queue_capacity: usize,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Sleep between two manager checks.
    pub manager_interval: Duration,
    /// Workers spawned or retired per manager check.
    pub resize_step: usize,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            min_workers: 1,
            max_workers: num_cpus::get().max(1),
            queue_capacity: 1024,
            thread_name_prefix: "worker".to_string(),
            manager_interval: DEFAULT_MANAGER_INTERVAL,
            resize_step: DEFAULT_RESIZE_STEP,
        }
    }
}

impl ThreadPoolConfig {
    /// Create a configuration with the given worker bounds and queue capacity
    #[must_use]
    pub fn new(min_workers: usize, max_workers: usize, queue_capacity: usize) -> Self {
        Self {
            min_workers,
            max_workers,
            queue_capacity,
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set how long the manager sleeps between load checks.
    ///
    /// Shorter intervals make the pool react faster to bursts and idle
    /// periods at the cost of more frequent lock acquisitions.
    ///
    /// # Panics
    ///
    /// Panics if interval is zero.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_manager_interval(mut self, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "manager interval must be non-zero");
        self.manager_interval = interval;
        self
    }

    /// Set how many workers a single manager check may spawn or retire.
    ///
    /// # Panics
    ///
    /// Panics if step is zero.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_resize_step(mut self, step: usize) -> Self {
        assert!(step > 0, "resize step must be non-zero");
        self.resize_step = step;
        self
    }

    /// Validate configuration
    ///
    /// Degenerate bounds are rejected rather than silently adjusted.
    pub fn validate(&self) -> Result<()> {
        if self.min_workers == 0 {
            return Err(ThreadError::invalid_config(
                "min_workers",
                "Minimum worker count must be greater than 0",
            ));
        }
        if self.max_workers < self.min_workers {
            return Err(ThreadError::invalid_config(
                "max_workers",
                format!(
                    "Maximum worker count ({}) is below the minimum ({})",
                    self.max_workers, self.min_workers
                ),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ThreadError::invalid_config(
                "queue_capacity",
                "Queue capacity must be greater than 0",
            ));
        }
        if self.manager_interval.is_zero() {
            return Err(ThreadError::invalid_config(
                "manager_interval",
                "Manager interval must be non-zero",
            ));
        }
        if self.resize_step == 0 {
            return Err(ThreadError::invalid_config(
                "resize_step",
                "Resize step must be greater than 0",
            ));
        }
        Ok(())
    }
}
