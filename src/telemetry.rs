//! Tracing integration for observability.
//!
//! When the `tracing` feature is enabled, workers and the manager run inside
//! `tracing` spans and the pool emits the metric events below. Log output
//! through the `log` facade is available regardless of the feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynamic_thread_pool::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("dynamic_thread_pool=trace".parse().unwrap()))
//!     .init();
//!
//! let pool = ThreadPool::new(2, 8, 64)?;
//! ```

/// Metrics recording functions for observability.
///
/// These functions emit tracing events that can be consumed by
/// metrics collection systems like Prometheus via tracing-opentelemetry.
pub mod metrics {
    use crate::pool::PoolStats;
    use std::time::Duration;

    /// Records a job entering the queue.
    #[inline]
    pub fn record_submission(queue_depth: usize) {
        tracing::trace!(
            counter.jobs_submitted = 1,
            gauge.queue_depth = queue_depth as i64,
            "job submitted"
        );
    }

    /// Records job completion with timing.
    #[inline]
    pub fn record_completion(duration: Duration, success: bool) {
        let duration_ms = duration.as_millis() as u64;
        if success {
            tracing::trace!(
                counter.jobs_completed = 1,
                histogram.job_duration_ms = duration_ms,
                "job completed successfully"
            );
        } else {
            tracing::trace!(
                counter.jobs_failed = 1,
                histogram.job_duration_ms = duration_ms,
                "job failed"
            );
        }
    }

    /// Records a job panic event.
    #[inline]
    pub fn record_panic(duration: Duration) {
        tracing::trace!(
            counter.jobs_panicked = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job panicked"
        );
    }

    /// Records a manager resize; `delta` is negative for retirement requests.
    #[inline]
    pub fn record_resize(delta: i64, live_workers: usize) {
        tracing::debug!(
            gauge.workers_live = live_workers as i64,
            delta = delta,
            "worker set resized"
        );
    }

    /// Records pool startup.
    #[inline]
    pub fn record_pool_start(min_workers: usize, max_workers: usize, queue_capacity: usize) {
        tracing::info!(
            min_workers = min_workers,
            max_workers = max_workers,
            queue_capacity = queue_capacity,
            "thread pool started"
        );
    }

    /// Records pool shutdown.
    #[inline]
    pub fn record_pool_shutdown(stats: &PoolStats) {
        tracing::info!(
            jobs_completed = stats.tasks_completed,
            jobs_failed = stats.tasks_failed,
            jobs_panicked = stats.tasks_panicked,
            jobs_discarded = stats.tasks_discarded,
            workers_spawned = stats.workers_spawned,
            workers_retired = stats.workers_retired,
            "thread pool shutdown complete"
        );
    }
}
