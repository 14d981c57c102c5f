//! Pool-wide counters and statistics snapshots.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative counters shared by the pool, its workers and its manager.
#[derive(Debug, Default)]
pub struct PoolCounters {
    /// Jobs accepted into the queue
    pub submitted: AtomicU64,
    /// Submissions ignored because the pool was shutting down
    pub dropped: AtomicU64,
    /// Jobs that returned `Ok`
    pub completed: AtomicU64,
    /// Jobs that returned an error
    pub failed: AtomicU64,
    /// Jobs that panicked
    pub panicked: AtomicU64,
    /// Jobs still queued when the pool shut down
    pub discarded: AtomicU64,
    /// Worker threads started, including the initial ones
    pub workers_spawned: AtomicU64,
    /// Worker threads retired by the manager
    pub workers_retired: AtomicU64,
    /// Total time spent running jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl PoolCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    /// Get average processing time per finished job in microseconds
    pub fn average_processing_time_us(&self) -> f64 {
        let total = Self::get(&self.total_processing_time_us);
        let count = Self::get(&self.completed) + Self::get(&self.failed) + Self::get(&self.panicked);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// Point-in-time view of a pool.
///
/// Gauges (`live_workers`, `busy_workers`, `queued_tasks`) are sampled
/// independently and may be mutually inconsistent by the time they are read.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PoolStats {
    /// Configured minimum worker count
    pub min_workers: usize,
    /// Configured maximum worker count
    pub max_workers: usize,
    /// Configured queue capacity
    pub queue_capacity: usize,
    /// Workers currently registered
    pub live_workers: usize,
    /// Workers currently running a job
    pub busy_workers: usize,
    /// Jobs waiting in the queue
    pub queued_tasks: usize,
    /// Jobs accepted into the queue
    pub tasks_submitted: u64,
    /// Submissions ignored because the pool was shutting down
    pub tasks_dropped: u64,
    /// Jobs that returned `Ok`
    pub tasks_completed: u64,
    /// Jobs that returned an error
    pub tasks_failed: u64,
    /// Jobs that panicked
    pub tasks_panicked: u64,
    /// Jobs discarded from the queue at shutdown
    pub tasks_discarded: u64,
    /// Worker threads started
    pub workers_spawned: u64,
    /// Worker threads retired by the manager
    pub workers_retired: u64,
    /// Average job run time in microseconds
    pub average_processing_time_us: f64,
}

impl PoolStats {
    /// Jobs that have left the queue and finished, whatever the outcome
    pub fn tasks_finished(&self) -> u64 {
        self.tasks_completed + self.tasks_failed + self.tasks_panicked
    }
}
