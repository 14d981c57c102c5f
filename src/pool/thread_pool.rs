//! Thread pool implementation

use crate::core::{ArgJob, ClosureJob, Job, Result, ThreadError};
use crate::pool::config::ThreadPoolConfig;
use crate::pool::manager::Manager;
use crate::pool::shared::Shared;
use crate::pool::stats::{PoolCounters, PoolStats};
use crate::pool::worker::Worker;
use log::{error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

/// An elastic pool of worker threads fed by a bounded queue.
///
/// The pool starts `min_workers` workers and a manager thread. The manager
/// periodically adds workers while jobs pile up in the queue, up to
/// `max_workers`, and retires idle ones down to `min_workers` again.
///
/// # Backpressure
///
/// Submitting to a full queue blocks the caller until a worker frees a slot
/// or the pool shuts down.
///
/// # Shutdown
///
/// [`shutdown`](Self::shutdown) stops the manager, lets every running job
/// finish, joins every worker and discards jobs that were still queued.
/// [`shutdown_graceful`](Self::shutdown_graceful) runs the queue dry first.
/// Submissions made while the pool is shutting down are silently ignored.
pub struct ThreadPool {
    shared: Arc<Shared>,
    manager: Mutex<Option<Manager>>,
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("config", &self.shared.config)
            .field("live_workers", &self.live_workers())
            .field("busy_workers", &self.busy_workers())
            .field("queued_tasks", &self.queued_tasks())
            .finish()
    }
}

impl ThreadPool {
    /// Create a pool with `min..=max` workers and room for `queue_capacity`
    /// pending jobs
    ///
    /// # Errors
    ///
    /// Fails with `ThreadError::InvalidConfig` for degenerate bounds and
    /// `ThreadError::SpawnError` when a thread cannot be started. Anything
    /// started before the failure is shut down again.
    pub fn new(min_workers: usize, max_workers: usize, queue_capacity: usize) -> Result<Self> {
        Self::with_config(ThreadPoolConfig::new(
            min_workers,
            max_workers,
            queue_capacity,
        ))
    }

    /// Create a thread pool with custom configuration
    pub fn with_config(config: ThreadPoolConfig) -> Result<Self> {
        config.validate()?;

        let pool = Self {
            shared: Arc::new(Shared::new(config)?),
            manager: Mutex::new(None),
        };

        if let Err(e) = pool.start() {
            error!(
                "Failed to start pool '{}': {}",
                pool.shared.config.thread_name_prefix, e
            );
            let _ = pool.shutdown();
            return Err(e);
        }

        let config = &pool.shared.config;
        info!(
            "pool '{}' started: {} workers (max {}), queue capacity {}",
            config.thread_name_prefix, config.min_workers, config.max_workers, config.queue_capacity
        );
        #[cfg(feature = "tracing")]
        crate::telemetry::metrics::record_pool_start(
            config.min_workers,
            config.max_workers,
            config.queue_capacity,
        );

        Ok(pool)
    }

    fn start(&self) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            for _ in 0..self.shared.config.min_workers {
                self.shared.spawn_worker(&mut state)?;
            }
        }

        let manager = Manager::spawn(Arc::clone(&self.shared))?;
        *self.manager.lock() = Some(manager);
        Ok(())
    }

    /// Submit a job to the pool
    ///
    /// Blocks while the queue is full. If the pool is shutting down the job
    /// is not queued and is handed back instead; callers that do not care
    /// can ignore the return value.
    pub fn submit<J: Job + 'static>(&self, job: J) -> Option<J> {
        self.shared.enqueue(job)
    }

    /// Submit a closure as a job
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let _ = self.submit(ClosureJob::new(f));
    }

    /// Submit a function together with the argument it consumes
    ///
    /// The pool owns `arg` once the job is queued and drops it right after
    /// `f` returns. If the pool is shutting down, `arg` is handed back.
    ///
    /// # Example
    ///
    /// ```
    /// use dynamic_thread_pool::prelude::*;
    ///
    /// # fn main() -> Result<()> {
    /// let pool = ThreadPool::new(1, 2, 8)?;
    /// pool.execute_with(|n: u32| println!("number = {}", n), 100);
    /// pool.shutdown_graceful()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn execute_with<F, A>(&self, f: F, arg: A) -> Option<A>
    where
        F: FnOnce(A) + Send + 'static,
        A: Send + 'static,
    {
        self.submit(ArgJob::new(f, arg)).and_then(ArgJob::into_arg)
    }

    /// Number of workers currently running a job
    pub fn busy_workers(&self) -> usize {
        self.shared.busy_workers()
    }

    /// Number of registered workers, idle or busy
    pub fn live_workers(&self) -> usize {
        self.shared.live_workers()
    }

    /// Number of jobs waiting in the queue
    pub fn queued_tasks(&self) -> usize {
        self.shared.queued_tasks()
    }

    /// The configuration the pool was built with
    pub fn config(&self) -> &ThreadPoolConfig {
        &self.shared.config
    }

    /// Check if the pool still accepts jobs
    pub fn is_running(&self) -> bool {
        !self.shared.is_shutting_down()
    }

    /// Snapshot of the pool gauges and counters
    pub fn stats(&self) -> PoolStats {
        self.shared.stats()
    }

    /// Shut the pool down and wait for every thread to exit
    ///
    /// 1. Marks the pool as shutting down and wakes blocked producers and
    ///    idle workers
    /// 2. Stops and joins the manager
    /// 3. Discards jobs still in the queue
    /// 4. Joins every worker; jobs already running finish first
    ///
    /// # Errors
    ///
    /// Returns `ThreadError::NotRunning` if the pool was already shut down,
    /// or the first join error encountered.
    pub fn shutdown(&self) -> Result<()> {
        if !self.shared.begin_shutdown() {
            return Err(ThreadError::not_running(
                &self.shared.config.thread_name_prefix,
            ));
        }
        self.finish_shutdown()
    }

    /// Stop accepting jobs, wait for the queue to drain and for running jobs
    /// to finish, then shut down
    ///
    /// Producers blocked on a full queue get their jobs back unqueued.
    ///
    /// # Errors
    ///
    /// Returns `ThreadError::NotRunning` if shutdown has already begun. That
    /// includes a [`shutdown`](Self::shutdown) issued from another thread
    /// while this call waits for the queue to drain; the pool is then shut
    /// down by that call, with whatever was still queued discarded.
    pub fn shutdown_graceful(&self) -> Result<()> {
        if self.shared.is_shutting_down() {
            return Err(ThreadError::not_running(
                &self.shared.config.thread_name_prefix,
            ));
        }
        self.shared.drain();
        self.shutdown()
    }

    fn finish_shutdown(&self) -> Result<()> {
        let mut first_error = None;

        if let Some(manager) = self.manager.lock().take() {
            if let Err(e) = manager.stop_and_join() {
                first_error.get_or_insert(e);
            }
        }

        // The manager is gone, so nothing adds workers past this point.
        // Workers stay registered until joined so that `busy <= live` holds
        // while running jobs finish.
        let (workers, discarded) = {
            let mut state = self.shared.state.lock();
            let mut workers: Vec<Worker> = state.workers.values_mut().map(Worker::detach).collect();
            workers.append(&mut state.retired);
            (workers, state.queue.drain())
        };

        let discarded_count = discarded.len();
        if discarded_count > 0 {
            warn!(
                "pool '{}' discarded {} queued jobs at shutdown",
                self.shared.config.thread_name_prefix, discarded_count
            );
        }
        PoolCounters::add(&self.shared.counters.discarded, discarded_count as u64);
        drop(discarded);

        for worker in workers {
            if let Err(e) = worker.join() {
                first_error.get_or_insert(e);
            }
        }
        self.shared.state.lock().workers.clear();

        let stats = self.stats();
        info!(
            "pool '{}' shut down: {} completed, {} failed, {} panicked, {} discarded",
            self.shared.config.thread_name_prefix,
            stats.tasks_completed,
            stats.tasks_failed,
            stats.tasks_panicked,
            stats.tasks_discarded
        );
        #[cfg(feature = "tracing")]
        crate::telemetry::metrics::record_pool_shutdown(&stats);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.shutdown() {
                error!(
                    "Failed to shutdown thread pool '{}' during drop: {}",
                    self.shared.config.thread_name_prefix, e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn quiet_config(min: usize, max: usize, capacity: usize) -> ThreadPoolConfig {
        // Long interval keeps the manager out of the way
        ThreadPoolConfig::new(min, max, capacity).with_manager_interval(Duration::from_secs(60))
    }

    #[test]
    fn test_thread_pool_creation() {
        let pool = ThreadPool::new(2, 4, 16).expect("Failed to create thread pool");
        assert_eq!(pool.live_workers(), 2);
        assert_eq!(pool.busy_workers(), 0);
        assert_eq!(pool.queued_tasks(), 0);
        assert!(pool.is_running());
        pool.shutdown().expect("Failed to shutdown pool");
        assert!(!pool.is_running());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        for (min, max, capacity) in [(0, 4, 10), (4, 2, 10), (1, 2, 0)] {
            let err = ThreadPool::new(min, max, capacity).expect_err("degenerate config");
            assert!(err.is_initialization());
            assert!(matches!(err, ThreadError::InvalidConfig { .. }));
        }
    }

    #[test]
    fn test_job_execution() {
        let pool = ThreadPool::with_config(quiet_config(3, 10, 100)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let counter_clone = Arc::clone(&counter);
            pool.execute(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        pool.shutdown_graceful().expect("Failed to shutdown pool");
        assert_eq!(counter.load(Ordering::SeqCst), 100);

        let stats = pool.stats();
        assert_eq!(stats.tasks_submitted, 100);
        assert_eq!(stats.tasks_completed, 100);
        assert_eq!(stats.tasks_discarded, 0);
    }

    #[test]
    fn test_submit_after_shutdown_is_ignored() {
        let pool = ThreadPool::with_config(quiet_config(1, 1, 4)).unwrap();
        pool.shutdown().expect("Failed to shutdown pool");

        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = Arc::clone(&ran);
        let returned = pool.submit(ClosureJob::new(move || {
            ran_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        assert!(returned.is_some(), "job should be handed back");
        pool.execute(|| Ok(()));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(pool.stats().tasks_dropped, 2);
    }

    #[test]
    fn test_double_shutdown_reports_not_running() {
        let pool = ThreadPool::with_config(quiet_config(1, 2, 4)).unwrap();
        pool.shutdown().expect("first shutdown");
        assert!(matches!(
            pool.shutdown(),
            Err(ThreadError::NotRunning { .. })
        ));
        assert!(matches!(
            pool.shutdown_graceful(),
            Err(ThreadError::NotRunning { .. })
        ));
    }

    #[test]
    fn test_shutdown_discards_queued_jobs() {
        let pool = ThreadPool::with_config(quiet_config(1, 1, 8)).unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let finished = Arc::new(AtomicUsize::new(0));

        let finished_clone = Arc::clone(&finished);
        pool.execute(move || {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv();
            finished_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("first job should start");

        let queued_ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let queued_ran = Arc::clone(&queued_ran);
            pool.execute(move || {
                queued_ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        assert_eq!(pool.queued_tasks(), 3);

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            release_tx.send(()).unwrap();
        });
        pool.shutdown().expect("Failed to shutdown pool");
        releaser.join().unwrap();

        // The running job finished, the queued ones never ran
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(queued_ran.load(Ordering::SeqCst), 0);
        assert_eq!(pool.stats().tasks_discarded, 3);
    }

    #[test]
    fn test_full_queue_blocks_producer() {
        let pool = Arc::new(ThreadPool::with_config(quiet_config(1, 1, 1)).unwrap());
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        pool.execute(move || {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv();
            Ok(())
        });
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // Fills the single slot
        pool.execute(|| Ok(()));

        let submitted = Arc::new(AtomicUsize::new(0));
        let producer = {
            let pool = Arc::clone(&pool);
            let submitted = Arc::clone(&submitted);
            thread::spawn(move || {
                pool.execute(|| Ok(()));
                submitted.fetch_add(1, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(100));
        assert_eq!(submitted.load(Ordering::SeqCst), 0, "producer should block");

        release_tx.send(()).unwrap();
        producer.join().unwrap();
        assert_eq!(submitted.load(Ordering::SeqCst), 1);

        pool.shutdown_graceful().unwrap();
        assert_eq!(pool.stats().tasks_completed, 3);
    }

    #[test]
    fn test_shutdown_releases_blocked_producer() {
        let pool = Arc::new(ThreadPool::with_config(quiet_config(1, 1, 1)).unwrap());
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        pool.execute(move || {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv_timeout(Duration::from_millis(300));
            Ok(())
        });
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        pool.execute(|| Ok(()));

        let producer = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.submit(ClosureJob::new(|| Ok(()))).is_some())
        };
        thread::sleep(Duration::from_millis(50));

        pool.shutdown().unwrap();
        assert!(producer.join().unwrap(), "blocked job is handed back");
        drop(release_tx);
    }

    #[test]
    fn test_error_handling() {
        let pool = ThreadPool::with_config(quiet_config(2, 2, 16)).unwrap();

        for i in 0..10 {
            pool.execute(move || {
                if i % 2 == 0 {
                    Err(ThreadError::other("Test error"))
                } else {
                    Ok(())
                }
            });
        }

        pool.shutdown_graceful().unwrap();
        let stats = pool.stats();
        assert_eq!(stats.tasks_completed, 5);
        assert_eq!(stats.tasks_failed, 5);
        assert_eq!(stats.tasks_finished(), 10);
    }

    #[test]
    fn test_execute_with_releases_argument() {
        let pool = ThreadPool::with_config(quiet_config(1, 1, 4)).unwrap();
        let arg = Arc::new(String::from("payload"));
        let witness = Arc::downgrade(&arg);
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = Arc::clone(&seen);
        pool.execute_with(
            move |s: Arc<String>| {
                seen_clone.fetch_add(s.len(), Ordering::SeqCst);
            },
            arg,
        );

        pool.shutdown_graceful().unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), "payload".len());
        assert!(witness.upgrade().is_none());
    }

    #[test]
    fn test_drop_shuts_down() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = ThreadPool::with_config(quiet_config(1, 2, 4)).unwrap();
            let counter_clone = Arc::clone(&counter);
            pool.execute(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            thread::sleep(Duration::from_millis(100));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_execute_with_hands_back_argument_after_shutdown() {
        let pool = ThreadPool::with_config(quiet_config(1, 1, 4)).unwrap();
        pool.shutdown().unwrap();

        let returned = pool.execute_with(|_: String| {}, String::from("kept"));
        assert_eq!(returned.as_deref(), Some("kept"));
        assert_eq!(pool.stats().tasks_dropped, 1);
    }

    #[test]
    fn test_graceful_shutdown_preempted_by_shutdown() {
        let pool = Arc::new(ThreadPool::with_config(quiet_config(1, 1, 4)).unwrap());
        let (release_tx, release_rx) = mpsc::channel::<()>();

        pool.execute(move || {
            let _ = release_rx.recv();
            Ok(())
        });
        pool.execute(|| Ok(()));
        let graceful = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.shutdown_graceful())
        };
        thread::sleep(Duration::from_millis(50));

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            release_tx.send(()).unwrap();
        });
        pool.shutdown().expect("plain shutdown wins");
        releaser.join().unwrap();

        assert!(matches!(
            graceful.join().unwrap(),
            Err(ThreadError::NotRunning { .. })
        ));
        assert!(!pool.is_running());
        assert_eq!(pool.stats().live_workers, 0);
    }

    #[test]
    fn test_last_handle_dropped_inside_job() {
        let pool = Arc::new(ThreadPool::with_config(quiet_config(2, 2, 4)).unwrap());
        let (go_tx, go_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let inner = Arc::clone(&pool);
        pool.execute(move || {
            let _ = go_rx.recv();
            // Runs the pool's shutdown on this worker
            drop(inner);
            done_tx.send(()).unwrap();
            Ok(())
        });
        drop(pool);
        go_tx.send(()).unwrap();

        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("shutdown from a worker must return normally");
    }
}
