//! State shared by the pool handle, its workers and its manager.
//!
//! Everything structural lives behind one mutex: the task queue, the worker
//! registry, the retirement tokens and the shutdown flag. The busy counter is
//! a separate atomic because it changes on every job start and finish.

use crate::core::{BoxedJob, Job, Result, ThreadError};
use crate::pool::config::ThreadPoolConfig;
use crate::pool::stats::{PoolCounters, PoolStats};
use crate::pool::worker::Worker;
use crate::queue::BoundedQueue;
use crossbeam_utils::CachePadded;
use log::{debug, warn};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Outcome of a worker's blocking dequeue
pub(crate) enum Dequeued {
    /// A job to run; the busy counter already includes it
    Job(BoxedJob),
    /// A retirement token was claimed and the worker left the registry
    Retire,
    /// The pool is shutting down
    Shutdown,
}

/// Fields guarded by the pool mutex
pub(crate) struct PoolState {
    pub(crate) queue: BoundedQueue<BoxedJob>,
    /// Live workers by id; `len()` is the live count. At shutdown entries
    /// stay until their thread has been joined.
    pub(crate) workers: HashMap<usize, Worker>,
    /// Workers that left the registry and still need joining
    pub(crate) retired: Vec<Worker>,
    /// Retirement tokens handed out by the manager
    pub(crate) exit_quota: usize,
    pub(crate) shutting_down: bool,
    /// Set by a graceful shutdown; submissions are refused from then on
    pub(crate) draining: bool,
    next_worker_id: usize,
}

pub(crate) struct Shared {
    pub(crate) config: ThreadPoolConfig,
    pub(crate) state: Mutex<PoolState>,
    not_full: Condvar,
    not_empty: Condvar,
    drained: Condvar,
    busy: CachePadded<AtomicUsize>,
    pub(crate) counters: PoolCounters,
}

impl Shared {
    /// Allocate queue and registry storage. No thread is started here.
    pub(crate) fn new(config: ThreadPoolConfig) -> Result<Self> {
        let queue = BoundedQueue::try_with_capacity(config.queue_capacity)?;

        let mut workers = HashMap::new();
        workers.try_reserve(config.max_workers).map_err(|e| {
            ThreadError::invalid_config(
                "max_workers",
                format!(
                    "Cannot allocate registry for {} workers: {}",
                    config.max_workers, e
                ),
            )
        })?;

        Ok(Self {
            config,
            state: Mutex::new(PoolState {
                queue,
                workers,
                retired: Vec::new(),
                exit_quota: 0,
                shutting_down: false,
                draining: false,
                next_worker_id: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            drained: Condvar::new(),
            busy: CachePadded::new(AtomicUsize::new(0)),
            counters: PoolCounters::new(),
        })
    }

    /// Put a job at the rear of the queue, blocking while the queue is full.
    ///
    /// Returns the job untouched if the pool stops accepting work before it
    /// could be queued.
    pub(crate) fn enqueue<J: Job + 'static>(&self, job: J) -> Option<J> {
        let mut state = self.state.lock();
        loop {
            if state.shutting_down || state.draining {
                PoolCounters::add(&self.counters.dropped, 1);
                debug!("Job({}) dropped: pool is shutting down", job.job_type());
                return Some(job);
            }
            if !state.queue.is_full() {
                break;
            }
            self.not_full.wait(&mut state);
        }

        // A slot is free and the lock is held
        let pushed = state.queue.push(Box::new(job));
        debug_assert!(pushed.is_ok());
        PoolCounters::add(&self.counters.submitted, 1);

        #[cfg(feature = "tracing")]
        crate::telemetry::metrics::record_submission(state.queue.len());

        self.not_empty.notify_one();
        None
    }

    /// Take the next job for worker `id`, blocking while the queue is empty.
    ///
    /// An idle worker may instead claim a retirement token; it is removed
    /// from the registry before this returns.
    pub(crate) fn dequeue(&self, id: usize) -> Dequeued {
        let mut state = self.state.lock();
        loop {
            if state.shutting_down {
                return Dequeued::Shutdown;
            }

            if let Some(job) = state.queue.pop() {
                // Counted as busy while the lock is held so that "queue empty
                // and nobody busy" is observed atomically by drain waiters.
                self.busy.fetch_add(1, Ordering::AcqRel);
                self.not_full.notify_one();
                return Dequeued::Job(job);
            }

            if state.exit_quota > 0 {
                state.exit_quota -= 1;
                if state.workers.len() > self.config.min_workers {
                    if let Some(worker) = state.workers.remove(&id) {
                        state.retired.push(worker);
                    }
                    return Dequeued::Retire;
                }
            }

            self.not_empty.wait(&mut state);
        }
    }

    /// Mark the end of a job taken by [`dequeue`](Self::dequeue).
    pub(crate) fn finish_job(&self) {
        if self.busy.fetch_sub(1, Ordering::AcqRel) == 1 {
            let state = self.state.lock();
            if state.draining {
                self.drained.notify_all();
            }
        }
    }

    /// Start a worker and register it. The caller holds the pool lock, so
    /// the new thread cannot observe the registry before it is inserted.
    pub(crate) fn spawn_worker(self: &Arc<Self>, state: &mut PoolState) -> Result<usize> {
        let id = state.next_worker_id;
        let worker = Worker::spawn(id, Arc::clone(self))?;
        state.next_worker_id += 1;
        state.workers.insert(id, worker);
        PoolCounters::add(&self.counters.workers_spawned, 1);
        Ok(id)
    }

    /// Spawn up to `count` workers without exceeding the maximum.
    ///
    /// Stale retirement tokens are withdrawn first. Returns how many workers
    /// were started.
    pub(crate) fn grow(self: &Arc<Self>, count: usize) -> usize {
        let mut state = self.state.lock();
        if state.shutting_down {
            return 0;
        }
        state.exit_quota = 0;

        let room = self.config.max_workers.saturating_sub(state.workers.len());
        let mut spawned = 0;
        for _ in 0..count.min(room) {
            match self.spawn_worker(&mut state) {
                Ok(_) => spawned += 1,
                Err(e) => {
                    warn!("Failed to grow pool '{}': {}", self.config.thread_name_prefix, e);
                    break;
                }
            }
        }
        spawned
    }

    /// Hand out up to `count` retirement tokens and wake that many idle
    /// workers. Never asks more workers to leave than `live - min`.
    pub(crate) fn request_retirement(&self, count: usize) -> usize {
        let mut state = self.state.lock();
        if state.shutting_down {
            return 0;
        }
        let surplus = state.workers.len().saturating_sub(self.config.min_workers);
        let quota = count.min(surplus);
        state.exit_quota = quota;
        for _ in 0..quota {
            self.not_empty.notify_one();
        }
        quota
    }

    /// Take every worker that retired since the last call.
    pub(crate) fn take_retired(&self) -> Vec<Worker> {
        std::mem::take(&mut self.state.lock().retired)
    }

    /// Flip the shutdown flag and wake every blocked party.
    ///
    /// Returns `false` if shutdown had already begun.
    pub(crate) fn begin_shutdown(&self) -> bool {
        let mut state = self.state.lock();
        if state.shutting_down {
            return false;
        }
        state.shutting_down = true;
        state.exit_quota = 0;
        self.not_full.notify_all();
        self.not_empty.notify_all();
        self.drained.notify_all();
        true
    }

    /// Refuse new submissions and block until the queue is empty and no
    /// worker is running a job, or until shutdown begins.
    pub(crate) fn drain(&self) {
        let mut state = self.state.lock();
        state.draining = true;
        // Producers blocked on a full queue give up their jobs
        self.not_full.notify_all();
        while !state.shutting_down
            && !(state.queue.is_empty() && self.busy.load(Ordering::Acquire) == 0)
        {
            self.drained.wait(&mut state);
        }
    }

    pub(crate) fn is_shutting_down(&self) -> bool {
        self.state.lock().shutting_down
    }

    pub(crate) fn busy_workers(&self) -> usize {
        self.busy.load(Ordering::Acquire)
    }

    pub(crate) fn live_workers(&self) -> usize {
        self.state.lock().workers.len()
    }

    pub(crate) fn queued_tasks(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub(crate) fn stats(&self) -> PoolStats {
        // Jobs only start under the lock, so reading `busy` here can never
        // observe more busy workers than registered ones.
        let (live_workers, busy_workers, queued_tasks) = {
            let state = self.state.lock();
            (state.workers.len(), self.busy_workers(), state.queue.len())
        };
        let c = &self.counters;
        PoolStats {
            min_workers: self.config.min_workers,
            max_workers: self.config.max_workers,
            queue_capacity: self.config.queue_capacity,
            live_workers,
            busy_workers,
            queued_tasks,
            tasks_submitted: PoolCounters::get(&c.submitted),
            tasks_dropped: PoolCounters::get(&c.dropped),
            tasks_completed: PoolCounters::get(&c.completed),
            tasks_failed: PoolCounters::get(&c.failed),
            tasks_panicked: PoolCounters::get(&c.panicked),
            tasks_discarded: PoolCounters::get(&c.discarded),
            workers_spawned: PoolCounters::get(&c.workers_spawned),
            workers_retired: PoolCounters::get(&c.workers_retired),
            average_processing_time_us: c.average_processing_time_us(),
        }
    }
}
