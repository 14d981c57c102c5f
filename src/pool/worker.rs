//! Worker thread implementation

use crate::core::{BoxedJob, Result, ThreadError};
use crate::pool::shared::{Dequeued, Shared};
use crate::pool::stats::PoolCounters;
use log::{debug, error, warn};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// A worker thread that takes jobs from the pool queue until it is told to
/// retire or the pool shuts down.
#[derive(Debug)]
pub(crate) struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Start a worker thread named `<prefix>-<id>`
    pub(crate) fn spawn(id: usize, shared: Arc<Shared>) -> Result<Self> {
        let name = format!("{}-{}", shared.config.thread_name_prefix, id);

        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || {
                Self::run(id, &shared);
            })
            .map_err(|e| ThreadError::spawn_with_source(id, "Cannot start worker thread", e))?;

        Ok(Self {
            id,
            thread: Some(thread),
        })
    }

    /// Get worker ID
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// Move the thread handle out, leaving this entry registered but
    /// without a thread to join
    pub(crate) fn detach(&mut self) -> Self {
        Self {
            id: self.id,
            thread: self.thread.take(),
        }
    }

    /// Join the worker thread
    ///
    /// A worker that shuts the pool down from inside a job is not joined by
    /// itself; it leaves its loop once that job returns.
    pub(crate) fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() == thread::current().id() {
                debug!("worker {} is shutting the pool down, not joining itself", self.id);
                return Ok(());
            }
            thread
                .join()
                .map_err(|_| ThreadError::join(self.id, "Worker panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop
    fn run(id: usize, shared: &Shared) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        debug!("worker {} started", id);

        loop {
            match shared.dequeue(id) {
                Dequeued::Job(job) => {
                    Self::execute_job(id, job, &shared.counters);
                    shared.finish_job();
                }
                Dequeued::Retire => {
                    PoolCounters::add(&shared.counters.workers_retired, 1);
                    debug!("worker {} retiring", id);
                    break;
                }
                Dequeued::Shutdown => {
                    debug!("worker {} shutting down", id);
                    break;
                }
            }
        }
    }

    /// Run a single job with panic protection, then drop it together with
    /// whatever it owns.
    fn execute_job(id: usize, mut job: BoxedJob, counters: &PoolCounters) {
        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job_type = job.job_type());
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();

        let start = std::time::Instant::now();

        let panic_result = catch_unwind(AssertUnwindSafe(|| job.execute()));

        let elapsed = start.elapsed();

        match panic_result {
            Ok(Ok(())) => {
                PoolCounters::add(&counters.completed, 1);
                #[cfg(feature = "tracing")]
                crate::telemetry::metrics::record_completion(elapsed, true);
            }
            Ok(Err(e)) => {
                warn!("worker {}: {:?} failed: {}", id, job, e);
                PoolCounters::add(&counters.failed, 1);
                #[cfg(feature = "tracing")]
                crate::telemetry::metrics::record_completion(elapsed, false);
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!("worker {}: {:?} panicked: {}", id, job, panic_msg);
                PoolCounters::add(&counters.panicked, 1);
                #[cfg(feature = "tracing")]
                crate::telemetry::metrics::record_panic(elapsed);
            }
        }

        PoolCounters::add(&counters.total_processing_time_us, elapsed.as_micros() as u64);
        drop(job);
    }
}
