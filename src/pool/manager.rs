//! Manager thread that resizes the worker set.
//!
//! Every `manager_interval` the manager samples the queue length, the live
//! worker count and the busy worker count, then either spawns workers when a
//! backlog builds up or hands out retirement tokens when most workers sit
//! idle. It also joins workers that retired since its previous check.

use crate::core::{Result, ThreadError};
use crate::pool::shared::Shared;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread;

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// Thread id reported in manager spawn/join errors
const MANAGER_THREAD_ID: usize = usize::MAX;

/// Load sampled by one manager check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadSnapshot {
    /// Jobs waiting in the queue
    pub queued: usize,
    /// Registered workers
    pub live: usize,
    /// Workers running a job
    pub busy: usize,
}

/// What a manager check decided to do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resize {
    /// Spawn this many workers
    Grow(usize),
    /// Ask this many idle workers to retire
    Shrink(usize),
    /// Leave the worker set alone
    Hold,
}

impl Resize {
    /// Decide how to resize a pool bounded by `min..=max` workers.
    ///
    /// Grows when more jobs are queued than there are workers, shrinks when
    /// fewer than half of the workers are busy. A backlog takes precedence
    /// over idleness.
    pub fn plan(load: LoadSnapshot, min: usize, max: usize, step: usize) -> Self {
        if load.queued > load.live && load.live < max {
            Resize::Grow(step.min(max - load.live))
        } else if load.busy * 2 < load.live && load.live > min {
            Resize::Shrink(step.min(load.live - min))
        } else {
            Resize::Hold
        }
    }
}

/// Handle to the running manager thread
#[derive(Debug)]
pub(crate) struct Manager {
    stop: Option<Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Manager {
    /// Start the manager thread named `<prefix>-manager`
    pub(crate) fn spawn(shared: Arc<Shared>) -> Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let name = format!("{}-manager", shared.config.thread_name_prefix);

        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || Self::run(&shared, &stop_rx))
            .map_err(|e| {
                ThreadError::spawn_with_source(MANAGER_THREAD_ID, "Cannot start manager thread", e)
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Wake the manager out of its sleep and wait for it to return
    pub(crate) fn stop_and_join(mut self) -> Result<()> {
        // Dropping the sender disconnects the channel the manager sleeps on
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| ThreadError::join(MANAGER_THREAD_ID, "Manager panicked"))?;
        }
        Ok(())
    }

    fn run(shared: &Arc<Shared>, stop: &Receiver<()>) {
        #[cfg(feature = "tracing")]
        let manager_span = span!(Level::DEBUG, "manager");
        #[cfg(feature = "tracing")]
        let _guard = manager_span.enter();

        debug!("manager started");

        loop {
            match stop.recv_timeout(shared.config.manager_interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
            if !Self::check(shared) {
                break;
            }
        }

        debug!("manager stopped");
    }

    /// One manager iteration. Returns `false` once the pool is shutting down.
    fn check(shared: &Arc<Shared>) -> bool {
        let (queued, live, retired) = {
            let mut state = shared.state.lock();
            if state.shutting_down {
                return false;
            }
            (
                state.queue.len(),
                state.workers.len(),
                std::mem::take(&mut state.retired),
            )
        };
        // Sampled after the lock is released; the three values are only
        // approximately consistent with each other.
        let busy = shared.busy_workers();

        for worker in retired {
            let id = worker.id();
            if let Err(e) = worker.join() {
                warn!("Failed to reap retired worker {}: {}", id, e);
            }
        }

        let config = &shared.config;
        let load = LoadSnapshot { queued, live, busy };
        match Resize::plan(load, config.min_workers, config.max_workers, config.resize_step) {
            Resize::Grow(count) => {
                let spawned = shared.grow(count);
                info!(
                    "pool '{}' grew by {} workers ({} queued, {} live)",
                    config.thread_name_prefix, spawned, queued, live
                );
                #[cfg(feature = "tracing")]
                crate::telemetry::metrics::record_resize(spawned as i64, live + spawned);
            }
            Resize::Shrink(count) => {
                let quota = shared.request_retirement(count);
                debug!(
                    "pool '{}' asked {} idle workers to retire ({} busy, {} live)",
                    config.thread_name_prefix, quota, busy, live
                );
                #[cfg(feature = "tracing")]
                crate::telemetry::metrics::record_resize(-(quota as i64), live);
            }
            Resize::Hold => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(queued: usize, live: usize, busy: usize) -> LoadSnapshot {
        LoadSnapshot { queued, live, busy }
    }

    #[test]
    fn test_grow_on_backlog() {
        assert_eq!(Resize::plan(load(10, 2, 2), 2, 6, 2), Resize::Grow(2));
    }

    #[test]
    fn test_grow_capped_at_max() {
        assert_eq!(Resize::plan(load(10, 5, 5), 2, 6, 2), Resize::Grow(1));
        assert_eq!(Resize::plan(load(10, 6, 6), 2, 6, 2), Resize::Hold);
    }

    #[test]
    fn test_shrink_when_mostly_idle() {
        assert_eq!(Resize::plan(load(0, 6, 0), 2, 6, 2), Resize::Shrink(2));
        assert_eq!(Resize::plan(load(0, 3, 1), 2, 6, 2), Resize::Shrink(1));
    }

    #[test]
    fn test_hold_at_minimum() {
        assert_eq!(Resize::plan(load(0, 2, 0), 2, 6, 2), Resize::Hold);
    }

    #[test]
    fn test_hold_when_half_busy() {
        assert_eq!(Resize::plan(load(3, 4, 2), 2, 6, 2), Resize::Hold);
    }

    #[test]
    fn test_backlog_wins_over_idleness() {
        // Workers have not picked up the burst yet
        assert_eq!(Resize::plan(load(8, 2, 0), 1, 6, 2), Resize::Grow(2));
    }
}
