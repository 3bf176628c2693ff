//! # Worker management.
//!
//! Dispatch follows the classic executor order, with the admission queue's
//! eager rule deciding between steps 2 and 3:
//!
//! ```text
//! dispatch(task)
//!   1. workers < core                 ──► new core worker runs task
//!   2. running && queue.enqueue(task) ──► queued
//!        ├─ shut down meanwhile && still queued ──► reject
//!        └─ no worker left                      ──► start an empty worker
//!   3. new non-core worker (workers < max)      ──► runs task
//!   4. reject through the interceptor
//! ```
//!
//! A worker runs its first task, then keeps taking from the queue. Surplus
//! workers (or all of them, with core timeout allowed) give up after
//! `keep_alive` without work.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::{debug, info, warn};

use crate::core::Lifecycle;
use crate::core::pool::Shared;
use crate::error::RejectError;
use crate::queue::Origin;
use crate::tasks::TaskRef;

impl Shared {
    pub(super) fn dispatch(self: &Arc<Self>, task: TaskRef) -> Result<(), RejectError> {
        let occ = self.occupancy();
        if occ.workers() < occ.core && self.add_worker(Some(Arc::clone(&task)), true) {
            return Ok(());
        }
        if self.is_running() && self.queue().enqueue(Arc::clone(&task), Origin::Submission) {
            if !self.is_running() && self.queue().remove_uncounted(&task) {
                return self.reject(task);
            }
            if occ.workers() == 0 {
                self.add_worker(None, false);
            }
            return Ok(());
        }
        if self.add_worker(Some(Arc::clone(&task)), false) {
            return Ok(());
        }
        self.reject(task)
    }

    /// Starts a worker bounded by core or max size. Returns whether it started.
    pub(super) fn add_worker(self: &Arc<Self>, first: Option<TaskRef>, is_core: bool) -> bool {
        match self.lifecycle() {
            Lifecycle::Running => {}
            Lifecycle::ShuttingDown
                if first.is_none()
                    && !self.forced.load(Ordering::Acquire)
                    && !self.queue().is_empty() => {}
            _ => return false,
        }

        let occ = self.occupancy();
        let bound = if is_core { occ.core } else { occ.max };
        let Some(count) = occ.try_reserve_worker(bound) else {
            return false;
        };

        let shared = Arc::clone(self);
        match self.factory.spawn(Box::new(move || shared.run_worker(first))) {
            Ok(()) => {
                debug!(pool = %self.name(), workers = count, core = is_core, "worker started");
                true
            }
            Err(err) => {
                occ.release_worker();
                warn!(pool = %self.name(), error = %err, "failed to spawn worker");
                self.try_terminate();
                false
            }
        }
    }

    fn run_worker(self: Arc<Self>, first: Option<TaskRef>) {
        let mut next = first;
        loop {
            let task = match next.take() {
                Some(task) => task,
                None => match self.next_task() {
                    Some(task) => task,
                    None => break,
                },
            };
            self.run_task(task);
        }
        self.exit_worker();
    }

    fn run_task(&self, task: TaskRef) {
        let occ = self.occupancy();
        occ.active.fetch_add(1, Ordering::AcqRel);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.run()));
        occ.active.fetch_sub(1, Ordering::AcqRel);
        occ.completed.fetch_add(1, Ordering::AcqRel);
        occ.in_flight.decrement();

        if outcome.is_err() {
            warn!(pool = %self.name(), task = task.name(), "task panicked");
        }
    }

    /// Blocks for the next queued task. `None` means this worker must exit; its
    /// slot has already been released.
    fn next_task(&self) -> Option<TaskRef> {
        let occ = self.occupancy();
        let mut timed_out = false;
        loop {
            if self.lifecycle() >= Lifecycle::ShuttingDown
                && (self.forced.load(Ordering::Acquire) || self.queue().is_empty())
            {
                occ.release_worker();
                return None;
            }

            let workers = occ.workers();
            let timed = self.allow_core_timeout.load(Ordering::Acquire) || workers > occ.core;
            if (workers > occ.max || (timed && timed_out))
                && (workers > 1 || self.queue().is_empty())
            {
                if occ.release_worker_if(workers) {
                    return None;
                }
                continue;
            }

            if timed {
                match self.queue().poll_timeout(self.keep_alive) {
                    Some(task) => return Some(task),
                    None => timed_out = true,
                }
            } else if let Some(task) = self.queue().take() {
                return Some(task);
            }
        }
    }

    fn exit_worker(self: &Arc<Self>) {
        debug!(pool = %self.name(), workers = self.occupancy().workers(), "worker exiting");
        self.try_terminate();

        if self.lifecycle() == Lifecycle::Terminated || self.forced.load(Ordering::Acquire) {
            return;
        }
        let occ = self.occupancy();
        let mut min = if self.allow_core_timeout.load(Ordering::Acquire) {
            0
        } else {
            occ.core
        };
        if min == 0 && !self.queue().is_empty() {
            min = 1;
        }
        if occ.workers() < min {
            self.add_worker(None, false);
        }
    }

    /// Moves to `Terminated` once shut down, with no workers and nothing left to run.
    pub(super) fn try_terminate(&self) {
        if self.lifecycle() != Lifecycle::ShuttingDown {
            return;
        }
        if !self.forced.load(Ordering::Acquire) && !self.queue().is_empty() {
            return;
        }
        if self.occupancy().workers() != 0 {
            return;
        }

        let _guard = self.main.lock();
        if self.advance(Lifecycle::Terminated) {
            info!(pool = %self.name(), completed = self.occupancy().completed.load(Ordering::Acquire), "pool terminated");
            self.terminated.notify_all();
        }
    }
}
