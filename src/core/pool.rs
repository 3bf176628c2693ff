//! # Eager pool.
//!
//! [`EagerPool`] is the public handle. It is cheap to clone; all clones drive the
//! same workers.
//!
//! ## Submission
//! ```text
//! submit(task)
//!   in_flight += 1
//!   dispatch(task) ─ Ok ─────────────────────────────────────► Ok
//!        │
//!        └─ Err (strategy refused) ─► try_enqueue_timeout(retry_offer_timeout)
//!                                        ├─ queued            ─► Ok
//!                                        └─ full/closed/cancel ─► in_flight -= 1, Err
//! ```
//!
//! ## Rules
//! - Every accepted task leaves in-flight exactly once: when it ran, or when it
//!   was discarded, evicted, removed or drained.
//! - A panic escaping `submit` (from a caller-runs task, say) still compensates.
//! - Lifecycle only moves forward: Running → ShuttingDown → Terminated.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::{Config, PoolSnapshot, ThreadFactory};
use crate::error::{ConfigError, RejectError};
use crate::gauge::{InFlightCounter, Occupancy};
use crate::policies::RejectionInterceptor;
use crate::queue::AdmissionQueue;
use crate::tasks::TaskRef;

/// Lifecycle state of a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Lifecycle {
    /// Accepting submissions.
    Running = 0,
    /// No new submissions; queued and running tasks finish.
    ShuttingDown = 1,
    /// All workers have exited.
    Terminated = 2,
}

impl Lifecycle {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Lifecycle::Running,
            1 => Lifecycle::ShuttingDown,
            _ => Lifecycle::Terminated,
        }
    }

    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Lifecycle::Running => "running",
            Lifecycle::ShuttingDown => "shutting_down",
            Lifecycle::Terminated => "terminated",
        }
    }
}

/// State shared by the pool handles and every worker.
pub(crate) struct Shared {
    name: String,
    pub(super) keep_alive: Duration,
    retry_offer_timeout: Duration,
    pub(super) allow_core_timeout: AtomicBool,
    occupancy: Arc<Occupancy>,
    queue: AdmissionQueue,
    interceptor: RejectionInterceptor,
    pub(super) factory: Arc<dyn ThreadFactory>,
    state: AtomicU8,
    pub(super) forced: AtomicBool,
    pub(super) main: Mutex<()>,
    pub(super) terminated: Condvar,
}

impl Shared {
    pub(crate) fn new(
        cfg: &Config,
        name: String,
        interceptor: RejectionInterceptor,
        factory: Arc<dyn ThreadFactory>,
    ) -> Self {
        let occupancy = Arc::new(Occupancy::new(cfg.core_size, cfg.max_size));
        let queue = AdmissionQueue::new(&name, cfg.queue_capacity, Arc::clone(&occupancy));
        Self {
            name,
            keep_alive: cfg.keep_alive,
            retry_offer_timeout: cfg.retry_offer_timeout,
            allow_core_timeout: AtomicBool::new(cfg.allow_core_thread_timeout),
            occupancy,
            queue,
            interceptor,
            factory,
            state: AtomicU8::new(Lifecycle::Running as u8),
            forced: AtomicBool::new(false),
            main: Mutex::new(()),
            terminated: Condvar::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn queue(&self) -> &AdmissionQueue {
        &self.queue
    }

    pub(crate) fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub(super) fn is_running(&self) -> bool {
        self.lifecycle() == Lifecycle::Running
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        !self.is_running()
    }

    /// Moves the state forward to `to`; returns whether it changed.
    pub(super) fn advance(&self, to: Lifecycle) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (cur < to as u8).then_some(to as u8)
            })
            .is_ok()
    }

    pub(crate) fn snapshot(&self) -> PoolSnapshot {
        let occ = &self.occupancy;
        PoolSnapshot {
            pool_size: occ.workers(),
            active: occ.active.load(Ordering::Acquire),
            core: occ.core,
            max: occ.max,
            largest: occ.largest.load(Ordering::Acquire),
            queued: self.queue.len(),
            in_flight: occ.in_flight.get(),
            completed: occ.completed.load(Ordering::Acquire),
        }
    }

    fn submit(
        self: &Arc<Self>,
        task: TaskRef,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), RejectError> {
        let in_flight = &self.occupancy.in_flight;
        in_flight.increment();
        let guard = UnwindGuard::arm(in_flight);

        let outcome = match self.dispatch(Arc::clone(&task)) {
            Ok(()) => Ok(()),
            Err(rejected) => self.retry_offer(task, rejected, cancel),
        };
        guard.disarm();
        outcome
    }

    /// One bounded, plain enqueue after the strategy refused the task.
    fn retry_offer(
        self: &Arc<Self>,
        task: TaskRef,
        rejected: RejectError,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), RejectError> {
        let in_flight = &self.occupancy.in_flight;
        match self
            .queue
            .try_enqueue_timeout(Arc::clone(&task), self.retry_offer_timeout, cancel)
        {
            Ok(true) => {
                if !self.is_running() && self.queue.remove_uncounted(&task) {
                    in_flight.decrement();
                    return Err(RejectError::Shutdown {
                        pool: self.name.clone(),
                    });
                }
                if self.occupancy.workers() == 0 {
                    self.add_worker(None, false);
                }
                debug!(pool = %self.name, task = task.name(), "task queued on retry");
                Ok(())
            }
            Ok(false) => {
                in_flight.decrement();
                Err(rejected)
            }
            Err(err) => {
                in_flight.decrement();
                Err(err)
            }
        }
    }

    pub(super) fn reject(&self, task: TaskRef) -> Result<(), RejectError> {
        self.interceptor.intercept(task, self)
    }
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("name", &self.name)
            .field("lifecycle", &self.lifecycle())
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

/// Compensates the optimistic increment if `submit` unwinds.
struct UnwindGuard<'a> {
    in_flight: &'a InFlightCounter,
    armed: bool,
}

impl<'a> UnwindGuard<'a> {
    fn arm(in_flight: &'a InFlightCounter) -> Self {
        Self {
            in_flight,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.in_flight.decrement();
        }
    }
}

/// Bounded worker pool that grows before it queues.
///
/// Built with [`PoolBuilder`](crate::PoolBuilder). Dropping every handle does not
/// stop the workers; call [`shutdown`](Self::shutdown).
#[derive(Clone)]
pub struct EagerPool {
    shared: Arc<Shared>,
}

impl EagerPool {
    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Submits `task`.
    ///
    /// Returns once the task is running, queued, or handled by the rejection
    /// strategy. Fails with [`RejectError`] when the strategy refuses the task and
    /// the bounded retry finds no room either.
    pub fn submit(&self, task: TaskRef) -> Result<(), RejectError> {
        self.shared.submit(task, None)
    }

    /// Like [`submit`](Self::submit), but the bounded retry wait gives up with
    /// [`RejectError::Cancelled`] when `cancel` fires. The token is left cancelled.
    pub fn submit_cancellable(
        &self,
        task: TaskRef,
        cancel: &CancellationToken,
    ) -> Result<(), RejectError> {
        self.shared.submit(task, Some(cancel))
    }

    /// Removes a queued task (by identity). Returns `false` if it is not queued.
    pub fn remove(&self, task: &TaskRef) -> bool {
        self.shared.queue.remove(task)
    }

    /// Pool name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Accepted tasks that have not finished.
    pub fn in_flight_count(&self) -> usize {
        self.shared.occupancy.in_flight.get()
    }

    /// Rejections since creation. Shared with other pools when the builder was
    /// given a common counter.
    pub fn rejected_count(&self) -> u64 {
        self.shared.interceptor.rejected_total()
    }

    /// Rejections in the alert window.
    pub fn rejected_in_window(&self) -> u64 {
        self.shared.interceptor.gate().rejected_in_window()
    }

    /// Whether rejection alerts can fire.
    pub fn is_alert_enabled(&self) -> bool {
        self.shared.interceptor.gate().is_enabled()
    }

    /// Turns rejection alerts on or off at runtime.
    pub fn set_alert_enabled(&self, on: bool) {
        self.shared.interceptor.gate().set_enabled(on);
    }

    /// Occupancy view.
    pub fn snapshot(&self) -> PoolSnapshot {
        self.shared.snapshot()
    }

    /// The admission queue. Callers can inspect and empty it; only the pool fills it.
    pub fn queue(&self) -> &AdmissionQueue {
        &self.shared.queue
    }

    /// Live worker threads.
    pub fn pool_size(&self) -> usize {
        self.shared.occupancy.workers()
    }

    /// Workers currently running a task.
    pub fn active_count(&self) -> usize {
        self.shared.occupancy.active.load(Ordering::Acquire)
    }

    /// Tasks run by workers, panicked ones included.
    pub fn completed_count(&self) -> u64 {
        self.shared.occupancy.completed.load(Ordering::Acquire)
    }

    /// Highest worker count seen.
    pub fn largest_pool_size(&self) -> usize {
        self.shared.occupancy.largest.load(Ordering::Acquire)
    }

    /// Configured core size.
    pub fn core_size(&self) -> usize {
        self.shared.occupancy.core
    }

    /// Configured maximum size.
    pub fn max_size(&self) -> usize {
        self.shared.occupancy.max
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lifecycle()
    }

    /// Whether [`shutdown`](Self::shutdown) or [`shutdown_now`](Self::shutdown_now)
    /// was called.
    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }

    /// Whether every worker has exited after shutdown.
    pub fn is_terminated(&self) -> bool {
        self.shared.lifecycle() == Lifecycle::Terminated
    }

    /// Starts every missing core worker. Returns how many were started.
    pub fn prestart_all_core_threads(&self) -> usize {
        let mut started = 0;
        while self.shared.add_worker(None, true) {
            started += 1;
        }
        started
    }

    /// Lets idle core workers exit after the keep-alive.
    pub fn set_allow_core_thread_timeout(&self, on: bool) -> Result<(), ConfigError> {
        if on && self.shared.keep_alive.is_zero() {
            return Err(ConfigError::CoreTimeout);
        }
        let was = self.shared.allow_core_timeout.swap(on, Ordering::AcqRel);
        if on && !was {
            self.shared.queue.wake_takers();
        }
        Ok(())
    }

    /// Stops admitting work. Queued and running tasks still complete.
    pub fn shutdown(&self) {
        let shared = &self.shared;
        if shared.advance(Lifecycle::ShuttingDown) {
            info!(pool = %shared.name, queued = shared.queue.len(), "pool shutting down");
        }
        shared.queue.close();
        shared.interceptor.gate().close();
        if shared.occupancy.workers() == 0 && !shared.queue.is_empty() {
            shared.add_worker(None, false);
        }
        shared.try_terminate();
    }

    /// Stops admitting work and drains the queue.
    ///
    /// Returns the tasks that never ran; they no longer count as in flight.
    /// Tasks already running finish normally.
    pub fn shutdown_now(&self) -> Vec<TaskRef> {
        let shared = &self.shared;
        shared.forced.store(true, Ordering::Release);
        if shared.advance(Lifecycle::ShuttingDown) {
            info!(pool = %shared.name, "pool shutting down now");
        }
        shared.queue.close();
        shared.interceptor.gate().close();
        let drained = shared.queue.drain(None);
        if !drained.is_empty() {
            debug!(pool = %shared.name, drained = drained.len(), "drained queued tasks");
        }
        shared.try_terminate();
        drained
    }

    /// Blocks until the pool terminates or `timeout` elapses. Returns whether it
    /// terminated.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        let shared = &self.shared;
        let deadline = Instant::now().checked_add(timeout);
        let mut guard = shared.main.lock();
        loop {
            if shared.lifecycle() == Lifecycle::Terminated {
                return true;
            }
            match deadline {
                Some(d) => {
                    if shared.terminated.wait_until(&mut guard, d).timed_out() {
                        return shared.lifecycle() == Lifecycle::Terminated;
                    }
                }
                None => shared.terminated.wait(&mut guard),
            }
        }
    }
}

impl std::fmt::Debug for EagerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EagerPool")
            .field("name", &self.shared.name)
            .field("lifecycle", &self.shared.lifecycle())
            .field("snapshot", &self.shared.snapshot())
            .finish()
    }
}
