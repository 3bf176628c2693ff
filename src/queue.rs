//! # Admission queue.
//!
//! [`AdmissionQueue`] is the bounded FIFO between submitters and workers. Its
//! enqueue is an admission decision, not a plain append:
//!
//! ```text
//! enqueue(task, Origin::Submission)
//!     │
//!     ├─ workers > in_flight   ──► offer (an idle worker will pick it up)
//!     ├─ workers < max         ──► false (grow: the pool spawns a worker)
//!     └─ otherwise             ──► offer (bounded; false when full)
//!
//! enqueue(task, Origin::RejectionHandler)
//!     └─ plain offer; on success in_flight += 1
//! ```
//!
//! Enqueueing is crate-internal, so every queued task has already been counted.
//! The public surface only inspects the queue or takes tasks out of it.
//!
//! ## Accounting rules
//! - `dequeue`, `remove`, `drain` and `clear` decrement the in-flight counter by
//!   the number of tasks taken out: those tasks will never reach a worker.
//! - Workers take tasks through crate-private paths that leave the counter alone;
//!   the worker decrements once the task has run.
//! - Occupancy reads are lock-free snapshots and may be momentarily stale. That
//!   only affects the queue-vs-grow choice, never the final counter value.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::RejectError;
use crate::gauge::Occupancy;
use crate::tasks::{TaskRef, same_task};

/// Granularity at which a blocked retry offer re-checks its cancellation token.
const CANCEL_POLL: Duration = Duration::from_millis(5);

/// Who is asking the queue to accept a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Origin {
    /// A regular [`EagerPool::submit`](crate::EagerPool::submit); the task is
    /// already counted as in flight and the eager admission rule applies.
    Submission,
    /// A rejection strategy placing a task on its own. Plain bounded offer; the
    /// task is counted as in flight when accepted.
    RejectionHandler,
}

/// Bounded, thread-safe FIFO with eager admission.
///
/// Only the pool puts tasks in; outside the crate the queue can be inspected and
/// emptied (with in-flight compensation), never filled:
///
/// ```compile_fail
/// use std::time::Duration;
/// use eagerpool::{Config, PoolBuilder, TaskFn};
///
/// let pool = PoolBuilder::new(Config::default()).build().unwrap();
/// pool.queue()
///     .try_enqueue_timeout(TaskFn::arc("t", || {}), Duration::ZERO, None)
///     .unwrap();
/// ```
pub struct AdmissionQueue {
    pool: String,
    items: Mutex<VecDeque<TaskRef>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
    closed: AtomicBool,
    wakeups: AtomicU64,
    occupancy: Arc<Occupancy>,
}

impl AdmissionQueue {
    pub(crate) fn new(pool: &str, capacity: usize, occupancy: Arc<Occupancy>) -> Self {
        Self {
            pool: pool.to_owned(),
            items: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
            closed: AtomicBool::new(false),
            wakeups: AtomicU64::new(0),
            occupancy,
        }
    }

    /// Fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Free slots left.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.len())
    }

    /// Whether `task` (by identity) is currently queued.
    pub fn contains(&self, task: &TaskRef) -> bool {
        self.items.lock().iter().any(|t| same_task(t, task))
    }

    /// Admission decision for `task`. Returns `true` when the task was queued.
    ///
    /// For [`Origin::Submission`] a `false` can mean "grow instead of queueing"
    /// even while slots are free.
    pub(crate) fn enqueue(&self, task: TaskRef, origin: Origin) -> bool {
        match origin {
            Origin::RejectionHandler => {
                let accepted = self.offer(task);
                if accepted {
                    self.occupancy.in_flight.increment();
                }
                accepted
            }
            Origin::Submission => {
                let workers = self.occupancy.workers();
                if workers > self.occupancy.in_flight.get() {
                    return self.offer(task);
                }
                if workers < self.occupancy.max {
                    return false;
                }
                self.offer(task)
            }
        }
    }

    /// Plain bounded offer that waits up to `timeout` for a free slot.
    ///
    /// Bypasses the eager rule; used for the single retry after a synchronous
    /// rejection. Fails fast with [`RejectError::Shutdown`] once the queue is
    /// closed and with [`RejectError::Cancelled`] when `cancel` fires, including
    /// when it was already cancelled on entry.
    pub(crate) fn try_enqueue_timeout(
        &self,
        task: TaskRef,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<bool, RejectError> {
        if self.is_closed() {
            return Err(RejectError::Shutdown {
                pool: self.pool.clone(),
            });
        }
        let deadline = Instant::now().checked_add(timeout);
        let mut items = self.items.lock();
        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(RejectError::Cancelled {
                    pool: self.pool.clone(),
                });
            }
            if items.len() < self.capacity {
                items.push_back(task);
                self.not_empty.notify_one();
                return Ok(true);
            }
            let wait = match deadline {
                Some(d) => match d.checked_duration_since(Instant::now()) {
                    Some(left) if !left.is_zero() => left,
                    _ => return Ok(false),
                },
                None => CANCEL_POLL,
            };
            let wait = if cancel.is_some() { wait.min(CANCEL_POLL) } else { wait };
            self.not_full.wait_for(&mut items, wait);
        }
    }

    /// Removes and returns the oldest task without running it.
    pub fn dequeue(&self) -> Option<TaskRef> {
        let task = self.pop();
        if task.is_some() {
            self.occupancy.in_flight.decrement();
        }
        task
    }

    /// Removes `task` (by identity). Returns `false` when it was not queued.
    pub fn remove(&self, task: &TaskRef) -> bool {
        let removed = self.remove_uncounted(task);
        if removed {
            self.occupancy.in_flight.decrement();
        }
        removed
    }

    /// Takes up to `max_items` tasks (all when `None`) in FIFO order.
    pub fn drain(&self, max_items: Option<usize>) -> Vec<TaskRef> {
        let drained: Vec<TaskRef> = {
            let mut items = self.items.lock();
            let n = max_items.map_or(items.len(), |m| m.min(items.len()));
            items.drain(..n).collect()
        };
        if !drained.is_empty() {
            self.not_full.notify_all();
            self.compensate(drained.len());
        }
        drained
    }

    /// Drops every queued task. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let n = {
            let mut items = self.items.lock();
            let n = items.len();
            items.clear();
            n
        };
        if n > 0 {
            self.not_full.notify_all();
            self.compensate(n);
        }
        n
    }

    fn compensate(&self, n: usize) {
        self.occupancy
            .in_flight
            .adjust(-isize::try_from(n).unwrap_or(isize::MAX));
    }

    fn offer(&self, task: TaskRef) -> bool {
        let mut items = self.items.lock();
        if items.len() >= self.capacity {
            return false;
        }
        items.push_back(task);
        self.not_empty.notify_one();
        true
    }

    fn pop(&self) -> Option<TaskRef> {
        let task = self.items.lock().pop_front();
        if task.is_some() {
            self.not_full.notify_one();
        }
        task
    }

    /// Identity removal that leaves accounting to the caller.
    pub(crate) fn remove_uncounted(&self, task: &TaskRef) -> bool {
        let removed = {
            let mut items = self.items.lock();
            match items.iter().position(|t| same_task(t, task)) {
                Some(idx) => items.remove(idx).is_some(),
                None => false,
            }
        };
        if removed {
            self.not_full.notify_one();
        }
        removed
    }

    /// Worker path: blocks until a task is available. Returns `None` once the
    /// queue is closed and empty, or after [`wake_takers`](Self::wake_takers).
    pub(crate) fn take(&self) -> Option<TaskRef> {
        let mut items = self.items.lock();
        let epoch = self.wakeups.load(Ordering::Acquire);
        loop {
            if let Some(task) = items.pop_front() {
                self.not_full.notify_one();
                return Some(task);
            }
            if self.is_closed() || self.wakeups.load(Ordering::Acquire) != epoch {
                return None;
            }
            self.not_empty.wait(&mut items);
        }
    }

    /// Releases every worker blocked in [`take`](Self::take) so it re-reads its
    /// idle policy.
    pub(crate) fn wake_takers(&self) {
        let _items = self.items.lock();
        self.wakeups.fetch_add(1, Ordering::AcqRel);
        self.not_empty.notify_all();
    }

    /// Worker path: like [`take`](Self::take) but gives up after `timeout`.
    pub(crate) fn poll_timeout(&self, timeout: Duration) -> Option<TaskRef> {
        let deadline = Instant::now().checked_add(timeout);
        let mut items = self.items.lock();
        loop {
            if let Some(task) = items.pop_front() {
                self.not_full.notify_one();
                return Some(task);
            }
            if self.is_closed() {
                return None;
            }
            match deadline {
                Some(d) => {
                    if self.not_empty.wait_until(&mut items, d).timed_out() {
                        let task = items.pop_front();
                        if task.is_some() {
                            self.not_full.notify_one();
                        }
                        return task;
                    }
                }
                None => self.not_empty.wait(&mut items),
            }
        }
    }

    /// Stops blocking waits; queued tasks stay available to workers.
    pub(crate) fn close(&self) {
        let _items = self.items.lock();
        self.closed.store(true, Ordering::Release);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for AdmissionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionQueue")
            .field("pool", &self.pool)
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskFn;
    use std::sync::atomic::Ordering;
    use std::thread;

    fn queue(capacity: usize, core: usize, max: usize) -> (AdmissionQueue, Arc<Occupancy>) {
        let occ = Arc::new(Occupancy::new(core, max));
        (AdmissionQueue::new("q", capacity, Arc::clone(&occ)), occ)
    }

    fn noop() -> TaskRef {
        TaskFn::arc("noop", || {})
    }

    #[test]
    fn idle_worker_admits_into_queue() {
        let (q, occ) = queue(4, 1, 4);
        occ.workers.store(2, Ordering::SeqCst);
        occ.in_flight.adjust(1);
        assert!(q.enqueue(noop(), Origin::Submission));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn growth_room_refuses_even_with_free_slots() {
        let (q, occ) = queue(4, 1, 4);
        occ.workers.store(2, Ordering::SeqCst);
        occ.in_flight.adjust(2);
        assert!(!q.enqueue(noop(), Origin::Submission));
        assert!(q.is_empty());
    }

    #[test]
    fn at_capacity_falls_back_to_bounded_offer() {
        let (q, occ) = queue(1, 1, 2);
        occ.workers.store(2, Ordering::SeqCst);
        occ.in_flight.adjust(3);
        assert!(q.enqueue(noop(), Origin::Submission));
        assert!(!q.enqueue(noop(), Origin::Submission));
        assert_eq!(q.remaining_capacity(), 0);
    }

    #[test]
    fn rejection_handler_origin_counts_accepted_tasks() {
        let (q, occ) = queue(1, 1, 8);
        assert!(q.enqueue(noop(), Origin::RejectionHandler));
        assert_eq!(occ.in_flight.get(), 1);
        assert!(!q.enqueue(noop(), Origin::RejectionHandler));
        assert_eq!(occ.in_flight.get(), 1);
    }

    #[test]
    fn removal_paths_compensate_in_flight() {
        let (q, occ) = queue(8, 1, 1);
        occ.workers.store(1, Ordering::SeqCst);
        let tasks: Vec<TaskRef> = (0..5).map(|_| noop()).collect();
        for t in &tasks {
            occ.in_flight.increment();
            assert!(q.enqueue(Arc::clone(t), Origin::Submission));
        }
        assert_eq!(occ.in_flight.get(), 5);

        assert!(q.remove(&tasks[2]));
        assert!(!q.remove(&tasks[2]));
        assert_eq!(occ.in_flight.get(), 4);

        let oldest = q.dequeue().unwrap();
        assert!(Arc::ptr_eq(&oldest, &tasks[0]));
        assert_eq!(occ.in_flight.get(), 3);

        assert_eq!(q.drain(Some(1)).len(), 1);
        assert_eq!(occ.in_flight.get(), 2);

        assert_eq!(q.clear(), 2);
        assert_eq!(occ.in_flight.get(), 0);
        assert!(q.dequeue().is_none());
    }

    #[test]
    fn worker_paths_leave_counter_alone() {
        let (q, occ) = queue(2, 1, 1);
        occ.workers.store(1, Ordering::SeqCst);
        occ.in_flight.increment();
        assert!(q.enqueue(noop(), Origin::Submission));
        assert!(q.take().is_some());
        assert!(q.poll_timeout(Duration::from_millis(1)).is_none());
        assert_eq!(occ.in_flight.get(), 1);
    }

    #[test]
    fn retry_offer_times_out_when_full() {
        let (q, _occ) = queue(1, 1, 1);
        assert_eq!(q.try_enqueue_timeout(noop(), Duration::ZERO, None), Ok(true));
        assert_eq!(q.try_enqueue_timeout(noop(), Duration::ZERO, None), Ok(false));
        assert_eq!(
            q.try_enqueue_timeout(noop(), Duration::from_millis(20), None),
            Ok(false)
        );
    }

    #[test]
    fn retry_offer_waits_for_space() {
        let (q, _occ) = queue(1, 1, 1);
        let q = Arc::new(q);
        assert_eq!(q.try_enqueue_timeout(noop(), Duration::ZERO, None), Ok(true));
        let consumer = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                q.take()
            })
        };
        let accepted = q.try_enqueue_timeout(noop(), Duration::from_secs(5), None);
        assert_eq!(accepted, Ok(true));
        assert!(consumer.join().unwrap().is_some());
    }

    #[test]
    fn retry_offer_reports_cancellation_and_shutdown() {
        let (q, _occ) = queue(1, 1, 1);
        let token = CancellationToken::new();
        token.cancel();
        let err = q.try_enqueue_timeout(noop(), Duration::ZERO, Some(&token)).unwrap_err();
        assert!(err.is_cancelled());
        assert!(token.is_cancelled());

        q.close();
        let err = q.try_enqueue_timeout(noop(), Duration::ZERO, None).unwrap_err();
        assert_eq!(err, RejectError::Shutdown { pool: "q".into() });
    }

    #[test]
    fn retry_offer_cancelled_while_waiting() {
        let (q, _occ) = queue(1, 1, 1);
        assert_eq!(q.try_enqueue_timeout(noop(), Duration::ZERO, None), Ok(true));
        let token = CancellationToken::new();
        let canceller = {
            let token = token.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                token.cancel();
            })
        };
        let err = q
            .try_enqueue_timeout(noop(), Duration::from_secs(10), Some(&token))
            .unwrap_err();
        canceller.join().unwrap();
        assert!(err.is_cancelled());
    }

    #[test]
    fn close_wakes_blocked_takers() {
        let (q, _occ) = queue(1, 1, 1);
        let q = Arc::new(q);
        let taker = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.take())
        };
        thread::sleep(Duration::from_millis(20));
        q.close();
        assert!(taker.join().unwrap().is_none());
    }

    #[test]
    fn wake_takers_releases_idle_workers_without_closing() {
        let (q, _occ) = queue(1, 1, 1);
        let q = Arc::new(q);
        let taker = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.take())
        };
        thread::sleep(Duration::from_millis(20));
        q.wake_takers();
        assert!(taker.join().unwrap().is_none());
        assert!(!q.is_closed());
        assert!(q.enqueue(noop(), Origin::RejectionHandler));
    }
}
