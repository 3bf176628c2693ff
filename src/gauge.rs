//! # Lock-free pool gauges.
//!
//! [`InFlightCounter`] tracks tasks that were accepted and have not reached a
//! terminal outcome yet (ran, discarded, evicted, removed). [`Occupancy`] bundles
//! it with the worker counters that the admission queue reads on every enqueue.
//!
//! ## Rules
//! - Every adjustment is a single atomic read-modify-write; no locks.
//! - The in-flight value saturates at zero, it is never observed negative.
//! - Adjustments commute: the final value depends only on their sum.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Non-negative counter of accepted-but-unfinished tasks.
///
/// # Example
/// ```
/// use eagerpool::InFlightCounter;
///
/// let c = InFlightCounter::new();
/// c.adjust(2);
/// c.adjust(-5);
/// assert_eq!(c.get(), 0);
/// ```
#[derive(Debug, Default)]
pub struct InFlightCounter {
    value: AtomicUsize,
}

impl InFlightCounter {
    /// Creates a counter at zero.
    pub const fn new() -> Self {
        Self {
            value: AtomicUsize::new(0),
        }
    }

    /// Applies `max(current + delta, 0)` atomically and returns the new value.
    pub fn adjust(&self, delta: isize) -> usize {
        if delta == 0 {
            return self.get();
        }
        let prev = self
            .value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                Some(cur.saturating_add_signed(delta))
            });
        match prev {
            Ok(p) | Err(p) => p.saturating_add_signed(delta),
        }
    }

    #[inline]
    pub fn increment(&self) -> usize {
        self.adjust(1)
    }

    #[inline]
    pub fn decrement(&self) -> usize {
        self.adjust(-1)
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> usize {
        self.value.load(Ordering::Acquire)
    }
}

/// Occupancy view shared by the pool, its workers and the admission queue.
#[derive(Debug)]
pub(crate) struct Occupancy {
    pub(crate) in_flight: InFlightCounter,
    pub(crate) workers: AtomicUsize,
    pub(crate) active: AtomicUsize,
    pub(crate) largest: AtomicUsize,
    pub(crate) completed: AtomicU64,
    pub(crate) core: usize,
    pub(crate) max: usize,
}

impl Occupancy {
    pub(crate) fn new(core: usize, max: usize) -> Self {
        Self {
            in_flight: InFlightCounter::new(),
            workers: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            largest: AtomicUsize::new(0),
            completed: AtomicU64::new(0),
            core,
            max,
        }
    }

    #[inline]
    pub(crate) fn workers(&self) -> usize {
        self.workers.load(Ordering::Acquire)
    }

    /// Reserves one worker slot below `bound`. Returns the new worker count.
    pub(crate) fn try_reserve_worker(&self, bound: usize) -> Option<usize> {
        let reserved = self
            .workers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |wc| {
                (wc < bound).then_some(wc + 1)
            })
            .ok()?
            + 1;
        self.largest.fetch_max(reserved, Ordering::AcqRel);
        Some(reserved)
    }

    /// Releases the slot of a worker that is about to exit.
    pub(crate) fn release_worker(&self) {
        let _ = self
            .workers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |wc| wc.checked_sub(1));
    }

    /// Releases a slot only if the count is still `expected`.
    pub(crate) fn release_worker_if(&self, expected: usize) -> bool {
        expected > 0
            && self
                .workers
                .compare_exchange(expected, expected - 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }
}
