//! # Rolling window counter.
//!
//! Fixed ring of `window / bucket` buckets. Each bucket remembers which
//! `bucket_secs`-wide wall-clock slot last wrote to it; a bucket whose slot is
//! older than the window no longer contributes to the sum.
//!
//! ```text
//! window=60s bucket=5s → 12 buckets
//!
//! slot:  [t-11] [t-10] ... [t-1] [t]       idx = slot % 12
//! sum_last_window() = Σ count where now_slot - slot ∈ [0, 12)
//! ```
//!
//! The count is approximate (error of at most one bucket width), which is what
//! an alert threshold needs; it is not used for exact accounting.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const NEVER: i64 = -1;

/// Approximate sliding-window event counter.
#[derive(Debug)]
pub struct RollingWindowCounter {
    bucket_secs: u64,
    slots: Box<[AtomicI64]>,
    counts: Box<[AtomicU64]>,
}

impl RollingWindowCounter {
    /// Creates a counter covering `window_secs` in buckets of `bucket_secs`.
    ///
    /// Zero values and uneven divisions fall back to 60/5, matching
    /// [`AlertConfig::normalized`](crate::AlertConfig::normalized).
    pub fn new(window_secs: u64, bucket_secs: u64) -> Self {
        let (window, bucket) =
            if window_secs == 0 || bucket_secs == 0 || window_secs % bucket_secs != 0 {
                (60, 5)
            } else {
                (window_secs, bucket_secs)
            };
        let buckets = usize::try_from(window / bucket).unwrap_or(1).max(1);

        Self {
            bucket_secs: bucket,
            slots: (0..buckets).map(|_| AtomicI64::new(NEVER)).collect(),
            counts: (0..buckets).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Number of buckets in the ring.
    pub fn buckets(&self) -> usize {
        self.slots.len()
    }

    /// Records one event now.
    pub fn increment(&self) {
        self.increment_at(now_secs());
    }

    /// Approximate number of events in the trailing window.
    pub fn sum_last_window(&self) -> u64 {
        self.sum_at(now_secs())
    }

    pub(crate) fn increment_at(&self, now_secs: u64) {
        let slot = self.slot_of(now_secs);
        let idx = self.index_of(slot);

        let prev = self.slots[idx].load(Ordering::Acquire);
        if prev != slot
            && self.slots[idx]
                .compare_exchange(prev, slot, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            self.counts[idx].store(0, Ordering::Release);
        }
        self.counts[idx].fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn sum_at(&self, now_secs: u64) -> u64 {
        let now_slot = self.slot_of(now_secs);
        let span = self.slots.len() as i64;

        self.slots
            .iter()
            .zip(self.counts.iter())
            .filter(|(slot, _)| {
                let s = slot.load(Ordering::Acquire);
                s != NEVER && (0..span).contains(&(now_slot - s))
            })
            .map(|(_, count)| count.load(Ordering::Acquire))
            .sum()
    }

    #[inline]
    fn slot_of(&self, now_secs: u64) -> i64 {
        i64::try_from(now_secs / self.bucket_secs).unwrap_or(i64::MAX)
    }

    #[inline]
    fn index_of(&self, slot: i64) -> usize {
        // slot is never negative here.
        (slot.unsigned_abs() % self.slots.len() as u64) as usize
    }
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
