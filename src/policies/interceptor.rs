//! # Rejection interceptor.
//!
//! Decorates the configured [`RejectionStrategy`] with the bookkeeping every
//! rejection needs, whatever the strategy does:
//!
//! ```text
//! intercept(task)
//!   ├─ rejected_total += 1
//!   ├─ AlertGate::consider(rejected_total)
//!   ├─ strategy.rejected(task, RejectContext)
//!   │     ├─ Ok(())  ──► in_flight -= 1  (task will never complete normally)
//!   │     └─ Err(e)  ──► propagate; the pool compensates after its retry
//!   └─ result
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::alert::AlertGate;
use crate::core::Shared;
use crate::error::RejectError;
use crate::policies::{RejectContext, RejectionStrategy};
use crate::tasks::TaskRef;

pub(crate) struct RejectionInterceptor {
    inner: Arc<dyn RejectionStrategy>,
    rejected: Arc<AtomicU64>,
    gate: AlertGate,
}

impl RejectionInterceptor {
    pub(crate) fn new(
        inner: Arc<dyn RejectionStrategy>,
        rejected: Arc<AtomicU64>,
        gate: AlertGate,
    ) -> Self {
        Self {
            inner,
            rejected,
            gate,
        }
    }

    pub(crate) fn gate(&self) -> &AlertGate {
        &self.gate
    }

    pub(crate) fn rejected_total(&self) -> u64 {
        self.rejected.load(Ordering::Acquire)
    }

    pub(crate) fn intercept(&self, task: TaskRef, pool: &Shared) -> Result<(), RejectError> {
        let total = self.rejected.fetch_add(1, Ordering::AcqRel) + 1;
        self.gate.consider(total, || pool.snapshot());

        let ctx = RejectContext::new(pool);
        match self.inner.rejected(task, &ctx) {
            Ok(()) => {
                pool.occupancy().in_flight.decrement();
                Ok(())
            }
            Err(err) => {
                debug!(
                    pool = %pool.name(),
                    strategy = self.inner.name(),
                    label = err.as_label(),
                    "rejection strategy refused task"
                );
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for RejectionInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RejectionInterceptor")
            .field("strategy", &self.inner.name())
            .field("rejected", &self.rejected_total())
            .field("gate", &self.gate)
            .finish()
    }
}
