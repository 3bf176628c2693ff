//! # Fire-and-forget alert delivery.
//!
//! [`AlertSink`] is what the gate hands a fired alert to. It must return
//! immediately: the gate runs on submitting and worker threads.
//!
//! [`AlertDispatcher`] is the stock sink. It owns a dedicated thread running a
//! current-thread tokio runtime and forwards alerts to an [`AlertTransport`].
//!
//! ## Architecture
//! ```text
//! AlertGate::consider() ──► AlertDispatcher::deliver()
//!                                 │ try_send (never blocks)
//!                                 ▼
//!                          [bounded queue] ──► sender thread ──► transport.send()
//!                                 │                   └──► Err / panic → logged, dropped
//!                                 └─► full → alert dropped, logged
//! ```
//!
//! ## Rules
//! - Delivery failures are logged at `debug` and never retried.
//! - A panicking transport is isolated with `catch_unwind`; the sender keeps going.
//! - [`AlertSink::close`] drops the queue sender; the thread drains what is queued
//!   and exits.

use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::alert::Alert;
use crate::error::AlertError;

/// Receiver of fired alerts.
///
/// ### Implementation requirements
/// - `deliver` must not block; hand the alert off and return.
/// - Handle errors internally; do not panic.
pub trait AlertSink: Send + Sync + 'static {
    /// Accepts one alert for delivery.
    fn deliver(&self, alert: Alert);

    /// Stops accepting alerts. Called when the owning pool shuts down.
    fn close(&self) {}
}

/// Asynchronous transport used by [`AlertDispatcher`].
#[async_trait]
pub trait AlertTransport: Send + Sync + 'static {
    /// Sends one alert to the external endpoint.
    async fn send(&self, alert: &Alert) -> Result<(), AlertError>;

    /// Returns the transport name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Background alert sender.
pub struct AlertDispatcher {
    sender: Mutex<Option<mpsc::Sender<Alert>>>,
    transport: &'static str,
}

impl AlertDispatcher {
    /// Default queue capacity.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Starts the sender thread (`<pool>-alert-sender`).
    ///
    /// `capacity` is clamped to a minimum of 1.
    pub fn spawn(
        pool: &str,
        transport: Arc<dyn AlertTransport>,
        capacity: usize,
    ) -> io::Result<Self> {
        let (tx, mut rx) = mpsc::channel::<Alert>(capacity.max(1));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let name = transport.name();

        thread::Builder::new()
            .name(format!("{pool}-alert-sender"))
            .spawn(move || {
                runtime.block_on(async move {
                    while let Some(alert) = rx.recv().await {
                        let fut = transport.send(&alert);
                        match AssertUnwindSafe(fut).catch_unwind().await {
                            Ok(Ok(())) => {
                                debug!(pool = %alert.pool, transport = name, "alert delivered");
                            }
                            Ok(Err(e)) => {
                                debug!(
                                    pool = %alert.pool,
                                    transport = name,
                                    label = e.as_label(),
                                    error = %e,
                                    "alert delivery failed"
                                );
                            }
                            Err(_) => {
                                warn!(pool = %alert.pool, transport = name, "alert transport panicked");
                            }
                        }
                    }
                });
            })?;

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            transport: name,
        })
    }
}

impl AlertSink for AlertDispatcher {
    fn deliver(&self, alert: Alert) {
        let guard = self.sender.lock();
        let Some(tx) = guard.as_ref() else {
            debug!(pool = %alert.pool, "alert dispatcher closed; dropping alert");
            return;
        };
        match tx.try_send(alert) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(alert)) => {
                warn!(pool = %alert.pool, transport = self.transport, "alert queue full; dropping alert");
            }
            Err(mpsc::error::TrySendError::Closed(alert)) => {
                debug!(pool = %alert.pool, "alert sender stopped; dropping alert");
            }
        }
    }

    fn close(&self) {
        self.sender.lock().take();
    }
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("transport", &self.transport)
            .field("open", &self.sender.lock().is_some())
            .finish()
    }
}
