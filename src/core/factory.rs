//! # Worker thread creation.
//!
//! The pool never calls `std::thread::spawn` directly; it asks a
//! [`ThreadFactory`]. The default, [`NamedThreadFactory`], names threads
//! `<pool>-worker-<n>` with `n` starting at 1.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Body of a worker thread.
pub type WorkerBody = Box<dyn FnOnce() + Send + 'static>;

/// Produces worker threads.
///
/// ### Implementation requirements
/// - Run `body` exactly once on a new thread, or return an error and drop it.
/// - Do not run `body` on the calling thread: it blocks until the worker exits.
pub trait ThreadFactory: Send + Sync + 'static {
    /// Starts a thread running `body`.
    fn spawn(&self, body: WorkerBody) -> io::Result<()>;
}

/// Spawns named, detached threads.
#[derive(Debug)]
pub struct NamedThreadFactory {
    prefix: String,
    next: AtomicUsize,
    stack_size: Option<usize>,
}

impl NamedThreadFactory {
    /// Threads are named `<pool>-worker-<n>`.
    pub fn new(pool: &str) -> Self {
        Self {
            prefix: format!("{pool}-worker-"),
            next: AtomicUsize::new(1),
            stack_size: None,
        }
    }

    /// Sets the stack size of spawned threads.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    fn next_name(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{n}", self.prefix)
    }
}

impl ThreadFactory for NamedThreadFactory {
    fn spawn(&self, body: WorkerBody) -> io::Result<()> {
        let mut builder = thread::Builder::new().name(self.next_name());
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        builder.spawn(body).map(drop)
    }
}
