#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use eagerpool::{TaskFn, TaskRef};

/// One-shot gate that blocks tasks until opened.
#[derive(Clone, Default)]
pub struct Latch {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        let (lock, cv) = &*self.inner;
        *lock.lock().unwrap() = true;
        cv.notify_all();
    }

    pub fn wait(&self) {
        let (lock, cv) = &*self.inner;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cv.wait(open).unwrap();
        }
    }
}

/// Task that blocks on `latch`.
pub fn blocking(latch: &Latch) -> TaskRef {
    let latch = latch.clone();
    TaskFn::arc("blocking", move || latch.wait())
}

/// Task that bumps `hits` when it runs.
pub fn counting(name: &'static str, hits: &Arc<AtomicUsize>) -> TaskRef {
    let hits = Arc::clone(hits);
    TaskFn::arc(name, move || {
        hits.fetch_add(1, Ordering::SeqCst);
    })
}

/// Polls `cond` until it holds or five seconds pass.
pub fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}
