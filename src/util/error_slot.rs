//! First-write-wins error capture shared by workers and deadline watchdogs.

use crate::error::Error;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct Inner {
    err: Option<Error>,
    written: bool,
}

/// Accepts at most one error, ever. Every worker and watchdog may race on
/// `set`; exactly one wins and all later errors are dropped on the floor.
/// The slot stays latched after `take`, so a straggler finishing an abandoned
/// task cannot refill it behind a completed `wait`.
#[derive(Debug, Default)]
pub struct ErrorSlot {
    present: AtomicBool,
    inner: Mutex<Inner>,
}

impl ErrorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `err` if the slot has never been written. Returns true only for
    /// the first writer, which is the caller's cue to start pool closure.
    pub fn set(&self, err: Error) -> bool {
        let mut inner = self.inner.lock();
        if inner.written {
            return false;
        }
        inner.written = true;
        inner.err = Some(err);
        self.present.store(true, Ordering::Release);
        true
    }

    /// Lock-free check for a captured error that has not been taken yet.
    pub fn is_set(&self) -> bool {
        self.present.load(Ordering::Acquire)
    }

    /// Apply a predicate to the captured error without removing it.
    pub fn matches(&self, f: impl FnOnce(&Error) -> bool) -> bool {
        self.inner.lock().err.as_ref().map_or(false, f)
    }

    /// Remove and return the captured error, if any. Does not unlatch the
    /// slot: later `set` calls still lose.
    pub fn take(&self) -> Option<Error> {
        let mut inner = self.inner.lock();
        let err = inner.err.take();
        if err.is_some() {
            self.present.store(false, Ordering::Release);
        }
        err
    }
}
