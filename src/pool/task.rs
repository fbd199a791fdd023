//! Task representation and panic-safe execution.

use crate::error::{Error, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

/// A submitted unit of work: a no-argument fail-able closure. Ownership moves
/// to the pool on submission; the closure is dropped unexecuted if the pool
/// closes before it is reached.
pub type TaskHandle = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task, used in panic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

pub(crate) struct Task {
    pub(crate) id: TaskId,
    func: TaskHandle,
}

impl Task {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        Task {
            id: TaskId::next(),
            func: Box::new(f),
        }
    }

    /// Execute the closure, converting a panic into an error outcome so a
    /// failing task can never take a worker thread down with it.
    pub fn run(self) -> Result<()> {
        match catch_unwind(AssertUnwindSafe(self.func)) {
            Ok(outcome) => outcome,
            Err(payload) => Err(Error::TaskPanicked(panic_message(payload))),
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
