//! The work pool: fixed worker set, dispatcher, deadline enforcement, and
//! fail-fast teardown.
//!
//! Submissions land in the unbounded [`BlockingQueue`]; a dispatcher thread
//! pumps them into a bounded ready channel in FIFO order; workers consume
//! from the channel. The first task error, panic, or missed deadline closes
//! the pool: queued tasks are drained without execution and [`WorkPool::wait`]
//! surfaces that first error.

pub mod dispatcher;
pub mod task;
pub mod worker;

pub use task::{TaskHandle, TaskId};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::queue::BlockingQueue;
use crate::util::{Backoff, ErrorSlot};
use crossbeam_channel::{bounded, Receiver, Sender};
use dispatcher::Dispatcher;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use task::Task;
use worker::Worker;

/// State shared between the pool handle, the dispatcher, the workers, and
/// the deadline watchdogs.
pub(crate) struct Shared {
    pub(crate) queue: BlockingQueue<Task>,
    pub(crate) error: ErrorSlot,
    closed: AtomicBool,
    dispatching: AtomicBool,
    timeout_ns: AtomicU64,
    active: AtomicUsize,
    workers_exited: AtomicUsize,
}

impl Shared {
    fn new() -> Self {
        Self {
            queue: BlockingQueue::new(),
            error: ErrorSlot::new(),
            closed: AtomicBool::new(false),
            dispatching: AtomicBool::new(true),
            timeout_ns: AtomicU64::new(0),
            active: AtomicUsize::new(0),
            workers_exited: AtomicUsize::new(0),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Monotonic: once closed, no further task is executed.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(crate) fn is_dispatching(&self) -> bool {
        self.dispatching.load(Ordering::Acquire)
    }

    pub(crate) fn finish_dispatch(&self) {
        self.dispatching.store(false, Ordering::Release);
    }

    pub(crate) fn set_timeout(&self, timeout: Duration) {
        self.timeout_ns
            .store(timeout.as_nanos() as u64, Ordering::Release);
    }

    /// Deadline applied to the next dispatched task, if any.
    pub(crate) fn task_timeout(&self) -> Option<Duration> {
        match self.timeout_ns.load(Ordering::Acquire) {
            0 => None,
            ns => Some(Duration::from_nanos(ns)),
        }
    }

    pub(crate) fn task_started(&self) {
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn task_finished(&self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn worker_exited(&self) {
        self.workers_exited.fetch_add(1, Ordering::Release);
    }

    fn exited_workers(&self) -> usize {
        self.workers_exited.load(Ordering::Acquire)
    }
}

struct WorkerHandle {
    #[allow(dead_code)]
    id: usize,
    thread: Option<JoinHandle<()>>,
}

/// Bounded concurrent work pool with fail-fast error propagation.
///
/// ```no_run
/// use weir::WorkPool;
///
/// let mut pool = WorkPool::new(4).unwrap();
/// for i in 0..16 {
///     pool.submit(move || {
///         println!("task {}", i);
///         Ok(())
///     });
/// }
/// pool.wait().unwrap();
/// ```
pub struct WorkPool {
    shared: Arc<Shared>,
    ready_tx: Option<Sender<Task>>,
    ready_rx: Receiver<Task>,
    dispatcher: Option<JoinHandle<()>>,
    workers: Vec<WorkerHandle>,
}

impl WorkPool {
    /// Create a pool with a fixed number of workers, clamped to at least one.
    /// Workers and the dispatcher start immediately.
    pub fn new(max_workers: usize) -> Result<Self> {
        let config = Config {
            max_workers: Some(max_workers.max(1)),
            ..Config::default()
        };
        Self::with_config(config)
    }

    /// Create a pool from a validated [`Config`].
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let max_workers = config.worker_threads();
        let shared = Arc::new(Shared::new());
        if let Some(timeout) = config.task_timeout {
            shared.set_timeout(timeout);
        }

        let (ready_tx, ready_rx) = bounded::<Task>(config.ready_slots());

        // Workers first, dispatcher last. Until the dispatcher exists,
        // `ready_tx` here is the only sender, so bailing out of this function
        // with `?` disconnects the channel and any already-spawned workers
        // exit on their own instead of blocking forever.
        let mut workers = Vec::with_capacity(max_workers);
        for id in 0..max_workers {
            let worker = Worker::new(id, shared.clone(), ready_rx.clone());

            let mut builder =
                thread::Builder::new().name(format!("{}-{}", config.thread_name_prefix, id));
            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let thread = builder
                .spawn(move || worker.run())
                .map_err(|e| Error::pool(format!("spawn worker failed: {}", e)))?;

            workers.push(WorkerHandle {
                id,
                thread: Some(thread),
            });
        }

        let dispatcher = {
            let pump = Dispatcher::new(shared.clone(), ready_tx.clone());
            thread::Builder::new()
                .name(format!("{}-dispatch", config.thread_name_prefix))
                .spawn(move || pump.run())
                .map_err(|e| Error::pool(format!("spawn dispatcher failed: {}", e)))?
        };

        Ok(Self {
            shared,
            ready_tx: Some(ready_tx),
            ready_rx,
            dispatcher: Some(dispatcher),
            workers,
        })
    }

    /// Set the per-task deadline for subsequently dispatched tasks.
    /// `Duration::ZERO` disables it. Set it before the first submission for
    /// uniform effect; already-dispatched tasks are not retroactively covered.
    pub fn set_timeout(&self, timeout: Duration) {
        self.shared.set_timeout(timeout);
    }

    /// Fire-and-forget submission. Never blocks; a no-op once the pool is
    /// closed (the dropped submission is not reported as an error).
    pub fn submit<F>(&self, f: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        if self.is_closed() {
            return;
        }
        self.shared.queue.push(Task::new(f));
    }

    /// Synchronous submission: blocks the caller until the task has run, or
    /// until the pool discards it during fail-fast drain. The completion
    /// sender lives inside the wrapped closure, so a discarded task
    /// disconnects the channel and unblocks the caller instead of deadlocking.
    /// The configured deadline applies like it does to any other task.
    pub fn submit_wait<F>(&self, f: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        if self.is_closed() {
            return;
        }

        let (done_tx, done_rx) = bounded::<()>(1);
        self.shared.queue.push(Task::new(move || {
            let outcome = f();
            let _ = done_tx.send(());
            outcome
        }));

        // Ok: task ran. Err: task was dropped unexecuted.
        let _ = done_rx.recv();
    }

    /// Block until all accepted work is drained, tear the pool down, and
    /// return the first captured error, if any.
    ///
    /// Terminal: submissions after `wait` are dropped. A second call is a
    /// no-op returning `Ok(())`. A worker still inside a task that missed its
    /// deadline is detached rather than joined; the task finishes on its own
    /// after `wait` has returned.
    pub fn wait(&mut self) -> Result<()> {
        if self.ready_tx.is_none() {
            // Already torn down by a previous wait.
            return match self.shared.error.take() {
                Some(err) => Err(err),
                None => Ok(()),
            };
        }

        self.shared.queue.wait();
        self.shared.queue.close();
        self.wait_drained();

        // Disconnect the ready channel; workers exit once it is drained.
        self.ready_tx.take();
        if let Some(handle) = self.dispatcher.take() {
            let _ = handle.join();
        }

        // Block until every worker has left its loop, or until a missed
        // deadline shows up in the slot. In the latter case the worker still
        // inside the abandoned task is detached, not awaited.
        let backoff = Backoff::new();
        let abandon = loop {
            if self.shared.exited_workers() == self.workers.len() {
                break false;
            }
            if self.shared.error.matches(Error::is_deadline) {
                break true;
            }
            backoff.snooze();
        };

        for worker in &mut self.workers {
            match worker.thread.take() {
                Some(handle) if !abandon => {
                    let _ = handle.join();
                }
                _ => {}
            }
        }

        self.shared.close();
        match self.shared.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// True iff no task is waiting in the queue or the ready channel.
    /// Non-blocking; does not imply idle workers.
    pub fn is_done(&self) -> bool {
        self.shared.queue.is_empty() && self.ready_rx.is_empty()
    }

    /// True once the pool has stopped executing new tasks, whether through an
    /// error, a missed deadline, or `wait`.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Tasks accepted but not yet picked up by a worker.
    pub fn pending_tasks(&self) -> usize {
        self.shared.queue.len() + self.ready_rx.len()
    }

    /// Tasks currently executing.
    pub fn active_workers(&self) -> usize {
        self.shared.active.load(Ordering::Relaxed)
    }

    fn wait_drained(&self) {
        let backoff = Backoff::new();
        loop {
            if self.is_done() && !self.shared.is_dispatching() {
                break;
            }
            backoff.snooze();
        }
    }
}

impl std::fmt::Debug for WorkPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkPool")
            .field("workers", &self.workers.len())
            .field("closed", &self.is_closed())
            .field("pending", &self.pending_tasks())
            .finish()
    }
}

impl Drop for WorkPool {
    fn drop(&mut self) {
        self.shared.close();
        self.shared.queue.close();
        self.ready_tx.take();

        if let Some(handle) = self.dispatcher.take() {
            let _ = handle.join();
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.thread.take() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_empty_pool_wait_returns_promptly() {
        let mut pool = WorkPool::new(1).unwrap();
        assert!(pool.wait().is_ok());
    }

    #[test]
    fn test_tasks_all_run() {
        let mut pool = WorkPool::new(4).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..64 {
            let counter = counter.clone();
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        assert!(pool.wait().is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 64);
    }

    #[test]
    fn test_submit_wait_blocks_until_done() {
        let pool = WorkPool::new(2).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        {
            let log = log.clone();
            pool.submit_wait(move || {
                log.lock().push("task");
                Ok(())
            });
        }
        log.lock().push("after");

        let entries = log.lock().clone();
        assert_eq!(entries, vec!["task", "after"]);
    }

    #[test]
    fn test_wait_twice_is_safe() {
        let mut pool = WorkPool::new(2).unwrap();
        pool.submit(|| Ok(()));
        assert!(pool.wait().is_ok());
        assert!(pool.wait().is_ok());
    }

    #[test]
    fn test_submit_after_wait_is_dropped() {
        let mut pool = WorkPool::new(2).unwrap();
        pool.wait().unwrap();

        let ran = Arc::new(AtomicBool::new(false));
        {
            let ran = ran.clone();
            pool.submit(move || {
                ran.store(true, Ordering::SeqCst);
                Ok(())
            });
        }
        assert!(pool.is_closed());
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_zero_workers_clamped() {
        let mut pool = WorkPool::new(0).unwrap();
        let ran = Arc::new(AtomicBool::new(false));
        {
            let ran = ran.clone();
            pool.submit(move || {
                ran.store(true, Ordering::SeqCst);
                Ok(())
            });
        }
        pool.wait().unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }
}
