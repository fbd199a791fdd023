//! Worker loop and per-task deadline watchdog.

use super::task::Task;
use super::Shared;
use crate::error::Error;
use crossbeam_channel::{after, bounded, select, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub(crate) struct Worker {
    pub id: usize,
    shared: Arc<Shared>,
    ready: Receiver<Task>,
}

impl Worker {
    pub fn new(id: usize, shared: Arc<Shared>, ready: Receiver<Task>) -> Self {
        Self { id, shared, ready }
    }

    /// Main loop. Ends once the ready channel is disconnected and drained.
    /// After the pool closes, remaining tasks are received and dropped
    /// without execution so the channel drains and teardown can proceed.
    pub fn run(self) {
        for task in self.ready.iter() {
            if self.shared.is_closed() {
                continue;
            }
            self.execute(task);
        }
        self.shared.worker_exited();
    }

    fn execute(&self, task: Task) {
        let watchdog = self
            .shared
            .task_timeout()
            .map(|deadline| Watchdog::arm(self.shared.clone(), deadline));

        let id = task.id;
        self.shared.task_started();
        let outcome = task.run();
        self.shared.task_finished();
        drop(watchdog);

        if let Err(err) = outcome {
            if matches!(err, Error::TaskPanicked(_)) {
                eprintln!("task {:?} panicked on worker {}", id, self.id);
            }
            // First error wins; the winner closes the pool.
            if self.shared.error.set(err) {
                self.shared.close();
            }
        }
    }
}

/// Races a task's completion against its deadline on a background thread.
///
/// If the deadline fires first the watchdog records `DeadlineExceeded` and
/// closes the pool; the in-flight task is not preempted, only un-awaited.
/// Dropping the watchdog disconnects the done channel and disarms it.
struct Watchdog {
    _done: Sender<()>,
}

impl Watchdog {
    fn arm(shared: Arc<Shared>, deadline: Duration) -> Self {
        let (done_tx, done_rx) = bounded::<()>(1);

        thread::spawn(move || {
            select! {
                recv(after(deadline)) -> _ => {
                    if shared.error.set(Error::DeadlineExceeded(deadline)) {
                        shared.close();
                    }
                }
                recv(done_rx) -> _ => {}
            }
        });

        Self { _done: done_tx }
    }
}
