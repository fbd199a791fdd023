//! Queue-to-channel pump.

use super::task::Task;
use super::Shared;
use crossbeam_channel::Sender;
use std::sync::Arc;

/// Single thread draining the blocking queue into the bounded ready channel.
/// One pump per pool keeps dispatch order equal to submission order.
pub(crate) struct Dispatcher {
    shared: Arc<Shared>,
    ready: Sender<Task>,
}

impl Dispatcher {
    pub fn new(shared: Arc<Shared>, ready: Sender<Task>) -> Self {
        Self { shared, ready }
    }

    pub fn run(self) {
        loop {
            let popped = self.shared.queue.pop();

            if self.shared.is_closed() {
                // Fail-fast: stop pumping and seal the queue so blocked
                // submitters and `wait` observe closure. The task popped in
                // this iteration, if any, is discarded with the rest.
                self.shared.queue.close();
                break;
            }

            match popped {
                Some(task) => {
                    // Backpressure point: blocks while the ready channel is
                    // full. Errors only if every receiver is gone, which
                    // means teardown already happened.
                    if self.ready.send(task).is_err() {
                        break;
                    }
                }
                // Queue closed and drained; nothing more will arrive.
                None => break,
            }
        }

        self.shared.finish_dispatch();
    }
}
