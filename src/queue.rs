//! Condition-variable blocking FIFO between submitters and the dispatcher.
//!
//! The queue is unbounded so that `WorkPool::submit` never blocks a caller;
//! the bounded ready channel downstream is what actually limits in-flight
//! work. Closing is irreversible: it wakes every blocked popper and abandons
//! whatever is still buffered.

use crate::util::Backoff;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Outcome of a non-blocking pop.
#[derive(Debug, PartialEq, Eq)]
pub enum TryPop<T> {
    /// An item was available.
    Item(T),
    /// The queue is open but currently empty; poll again later.
    Empty,
    /// The queue is closed; no more items will ever arrive.
    Closed,
}

/// Thread-safe blocking FIFO.
///
/// A single mutex guards the buffer; `count` and `closed` mirror the guarded
/// state so `len` and `is_closed` stay lock-free. Every mutation that changes
/// emptiness or closedness signals the condvar before the lock is released.
pub struct BlockingQueue<T> {
    buffer: Mutex<VecDeque<T>>,
    popable: Condvar,
    count: AtomicUsize,
    closed: AtomicBool,
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(VecDeque::new()),
            popable: Condvar::new(),
            count: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Append an item and wake one blocked popper. Dropped silently if the
    /// queue is closed.
    pub fn push(&self, item: T) {
        let mut buffer = self.buffer.lock();
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        buffer.push_back(item);
        self.count.fetch_add(1, Ordering::Release);
        self.popable.notify_one();
    }

    /// Blocking pop. Waits while the queue is empty and open; returns `None`
    /// immediately once closed, even if items remain buffered. Callers that
    /// need drain semantics must loop over `try_pop` before closing.
    pub fn pop(&self) -> Option<T> {
        let mut buffer = self.buffer.lock();

        while buffer.is_empty() && !self.closed.load(Ordering::Acquire) {
            self.popable.wait(&mut buffer);
        }

        if self.closed.load(Ordering::Acquire) {
            return None;
        }

        let item = buffer.pop_front();
        if item.is_some() {
            self.count.fetch_sub(1, Ordering::Release);
        }
        item
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> TryPop<T> {
        let mut buffer = self.buffer.lock();

        if self.closed.load(Ordering::Acquire) {
            return TryPop::Closed;
        }

        match buffer.pop_front() {
            Some(item) => {
                self.count.fetch_sub(1, Ordering::Release);
                TryPop::Item(item)
            }
            None => TryPop::Empty,
        }
    }

    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the queue: wake all blocked poppers and abandon buffered items.
    /// Abandoned items are dropped, never handed out. Idempotent.
    pub fn close(&self) {
        let mut buffer = self.buffer.lock();
        if !self.closed.swap(true, Ordering::AcqRel) {
            buffer.clear();
            self.count.store(0, Ordering::Release);
            self.popable.notify_all();
        }
    }

    /// Busy-poll until the queue is closed or empty. Used by the pool to know
    /// that no buffered item is still waiting for dispatch before teardown.
    pub fn wait(&self) {
        let backoff = Backoff::new();
        loop {
            if self.is_closed() || self.is_empty() {
                break;
            }
            backoff.snooze();
        }
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingQueue")
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = BlockingQueue::new();
        for i in 0..8 {
            queue.push(i);
        }
        assert_eq!(queue.len(), 8);
        for i in 0..8 {
            assert_eq!(queue.pop(), Some(i));
        }
    }

    #[test]
    fn test_try_pop_tristate() {
        let queue = BlockingQueue::new();
        assert_eq!(queue.try_pop(), TryPop::<u32>::Empty);

        queue.push(7);
        assert_eq!(queue.try_pop(), TryPop::Item(7));

        queue.close();
        assert_eq!(queue.try_pop(), TryPop::Closed);
    }

    #[test]
    fn test_close_wakes_blocked_popper() {
        let queue = Arc::new(BlockingQueue::<u32>::new());
        let popper = {
            let queue = queue.clone();
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(50));
        queue.close();

        assert_eq!(popper.join().unwrap(), None);
    }

    #[test]
    fn test_push_after_close_is_dropped() {
        let queue = BlockingQueue::new();
        queue.close();
        queue.push(1);
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_close_abandons_buffered_items() {
        let queue = BlockingQueue::new();
        queue.push(1);
        queue.push(2);
        queue.close();

        // Pending items are discarded, not handed out.
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_double_close_is_noop() {
        let queue = BlockingQueue::<u32>::new();
        queue.close();
        queue.close();
        assert!(queue.is_closed());
    }

    #[test]
    fn test_wait_returns_when_drained() {
        let queue = Arc::new(BlockingQueue::new());
        for i in 0..100 {
            queue.push(i);
        }

        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || {
                while let TryPop::Item(_) = queue.try_pop() {
                    thread::yield_now();
                }
            })
        };

        queue.wait();
        assert!(queue.is_empty());
        consumer.join().unwrap();
    }

    #[test]
    fn test_concurrent_producers_single_consumer() {
        let queue = Arc::new(BlockingQueue::new());
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        queue.push(p * 100 + i);
                    }
                })
            })
            .collect();

        let mut seen = 0;
        while seen < 200 {
            if queue.pop().is_some() {
                seen += 1;
            }
        }

        for p in producers {
            p.join().unwrap();
        }
        assert!(queue.is_empty());
    }
}
