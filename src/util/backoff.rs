//! Exponential backoff for the busy-poll waits in queue drain and teardown.

use std::hint::spin_loop;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Spin, then yield, then sleep.
#[derive(Debug)]
pub struct Backoff {
    step: AtomicUsize,
}

impl Backoff {
    const SPIN_LIMIT: usize = 6;
    const YIELD_LIMIT: usize = 10;

    pub fn new() -> Self {
        Self {
            step: AtomicUsize::new(0),
        }
    }

    /// Reset to the spin phase.
    pub fn reset(&self) {
        self.step.store(0, Ordering::Relaxed);
    }

    /// Perform one step of backoff.
    pub fn spin(&self) {
        let step = self.step.fetch_add(1, Ordering::Relaxed);

        if step <= Self::SPIN_LIMIT {
            for _ in 0..(1 << step.min(Self::SPIN_LIMIT)) {
                spin_loop();
            }
        } else if step <= Self::YIELD_LIMIT {
            thread::yield_now();
        } else {
            thread::sleep(Duration::from_micros(1));
        }
    }

    /// Longer pause for loops that expect to wait a while (drain polls).
    pub fn snooze(&self) {
        let step = self.step.fetch_add(1, Ordering::Relaxed);

        if step <= Self::YIELD_LIMIT {
            thread::yield_now();
        } else {
            thread::sleep(Duration::from_micros(10));
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
