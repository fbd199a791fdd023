//! weir - bounded work pool with backpressure and fail-fast shutdown
//!
//! A fixed set of worker threads executes fail-able closures in submission
//! order. Submissions never block: they land in an unbounded blocking queue
//! that a dispatcher thread drains into a bounded ready channel, which is
//! where backpressure actually applies. The first task error, caught panic,
//! or missed per-task deadline closes the pool; remaining tasks are drained
//! without running and [`WorkPool::wait`] returns that first error.
//!
//! # Quick Start
//!
//! ```no_run
//! use weir::prelude::*;
//! use std::time::Duration;
//!
//! let mut pool = WorkPool::new(4)?;
//! pool.set_timeout(Duration::from_secs(5));
//!
//! for batch in 0..100 {
//!     pool.submit(move || {
//!         // process batch
//!         let _ = batch;
//!         Ok(())
//!     });
//! }
//!
//! pool.wait()?;
//! # Ok::<(), weir::Error>(())
//! ```
//!
//! # Guarantees
//!
//! - **Bounded concurrency**: at most `max_workers` tasks run at once.
//! - **FIFO dispatch**: tasks reach the ready channel in submission order;
//!   completion order across workers is unspecified.
//! - **Fail-fast**: the first failure wins, later ones are dropped, and no
//!   new task starts after closure.
//! - **Cooperative deadlines**: a timed-out task is abandoned, not preempted;
//!   it finishes on its own after the pool has begun shutting down.

#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod pool;
pub mod prelude;
pub mod queue;
pub mod util;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use pool::{TaskHandle, TaskId, WorkPool};
pub use queue::{BlockingQueue, TryPop};
