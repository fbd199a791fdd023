//! Commonly used imports.
//!
//! ```
//! use weir::prelude::*;
//! ```

pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::pool::{TaskHandle, WorkPool};
pub use crate::queue::{BlockingQueue, TryPop};
