pub mod backoff;
pub mod error_slot;

pub use backoff::Backoff;
pub use error_slot::ErrorSlot;
