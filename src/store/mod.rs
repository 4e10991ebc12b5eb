//! In-memory storage module
//!
//! Provides the guarded key-value map, its entries and expiry deadlines.
//! This module knows nothing about HTTP; the web layer maps its errors.

mod clock;
mod entry;
mod error;
mod memory;

pub use clock::{deadline_after, Clock, ManualClock, SystemClock};
pub use entry::Entry;
pub use error::StoreError;
pub use memory::KvStore;
