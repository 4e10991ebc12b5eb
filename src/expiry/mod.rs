//! Active expiry module

mod sweeper;

pub use sweeper::{ExpiryConfig, ExpirySweeper};
