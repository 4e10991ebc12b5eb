//! ttlkv - A small in-memory key-value store served over HTTP
//!
//! Entries carry an expiry deadline and are removed by a background sweeper.
//! The whole map is snapshotted to a JSON file on a timer or after enough
//! writes, and reloaded at startup.
//!
//! - `store`: the guarded map and its operations
//! - `expiry`: the background sweeper
//! - `persistence`: the snapshot file and its scheduler
//! - `audit`: the append-only operation log
//! - `web`: the HTTP routes

pub mod audit;
pub mod config;
pub mod expiry;
pub mod persistence;
pub mod store;
pub mod web;

/// Re-export commonly used types
pub use audit::AuditLog;
pub use config::Config;
pub use persistence::{SnapshotFile, SnapshotTrigger};
pub use store::{Entry, KvStore, StoreError};
