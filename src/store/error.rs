//! Error types for store operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the store engine and its persistence adapter
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is absent (Get, Update, Delete)
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// Set was called on a key that is already present
    #[error("key already exists: {key}")]
    AlreadyExists { key: String },

    /// Reading or writing the snapshot file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The snapshot file exists but is not a valid snapshot
    #[error("malformed snapshot {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory map could not be encoded
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    pub(crate) fn not_found(key: &str) -> Self {
        StoreError::NotFound { key: key.to_string() }
    }

    pub(crate) fn already_exists(key: &str) -> Self {
        StoreError::AlreadyExists { key: key.to_string() }
    }

    /// Whether this error comes from the persistence side rather than a key lookup
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            StoreError::Io { .. } | StoreError::Malformed { .. } | StoreError::Encode(_)
        )
    }
}
