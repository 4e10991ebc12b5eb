//! Entry structure for key-value pairs

use super::clock::deadline_after;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A stored value and its expiry deadline
///
/// This is also the on-disk shape of each snapshot record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// The value
    pub value: String,

    /// Absolute expiration time
    pub expire_at: DateTime<Utc>,
}

impl Entry {
    /// Create an entry with an absolute deadline
    pub fn new(value: impl Into<String>, expire_at: DateTime<Utc>) -> Self {
        Entry {
            value: value.into(),
            expire_at,
        }
    }

    /// Create an entry that expires `ttl` after `now`
    pub fn with_ttl(value: impl Into<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self::new(value, deadline_after(now, ttl))
    }

    /// An entry is expired once its deadline is at or before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at <= now
    }

    /// Replace the value, keeping the deadline
    pub fn replace_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }
}
