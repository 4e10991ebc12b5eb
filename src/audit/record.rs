//! Audit record format
//!
//! Line format: `<rfc3339 timestamp> | <OPERATION> | <key> | <STATUS>`

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Store operation being audited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOp {
    Read,
    Set,
    Update,
    Delete,
    /// Removal of an expired key by the sweeper
    Cleanup,
}

impl AuditOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditOp::Read => "READ",
            AuditOp::Set => "SET",
            AuditOp::Update => "UPDATE",
            AuditOp::Delete => "DELETE",
            AuditOp::Cleanup => "CLEANUP",
        }
    }
}

/// Outcome of an audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Success,
    Failed,
    Expired,
}

impl AuditStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditStatus::Success => "SUCCESS",
            AuditStatus::Failed => "FAILED",
            AuditStatus::Expired => "Expired",
        }
    }
}

/// One audit line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub op: AuditOp,
    pub key: String,
    pub status: AuditStatus,
}

impl AuditRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        op: AuditOp,
        key: impl Into<String>,
        status: AuditStatus,
    ) -> Self {
        AuditRecord {
            timestamp,
            op,
            key: key.into(),
            status,
        }
    }
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.op.as_str(),
            self.key,
            self.status.as_str()
        )
    }
}
