//! Audit log module
//!
//! Keeps a line-oriented, append-only record of every store operation
//! (`timestamp | operation | key | status`).

mod record;
mod writer;

pub use record::{AuditOp, AuditRecord, AuditStatus};
pub use writer::AuditLog;
