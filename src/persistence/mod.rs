//! Snapshot persistence module
//!
//! The store is persisted as a full JSON snapshot, rewritten either on a
//! fixed period or once enough mutations have accumulated.

mod snapshot;
mod scheduler;

pub use snapshot::SnapshotFile;
pub use scheduler::{SnapshotPolicy, SnapshotScheduler};

/// Why a snapshot check was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotTrigger {
    /// The periodic timer fired; always saves
    Periodic,
    /// The mutation counter poll; saves only at the threshold
    Count,
    /// Final save while shutting down; always saves
    Shutdown,
}

impl SnapshotTrigger {
    /// Whether this trigger saves regardless of the mutation counter
    pub fn is_forced(self) -> bool {
        matches!(self, SnapshotTrigger::Periodic | SnapshotTrigger::Shutdown)
    }
}

/// Result of a snapshot check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The snapshot was written with this many entries
    Saved { entries: usize },
    /// Below the threshold; nothing written
    Skipped { pending: u64 },
}
