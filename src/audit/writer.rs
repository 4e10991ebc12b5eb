//! Audit log writer
//!
//! Appends one line per store operation to the audit file.

use super::AuditRecord;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Append-only audit log
///
/// Every record is also emitted as a `tracing` event on the `audit` target.
/// Without a file the log is tracing-only.
pub struct AuditLog {
    sink: Option<FileSink>,
}

struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl AuditLog {
    /// Open (or create) the audit file in append mode
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(AuditLog {
            sink: Some(FileSink {
                path,
                file: Mutex::new(file),
            }),
        })
    }

    /// An audit log that only emits tracing events
    pub fn disabled() -> Self {
        AuditLog { sink: None }
    }

    /// Record an operation. Write failures are logged, never returned.
    pub fn record(&self, record: &AuditRecord) {
        info!(
            target: "audit",
            op = record.op.as_str(),
            key = %record.key,
            status = record.status.as_str(),
            "store operation"
        );

        if let Some(ref sink) = self.sink {
            let line = format!("{}\n", record);
            let mut file = sink.file.lock();
            if let Err(e) = file.write_all(line.as_bytes()) {
                warn!("Failed to write audit log {}: {}", sink.path.display(), e);
            }
        }
    }

    /// Force buffered audit data to disk
    pub fn sync(&self) -> io::Result<()> {
        match self.sink {
            Some(ref sink) => sink.file.lock().sync_all(),
            None => Ok(()),
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::disabled()
    }
}
