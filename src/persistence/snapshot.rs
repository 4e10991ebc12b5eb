//! Snapshot file
//!
//! The whole map is stored as one JSON object:
//! `{ "<key>": { "value": "...", "expire_at": "<rfc3339>" }, ... }`

use crate::store::{Entry, StoreError};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Reads and writes the snapshot at a fixed path
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        SnapshotFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn load(&self) -> Result<Option<HashMap<String, Entry>>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                path: self.path.clone(),
                source,
            })
    }

    /// Encode entries as snapshot bytes, keys sorted
    pub fn encode<'a, I>(entries: I) -> Result<Vec<u8>, StoreError>
    where
        I: IntoIterator<Item = (&'a String, &'a Entry)>,
    {
        let sorted: BTreeMap<&String, &Entry> = entries.into_iter().collect();
        serde_json::to_vec_pretty(&sorted).map_err(StoreError::Encode)
    }

    /// Replace the snapshot with `bytes`
    ///
    /// Writes a sibling `.tmp` file, syncs it, then renames it over the target,
    /// so readers never observe a half-written snapshot.
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let tmp_path = self.tmp_path();
        let result = (|| {
            let mut file = File::create(&tmp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(self.io_error(e));
        }
        Ok(())
    }

    /// Encode and write in one step
    pub fn save<'a, I>(&self, entries: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (&'a String, &'a Entry)>,
    {
        let bytes = Self::encode(entries)?;
        self.write_bytes(&bytes)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
