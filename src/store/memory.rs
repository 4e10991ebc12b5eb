//! In-memory storage implementation

use super::clock::{Clock, SystemClock};
use super::entry::Entry;
use super::error::StoreError;
use crate::audit::{AuditLog, AuditOp, AuditRecord, AuditStatus};
use crate::persistence::{SaveOutcome, SnapshotFile, SnapshotTrigger};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Type alias for our hash map with SipHasher
type StoreMap = HashMap<String, Entry, BuildHasherDefault<SipHasher13>>;

/// Map plus the number of writes since the last successful snapshot
struct StoreState {
    map: StoreMap,
    mutations: u64,
}

/// Concurrent key-value store with TTL deadlines
///
/// One reader/writer lock guards the whole map. `get` takes the shared side;
/// `set`, `update`, `delete`, expiry removal and snapshot encoding take the
/// exclusive side. Share it between tasks as `Arc<KvStore>`.
///
/// Reads never expire entries themselves: an entry past its deadline stays
/// visible until the sweeper removes it.
pub struct KvStore {
    state: RwLock<StoreState>,
    snapshot: SnapshotFile,
    audit: AuditLog,
    clock: Arc<dyn Clock>,

    /// Serialises concurrent snapshot writers
    save_lock: Mutex<()>,
}

impl KvStore {
    /// Create an empty store persisting to `snapshot`
    pub fn new(snapshot: SnapshotFile, audit: AuditLog) -> Self {
        Self::with_clock(snapshot, audit, Arc::new(SystemClock))
    }

    /// Create an empty store with a custom time source
    pub fn with_clock(snapshot: SnapshotFile, audit: AuditLog, clock: Arc<dyn Clock>) -> Self {
        KvStore {
            state: RwLock::new(StoreState {
                map: StoreMap::default(),
                mutations: 0,
            }),
            snapshot,
            audit,
            clock,
            save_lock: Mutex::new(()),
        }
    }

    /// Create a store and populate it from its snapshot, best-effort
    ///
    /// A missing file gives an empty store. A load failure is logged and also
    /// gives an empty store.
    pub fn open(snapshot: SnapshotFile, audit: AuditLog) -> Self {
        let store = Self::new(snapshot, audit);
        if let Err(e) = store.load() {
            error!("Error loading snapshot, starting empty: {}", e);
        }
        store
    }

    /// Populate the map from the snapshot file
    ///
    /// Returns the number of entries loaded. Entries already past their
    /// deadline are kept; the next sweep removes them.
    pub fn load(&self) -> Result<usize, StoreError> {
        let loaded = match self.snapshot.load()? {
            Some(loaded) => loaded,
            None => {
                info!(
                    "Snapshot {} does not exist, starting with an empty store",
                    self.snapshot.path().display()
                );
                return Ok(0);
            }
        };

        let count = loaded.len();
        let mut state = self.state.write();
        state.map.extend(loaded);

        info!(
            "Loaded {} entries from {}",
            count,
            self.snapshot.path().display()
        );
        Ok(count)
    }

    /// Get the value for a key
    ///
    /// Expired-but-unswept entries are still returned.
    pub fn get(&self, key: &str) -> Result<String, StoreError> {
        let state = self.state.read();
        match state.map.get(key) {
            Some(entry) => {
                self.audit(AuditOp::Read, key, AuditStatus::Success);
                Ok(entry.value.clone())
            }
            None => {
                self.audit(AuditOp::Read, key, AuditStatus::Failed);
                Err(StoreError::not_found(key))
            }
        }
    }

    /// Insert a new key expiring `ttl` from now
    ///
    /// Never overwrites: an existing key yields `AlreadyExists` and is left
    /// untouched. Use `update` to change an existing value.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let key = key.into();
        let entry = Entry::with_ttl(value, self.clock.now(), ttl);

        let mut state = self.state.write();
        if state.map.contains_key(&key) {
            self.audit(AuditOp::Set, &key, AuditStatus::Failed);
            return Err(StoreError::already_exists(&key));
        }

        state.map.insert(key.clone(), entry);
        state.mutations += 1;
        self.audit(AuditOp::Set, &key, AuditStatus::Success);
        Ok(())
    }

    /// Replace the value of an existing key, keeping its deadline
    ///
    /// Returns `NotFound` when the key is absent.
    pub fn update(&self, key: &str, value: impl Into<String>) -> Result<(), StoreError> {
        let mut state = self.state.write();
        match state.map.get_mut(key) {
            Some(entry) => entry.replace_value(value),
            None => {
                self.audit(AuditOp::Update, key, AuditStatus::Failed);
                return Err(StoreError::not_found(key));
            }
        }

        state.mutations += 1;
        self.audit(AuditOp::Update, key, AuditStatus::Success);
        Ok(())
    }

    /// Remove a key
    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if state.map.remove(key).is_none() {
            self.audit(AuditOp::Delete, key, AuditStatus::Failed);
            return Err(StoreError::not_found(key));
        }

        state.mutations += 1;
        self.audit(AuditOp::Delete, key, AuditStatus::Success);
        Ok(())
    }

    /// Remove every entry whose deadline is at or before now
    ///
    /// Expired keys are collected under the read lock, then each one is
    /// re-checked and removed under the write lock, so a key that was
    /// deleted or replaced in between is left alone. Each removal is counted
    /// and audited like a delete, followed by a `CLEANUP` record.
    ///
    /// Returns the number of keys removed.
    pub fn remove_expired(&self) -> usize {
        let now = self.clock.now();

        let mut removed = 0;
        for key in self.expired_keys(now) {
            if self.remove_if_expired(&key, now) {
                removed += 1;
            } else {
                debug!(key = %key, "Expired key already gone before cleanup");
            }
        }
        removed
    }

    fn expired_keys(&self, now: DateTime<Utc>) -> Vec<String> {
        let state = self.state.read();
        state
            .map
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn remove_if_expired(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut state = self.state.write();
        let expired = state
            .map
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now));
        if !expired {
            return false;
        }

        state.map.remove(key);
        state.mutations += 1;
        self.audit(AuditOp::Delete, key, AuditStatus::Success);
        self.audit(AuditOp::Cleanup, key, AuditStatus::Expired);
        true
    }

    /// Persist if the trigger demands it
    ///
    /// Forced triggers (`Periodic`, `Shutdown`) always save. `Count` saves
    /// only once the mutation counter has reached `threshold`.
    pub fn check_and_save(
        &self,
        trigger: SnapshotTrigger,
        threshold: u64,
    ) -> Result<SaveOutcome, StoreError> {
        let pending = self.pending_mutations();
        if !trigger.is_forced() && pending < threshold {
            return Ok(SaveOutcome::Skipped { pending });
        }

        let entries = self.save_snapshot()?;
        Ok(SaveOutcome::Saved { entries })
    }

    /// Write the full map to the snapshot file
    ///
    /// The map is encoded under the exclusive lock; the file is written after
    /// the lock is released. On success the mutations captured by this
    /// snapshot are subtracted from the counter, so writes that landed during
    /// the file write still count toward the next one. On failure the counter
    /// is left as is.
    pub fn save_snapshot(&self) -> Result<usize, StoreError> {
        let _saving = self.save_lock.lock();

        let (bytes, captured, entries) = {
            let state = self.state.write();
            let bytes = SnapshotFile::encode(&state.map)?;
            (bytes, state.mutations, state.map.len())
        };

        if let Err(e) = self.snapshot.write_bytes(&bytes) {
            warn!("Snapshot failed, {} mutations still pending: {}", captured, e);
            return Err(e);
        }

        let mut state = self.state.write();
        state.mutations = state.mutations.saturating_sub(captured);

        debug!(entries, path = %self.snapshot.path().display(), "Snapshot written");
        Ok(entries)
    }

    /// Number of writes since the last successful snapshot
    pub fn pending_mutations(&self) -> u64 {
        self.state.read().mutations
    }

    /// Copy of the entry for a key, including its deadline
    pub fn entry(&self, key: &str) -> Option<Entry> {
        self.state.read().map.get(key).cloned()
    }

    /// Number of keys, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.state.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The snapshot file this store persists to
    pub fn snapshot_file(&self) -> &SnapshotFile {
        &self.snapshot
    }

    /// Callers hold the map lock, so audit lines follow the order in which
    /// operations were applied.
    fn audit(&self, op: AuditOp, key: &str, status: AuditStatus) {
        self.audit
            .record(&AuditRecord::new(self.clock.now(), op, key, status));
    }
}
