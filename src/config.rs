//! Runtime configuration
//!
//! Defaults, then an optional JSON file, then `TTLKV_*` environment overrides.

use crate::expiry::ExpiryConfig;
use crate::persistence::SnapshotPolicy;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address of the HTTP listener
    pub listen_addr: String,

    /// Snapshot file, loaded at startup and rewritten by the scheduler
    pub snapshot_path: PathBuf,

    /// Append-only audit log
    pub audit_log_path: PathBuf,

    pub sweep_interval_secs: u64,
    pub snapshot_interval_secs: u64,
    pub snapshot_poll_millis: u64,

    /// Mutations that trigger a snapshot before the periodic one
    pub snapshot_threshold: u64,

    /// TTL for set requests without a valid `ttl`
    pub default_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "127.0.0.1:4000".to_string(),
            snapshot_path: PathBuf::from("kv-data.json"),
            audit_log_path: PathBuf::from("kv-logs.log"),
            sweep_interval_secs: 5,
            snapshot_interval_secs: 60,
            snapshot_poll_millis: 1000,
            snapshot_threshold: 5,
            default_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl Config {
    /// Build the effective configuration
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Read a JSON config file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Apply `TTLKV_*` overrides found through `lookup`
    ///
    /// Values that do not parse are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("TTLKV_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(path) = lookup("TTLKV_SNAPSHOT_PATH") {
            self.snapshot_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("TTLKV_AUDIT_LOG") {
            self.audit_log_path = PathBuf::from(path);
        }
        override_number(&lookup, "TTLKV_SWEEP_INTERVAL_SECS", &mut self.sweep_interval_secs);
        override_number(&lookup, "TTLKV_SNAPSHOT_INTERVAL_SECS", &mut self.snapshot_interval_secs);
        override_number(&lookup, "TTLKV_SNAPSHOT_THRESHOLD", &mut self.snapshot_threshold);
        override_number(&lookup, "TTLKV_DEFAULT_TTL_SECS", &mut self.default_ttl_secs);
    }

    pub fn expiry(&self) -> ExpiryConfig {
        ExpiryConfig {
            interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
        }
    }

    pub fn snapshot_policy(&self) -> SnapshotPolicy {
        SnapshotPolicy {
            interval: Duration::from_secs(self.snapshot_interval_secs.max(1)),
            poll_interval: Duration::from_millis(self.snapshot_poll_millis.max(1)),
            threshold: self.snapshot_threshold,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

fn override_number<F, T>(lookup: &F, name: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(name) {
        match raw.trim().parse() {
            Ok(value) => *slot = value,
            Err(_) => warn!("Ignoring {}={:?}: not a number", name, raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listen_addr, "127.0.0.1:4000");
        assert_eq!(config.expiry().interval, Duration::from_secs(5));
        assert_eq!(config.snapshot_policy().interval, Duration::from_secs(60));
        assert_eq!(config.snapshot_policy().threshold, 5);
        assert_eq!(config.default_ttl(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ttlkv.json");
        std::fs::write(&path, r#"{"listen_addr": "0.0.0.0:9000", "snapshot_threshold": 50}"#)
            .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.snapshot_threshold, 50);
        assert_eq!(config.sweep_interval_secs, 5);
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ttlkv.json");
        std::fs::write(&path, "listen_addr = 1").unwrap();

        assert!(Config::from_file(&path).is_err());
        assert!(Config::from_file(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("TTLKV_SNAPSHOT_PATH", "/tmp/snap.json"),
            ("TTLKV_SWEEP_INTERVAL_SECS", "2"),
            ("TTLKV_SNAPSHOT_THRESHOLD", "many"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.snapshot_path, PathBuf::from("/tmp/snap.json"));
        assert_eq!(config.sweep_interval_secs, 2);
        // Unparseable value leaves the default in place
        assert_eq!(config.snapshot_threshold, 5);
    }

    #[test]
    fn test_zero_intervals_are_clamped() {
        let config = Config {
            sweep_interval_secs: 0,
            snapshot_poll_millis: 0,
            ..Config::default()
        };
        assert_eq!(config.expiry().interval, Duration::from_secs(1));
        assert_eq!(config.snapshot_policy().poll_interval, Duration::from_millis(1));
    }
}
