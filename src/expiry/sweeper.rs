//! Background expiry sweeper
//!
//! Reads never expire keys, so this task is the only thing that removes
//! entries past their deadline. Every tick it asks the store to drop all
//! expired keys; each removal is audited as a delete plus a `CLEANUP` record.

use crate::store::KvStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Configuration for the expiry sweeper
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Interval between sweeps (default: 5s)
    pub interval: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

/// Spawns the sweeper task
pub struct ExpirySweeper;

impl ExpirySweeper {
    /// Start the sweeper as a background task, stopped by `shutdown`
    pub fn spawn(
        store: Arc<KvStore>,
        config: ExpiryConfig,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        info!("Expiry sweeper started, interval: {:?}", config.interval);
        tokio::spawn(sweeper_loop(store, config, shutdown))
    }
}

async fn sweeper_loop(store: Arc<KvStore>, config: ExpiryConfig, shutdown: CancellationToken) {
    let mut ticker = time::interval_at(time::Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Expiry sweeper received shutdown signal");
                break;
            }
            _ = ticker.tick() => {
                let removed = store.remove_expired();
                if removed > 0 {
                    debug!(removed, keys_remaining = store.len(), "Expired keys cleaned up");
                }
            }
        }
    }

    info!("Expiry sweeper stopped");
}
