//! Snapshot scheduler
//!
//! Background task with two triggers: a periodic timer that always saves,
//! and a short poll that saves once the mutation counter reaches the
//! threshold. Both go through `KvStore::check_and_save`.

use super::{SaveOutcome, SnapshotTrigger};
use crate::store::KvStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

/// When to write snapshots
#[derive(Debug, Clone)]
pub struct SnapshotPolicy {
    /// Period of the forced snapshot (default: 60s)
    pub interval: Duration,

    /// How often the mutation counter is checked (default: 1s)
    pub poll_interval: Duration,

    /// Mutations needed for a count-triggered snapshot (default: 5)
    pub threshold: u64,
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
            threshold: 5,
        }
    }
}

/// Spawns the snapshot task
pub struct SnapshotScheduler;

impl SnapshotScheduler {
    /// Start the scheduler as a background task
    ///
    /// The task runs until `shutdown` is cancelled, then writes one last
    /// snapshot and exits.
    pub fn spawn(
        store: Arc<KvStore>,
        policy: SnapshotPolicy,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        info!(
            "Snapshot scheduler started (every {:?}, or after {} mutations)",
            policy.interval, policy.threshold
        );
        tokio::spawn(scheduler_loop(store, policy, shutdown))
    }
}

async fn scheduler_loop(store: Arc<KvStore>, policy: SnapshotPolicy, shutdown: CancellationToken) {
    let start = Instant::now();
    let mut periodic = time::interval_at(start + policy.interval, policy.interval);
    let mut poll = time::interval_at(start + policy.poll_interval, policy.poll_interval);
    periodic.set_missed_tick_behavior(MissedTickBehavior::Delay);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                debug!("Snapshot scheduler received shutdown signal");
                run_check(&store, SnapshotTrigger::Shutdown, policy.threshold).await;
                break;
            }
            _ = periodic.tick() => {
                run_check(&store, SnapshotTrigger::Periodic, policy.threshold).await;
            }
            _ = poll.tick() => {
                run_check(&store, SnapshotTrigger::Count, policy.threshold).await;
            }
        }
    }

    info!("Snapshot scheduler stopped");
}

/// Run one check on the blocking pool; errors are logged and dropped
async fn run_check(store: &Arc<KvStore>, trigger: SnapshotTrigger, threshold: u64) {
    let store = Arc::clone(store);
    let result =
        tokio::task::spawn_blocking(move || store.check_and_save(trigger, threshold)).await;

    match result {
        Ok(Ok(SaveOutcome::Saved { entries })) => {
            info!(?trigger, entries, "Snapshot saved");
        }
        Ok(Ok(SaveOutcome::Skipped { pending })) => {
            trace!(?trigger, pending, "Snapshot skipped");
        }
        Ok(Err(e)) => {
            error!(?trigger, "Error saving snapshot: {}", e);
        }
        Err(e) => {
            error!(?trigger, "Snapshot task failed: {}", e);
        }
    }
}
