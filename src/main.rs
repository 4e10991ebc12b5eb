use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use ttlkv::expiry::ExpirySweeper;
use ttlkv::persistence::SnapshotScheduler;
use ttlkv::web::{self, AppState};
use ttlkv::{AuditLog, Config, KvStore, SnapshotFile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG wins; otherwise info for this crate and the audit target
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ttlkv=info,audit=info")),
        )
        .init();

    info!("ttlkv starting...");

    let config_path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("TTLKV_CONFIG"))
        .map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    let audit = match AuditLog::open(&config.audit_log_path) {
        Ok(log) => log,
        Err(e) => {
            warn!(
                "Cannot open audit log {}, auditing to tracing only: {}",
                config.audit_log_path.display(),
                e
            );
            AuditLog::disabled()
        }
    };

    let store = Arc::new(KvStore::open(
        SnapshotFile::new(&config.snapshot_path),
        audit,
    ));

    let shutdown = CancellationToken::new();
    let sweeper = ExpirySweeper::spawn(store.clone(), config.expiry(), shutdown.clone());
    let scheduler =
        SnapshotScheduler::spawn(store.clone(), config.snapshot_policy(), shutdown.clone());

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                signal_token.cancel();
            }
            Err(e) => error!("Cannot listen for shutdown signal: {}", e),
        }
    });

    let state = AppState::new(store, config.default_ttl());
    let served = web::run_web_server(&config.listen_addr, state, shutdown.clone()).await;
    if let Err(ref e) = served {
        error!("Web server error: {}", e);
    }

    // Stop background tasks; the scheduler writes a final snapshot
    shutdown.cancel();
    for (name, handle) in [("sweeper", sweeper), ("scheduler", scheduler)] {
        if let Err(e) = handle.await {
            error!("{} task failed: {}", name, e);
        }
    }

    info!("ttlkv stopped");
    served
}
