//! HTTP server implementation

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::handlers::{delete_key, get_key, set_key, update_key, AppState};

/// Build the application router
///
/// Requests with a method a route does not accept get `405`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/get", get(get_key))
        .route("/set", post(set_key))
        .route("/update", patch(update_key).put(update_key))
        .route("/delete", delete(delete_key))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the web server until `shutdown` is cancelled
pub async fn run_web_server(
    addr: &str,
    state: AppState,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let app = router(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Key-value API available at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Web server stopped");
    Ok(())
}
