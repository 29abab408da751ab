/// Axum HTTP server setup and routing
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::store::MockHistory;

pub fn create_router(history: Arc<MockHistory>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Etherscan-compatible endpoint
        .route("/api", get(token_tx))

        // Fixture and control endpoints
        .route("/transfers", post(add_transfers))
        .route("/control/failure", post(set_failure).delete(clear_failure))
        .route("/stats", get(stats))

        // Shared state
        .with_state(history)

        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(history: Arc<MockHistory>, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(history);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("History mock server listening on http://{}", addr);
    log::info!("Etherscan-compatible endpoint: GET /api?module=account&action=tokentx");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve on an ephemeral localhost port in the background
///
/// Returns the bound address; the server runs until the handle is aborted
/// or the runtime shuts down.
pub async fn spawn_local(history: Arc<MockHistory>) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router(history);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("History mock server stopped: {}", e);
        }
    });

    log::debug!("History mock server spawned on http://{}", addr);
    Ok((addr, handle))
}
