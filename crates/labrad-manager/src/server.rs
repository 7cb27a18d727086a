//! HTTP server implementation using Axum.

use crate::handler::{handle_health, handle_rpc};
use axum::{
    routing::{get, post},
    Router,
};
use labrad_core::{ManagerConfig, Registry};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    pub registry: Arc<Registry>,
}

pub fn router(registry: Arc<Registry>) -> Router {
    let state = Arc::new(AppState { registry });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/rpc", post(handle_rpc))
        .layer(ConcurrencyLimitLayer::new(
            ManagerConfig::MAX_CONCURRENT_REQUESTS,
        ))
        .layer(cors)
        .with_state(state)
}

/// Start the JSON-RPC HTTP server.
///
/// Returns the bound address (useful when port=0).
pub async fn start_server(
    registry: Arc<Registry>,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    let app = router(registry);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    });

    Ok(actual_addr)
}
