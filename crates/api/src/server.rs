//! Rosetta HTTP server.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use tracing::{debug, info};

use tessera_core::ports::NetworkProvider;
use tessera_transform::{BlockTransformer, MempoolTransformer};

use crate::routes;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8091,
        }
    }
}

/// Shared handler state: the provider and the transformers built on it.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn NetworkProvider>,
    pub blocks: Arc<BlockTransformer>,
    pub mempool: Arc<MempoolTransformer>,
}

impl AppState {
    pub fn new(provider: Arc<dyn NetworkProvider>) -> Self {
        Self {
            blocks: Arc::new(BlockTransformer::new(provider.clone())),
            mempool: Arc::new(MempoolTransformer::new(provider.clone())),
            provider,
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/network/status", post(routes::network_status))
        .route("/account/balance", post(routes::account_balance))
        .route("/block", post(routes::block))
        .route("/mempool/transaction", post(routes::mempool_transaction))
        .route("/construction/submit", post(routes::construction_submit))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Start the Rosetta server.
pub async fn serve(state: AppState, config: ServerConfig) -> Result<(), std::io::Error> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("⚡ Rosetta server listening on http://{}", addr);

    axum::serve(listener, router(state)).await
}

/// Start the Rosetta server with graceful shutdown support.
pub async fn serve_with_shutdown<F>(
    state: AppState,
    config: ServerConfig,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("⚡ Rosetta server listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    debug!("Rosetta server stopped");
    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
