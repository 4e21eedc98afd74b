//! HTTP API server exposing the add and search operations.

pub mod routes;

use crate::metrics::MetricsCollector;
use crate::service::IndexService;
use std::sync::{Arc, RwLock};

/// Shared application state for the HTTP server.
pub struct AppState {
    pub service: Arc<IndexService>,
    pub metrics: RwLock<MetricsCollector>,
}

impl AppState {
    pub fn new(service: Arc<IndexService>) -> Arc<Self> {
        Arc::new(Self {
            service,
            metrics: RwLock::new(MetricsCollector::new()),
        })
    }
}

/// Serve the API on `addr` until Ctrl-C is received.
pub async fn start(addr: &str, service: Arc<IndexService>) -> anyhow::Result<()> {
    let app = routes::create_router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
