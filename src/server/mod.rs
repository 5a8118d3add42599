//! HTTP surface: `/run`, `/read`, plus `/functions` and `/health`.

pub mod error;
pub mod routes;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::files::FileReader;
use crate::tools::ToolRegistry;

/// Shared across handlers. Nothing in here is mutated after startup.
pub struct AppState {
    pub engine: Arc<dyn Engine>,
    pub tools: Arc<ToolRegistry>,
    pub files: FileReader,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/run", post(routes::run_task))
        .route("/read", get(routes::read_file))
        .route("/functions", get(routes::list_functions))
        .route("/health", get(routes::health))
        .with_state(Arc::new(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until ctrl-c.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let app = router(state);
    let addr = config.addr;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
