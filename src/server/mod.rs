//! HTTP front-end for the HR assistant
//!
//! The router is only ever built from a fully constructed [`HrAssistant`],
//! so every request sees an initialised pipeline.

pub mod handlers;


use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::Result;
use crate::assistant::HrAssistant;

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<HrAssistant>,
}

impl AppState {
    #[inline]
    pub fn new(assistant: HrAssistant) -> Self {
        Self {
            assistant: Arc::new(assistant),
        }
    }
}

#[inline]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/ask", post(handlers::ask))
        .route("/api/status", get(handlers::status))
        .route("/api/test", get(handlers::self_test))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C.
#[inline]
pub async fn serve(assistant: HrAssistant, addr: SocketAddr) -> Result<()> {
    let app = build_router(AppState::new(assistant));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;

    info!("Web interface available at http://{}", local);
    info!("API available at http://{}/api/ask", local);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HR assistant shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
