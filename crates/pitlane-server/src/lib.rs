//! # pitlane-server
//!
//! HTTP boundary for the archive download service.
//!
//! | Route                         | Handler                      |
//! |-------------------------------|------------------------------|
//! | `GET /download/{kind}/{name}` | [`routes::download`]         |
//! | `GET /health`                 | [`routes::health`]           |
//!
//! Every request passes through tower-http's `TraceLayer`.

pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use std::io;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use crate::error::AppError;
pub use crate::state::AppState;

/// Assemble the application router
///
/// The download route is only mounted when the state carries a retrieval
/// service; otherwise download requests fall through to a 404.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new().route("/health", get(routes::health));

    match state.retrieval {
        Some(service) => router = router.merge(routes::download::router(service)),
        None => tracing::info!("downloads disabled, download route not mounted"),
    }

    router.layer(TraceLayer::new_for_http())
}

/// Serve the router on `listener` until ctrl-c
pub async fn serve(listener: TcpListener, state: AppState) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "listening");
    }

    axum::serve(listener, app(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
