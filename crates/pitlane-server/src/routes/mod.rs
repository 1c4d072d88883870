//! Route handlers

pub mod download;

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}
