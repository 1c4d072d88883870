//! `GET /download/{kind}/{name}`
//!
//! The kind is a category key ("cars", "tracks"). The name may carry a
//! trailing `.zip`, which is stripped before lookup.

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use pitlane_cache::RetrievalService;
use pitlane_core::utils::{strip_archive_suffix, ARCHIVE_SUFFIX};
use pitlane_core::AssetKind;
use std::sync::Arc;

use crate::error::AppError;

const ZIP_CONTENT_TYPE: &str = "application/zip";

pub fn router(service: Arc<RetrievalService>) -> Router {
    Router::new()
        .route("/download/:kind/:name", get(download))
        .with_state(service)
}

async fn download(
    State(service): State<Arc<RetrievalService>>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let kind: AssetKind = kind.parse()?;
    let name = strip_archive_suffix(&name).to_string();

    // Archive builds do blocking file IO
    let bytes = {
        let name = name.clone();
        tokio::task::spawn_blocking(move || service.fetch(kind, &name))
            .await
            .map_err(|e| AppError::Internal(format!("download task failed: {}", e)))??
    };

    tracing::debug!(kind = %kind, name = %name, bytes = bytes.len(), "serving archive");

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(ZIP_CONTENT_TYPE)),
        (header::CONTENT_DISPOSITION, content_disposition(&name)),
    ];

    Ok((headers, bytes).into_response())
}

/// `attachment; filename="<name>.zip"`, or a bare `attachment` when the name
/// cannot be carried in a header
fn content_disposition(name: &str) -> HeaderValue {
    let filename: String = name
        .chars()
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect();

    HeaderValue::from_str(&format!(
        "attachment; filename=\"{}{}\"",
        filename, ARCHIVE_SUFFIX
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
