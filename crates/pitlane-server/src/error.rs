//! HTTP error mapping
//!
//! Every failure a download can hit ends up as either a 404 or a 500.
//! Internal details are logged server-side and never sent to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pitlane_core::PitlaneError;
use serde::Serialize;
use thiserror::Error;

/// JSON error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Machine-readable error code ("NOT_FOUND", "INTERNAL_ERROR")
    pub code: &'static str,
    pub message: String,
}

/// Application-level error returned by handlers
#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown kind, invalid name or missing item (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Build or task failure (500)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::NotFound(_) => "not found".to_string(),
            Self::Internal(_) => {
                tracing::error!(error = %self, "download failed");
                "service error".to_string()
            },
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<PitlaneError> for AppError {
    fn from(err: PitlaneError) -> Self {
        if err.is_not_found() {
            tracing::debug!(error = %err, "request for unavailable item");
            Self::NotFound(err.to_string())
        } else {
            Self::Internal(error_chain(&err))
        }
    }
}

/// Render an error with its sources, outermost first
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }

    rendered
}
