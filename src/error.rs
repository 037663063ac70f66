//! [`AppError`] and its HTTP representation.

use crate::{query, shaper};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure of a single request. There is no partial success.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Query(#[from] query::Error),

    #[error(transparent)]
    Shape(#[from] shaper::Error),

    #[error("scrape failed: {0:#}")]
    Scrape(anyhow::Error),

    #[error("failed to save snapshot: {0:#}")]
    Snapshot(anyhow::Error),

    #[error("export failed: {0:#}")]
    Export(anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Query(_) | AppError::Shape(_) => StatusCode::BAD_REQUEST,
            AppError::Scrape(_) => StatusCode::BAD_GATEWAY,
            AppError::Snapshot(_) | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
