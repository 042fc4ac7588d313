//! HTTP error response mapping

use alert_store::StoreError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use heat_monitor::IngestError;
use serde::Serialize;
use thiserror::Error;

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

/// Errors surfaced by handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::Ingest(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.kind()),
            ApiError::InvalidBody(rejection) => (rejection.status(), "invalid_body"),
            ApiError::NotFound(_) | ApiError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            ApiError::Store(e) => {
                tracing::error!(error = %e, "alert store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        let body = ErrorBody {
            error: self.to_string(),
            kind,
        };
        (status, Json(body)).into_response()
    }
}
