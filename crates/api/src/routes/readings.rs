//! Ingestion Route

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use heat_monitor::{IngestOutcome, RawReading};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

/// Ingest one reading
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawReading>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestOutcome>), ApiError> {
    let Json(raw) = payload?;
    let outcome = state.monitor.ingest(raw)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
