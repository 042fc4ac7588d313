//! Alert Routes

use alert_store::{AlertFilter, AlertRecord};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Query parameters for alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// Filter by device
    pub device_id: Option<String>,
    /// Filter by acknowledged status
    pub acknowledged: Option<bool>,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<AlertRecord>,
    pub count: usize,
    pub unacknowledged_count: usize,
}

/// Get alerts, newest first
pub async fn get_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AlertQuery>,
) -> Result<Json<AlertResponse>, ApiError> {
    let limit = params.limit.min(500);
    let filter = AlertFilter {
        device_id: params.device_id,
        acknowledged: params.acknowledged,
    };
    let data = state.alerts.recent(&filter, limit)?;

    Ok(Json(AlertResponse {
        count: data.len(),
        unacknowledged_count: state.alerts.pending_count(),
        data,
    }))
}

/// Acknowledge an alert
pub async fn acknowledge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AlertRecord>, ApiError> {
    Ok(Json(state.alerts.acknowledge(id)?))
}
