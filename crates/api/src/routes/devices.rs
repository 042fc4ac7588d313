//! Device Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use heat_monitor::{Classification, DeviceSnapshot, WindowStats};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

/// Response for the device list
#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub data: Vec<DeviceSnapshot>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ClassificationResponse {
    pub device_id: String,
    pub classification: Classification,
}

/// List every monitored device
pub async fn list_devices(State(state): State<Arc<AppState>>) -> Json<DeviceListResponse> {
    let data = state.monitor.snapshots();
    Json(DeviceListResponse {
        count: data.len(),
        data,
    })
}

/// Window statistics; `count == 0` for a device with no readings
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Json<WindowStats> {
    Json(state.monitor.stats(&device_id))
}

/// Current classification
pub async fn get_classification(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Json<ClassificationResponse>, ApiError> {
    let classification = state
        .monitor
        .classification(&device_id)
        .ok_or_else(|| ApiError::NotFound(format!("device {device_id}")))?;
    Ok(Json(ClassificationResponse {
        device_id,
        classification,
    }))
}

/// Stop monitoring a device
pub async fn unregister(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.monitor.unregister(&device_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("device {device_id}")))
    }
}
