//! Per-device statistics handler

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

/// Statistics reported for one device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_value: Option<f64>,
    pub rolling_average: f64,
    pub std_dev: f64,
    pub z_score: f64,
    pub anomaly_count: u64,
    pub status: String,
}

/// Report the rolling statistics and cached last value of a device
///
/// Devices never seen report zeroed statistics.
pub async fn analyze_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let last_value = state.cache.get(&device_id).await?;
    let stats = state.registry.query(&device_id).unwrap_or_default();

    let status = if last_value.is_some() {
        "OK"
    } else {
        "No data found in cache"
    };

    Ok(Json(AnalyzeResponse {
        device_id,
        last_value,
        rolling_average: stats.average,
        std_dev: stats.std_dev,
        z_score: stats.z_score,
        anomaly_count: stats.anomaly_count,
        status: status.to_string(),
    }))
}
