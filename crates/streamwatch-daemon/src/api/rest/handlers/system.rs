//! Metrics, status and health handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Serialize;
use streamwatch_observability::CONTENT_TYPE;

/// Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state
        .metrics
        .stream()
        .set_tracked_devices(state.registry.device_count());

    let body = state
        .metrics
        .export()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body))
}

/// Liveness plus cache reachability
pub async fn service_status(State(state): State<AppState>) -> ApiResult<&'static str> {
    state.cache.ping().await?;
    Ok("Service is up and cache is connected")
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub tracked_devices: usize,
    pub ingest_workers: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        tracked_devices: state.registry.device_count(),
        ingest_workers: state.pipeline.workers(),
    })
}
