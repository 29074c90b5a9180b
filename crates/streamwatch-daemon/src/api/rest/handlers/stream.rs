//! Reading ingest handler

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::pipeline::Reading;
use axum::{body::Bytes, extract::State};
use serde::{Deserialize, Serialize};

const ENDPOINT: &str = "/stream";

/// Body of an ingest request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub rps: f64,
}

/// Accept a reading and hand it to the ingest pipeline
pub async fn stream_data(State(state): State<AppState>, body: Bytes) -> ApiResult<&'static str> {
    let stream = state.metrics.stream();
    let _timer = stream.start_request_timer(ENDPOINT);

    let point: DataPoint = match serde_json::from_slice(&body) {
        Ok(point) => point,
        Err(e) => {
            stream.record_request(ENDPOINT, "error");
            return Err(ApiError::BadRequest(format!("invalid request body: {}", e)));
        }
    };

    if point.device_id.is_empty() {
        stream.record_request(ENDPOINT, "no_device");
        return Err(ApiError::BadRequest("device_id is required".to_string()));
    }

    if !point.cpu.is_finite() || !point.rps.is_finite() {
        stream.record_request(ENDPOINT, "error");
        return Err(ApiError::BadRequest(
            "cpu and rps must be finite numbers".to_string(),
        ));
    }

    if let Err(e) = state.cache.set(&point.device_id, point.cpu).await {
        tracing::warn!(device_id = %point.device_id, error = %e, "failed to cache last value");
    }

    if let Err(e) = state
        .pipeline
        .submit(Reading::new(point.device_id.clone(), point.cpu))
        .await
    {
        stream.record_request(ENDPOINT, "unavailable");
        return Err(ApiError::Unavailable(e.to_string()));
    }

    stream.record_request(ENDPOINT, "success");
    stream.set_current_rps(&point.device_id, point.rps);

    Ok("Data accepted and processing initiated")
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{state_with, test_state, DownStore};
    use crate::api::create_router;
    use crate::config::ServerConfig;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use streamwatch_core::RegistryConfig;
    use tower::ServiceExt;

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/stream")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn wait_for_samples(state: &crate::api::rest::state::AppState, id: &str, n: usize) {
        for _ in 0..200 {
            if state.registry.query(id).map(|s| s.sample_count) == Some(n) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("device {id} never reached {n} samples");
    }

    #[tokio::test]
    async fn test_accepts_valid_reading() {
        let state = test_state();
        let app = create_router(state.clone(), &ServerConfig::default());

        let resp = app
            .oneshot(post(
                r#"{"device_id":"d1","timestamp":1700000000,"cpu":42.5,"rps":120}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Data accepted and processing initiated");

        assert_eq!(state.cache.get("d1").await.unwrap(), Some(42.5));
        wait_for_samples(&state, "d1", 1).await;

        let exposition = state.metrics.export().unwrap();
        assert!(exposition
            .contains(r#"stream_processor_request_total{endpoint="/stream",status="success"} 1"#));
        assert!(exposition.contains(r#"stream_processor_current_rps{device_id="d1"} 120"#));
    }

    #[tokio::test]
    async fn test_rejects_malformed_body() {
        let state = test_state();
        let app = create_router(state.clone(), &ServerConfig::default());

        let resp = app.oneshot(post("{not json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let exposition = state.metrics.export().unwrap();
        assert!(exposition
            .contains(r#"stream_processor_request_total{endpoint="/stream",status="error"} 1"#));
    }

    #[tokio::test]
    async fn test_rejects_missing_device_id() {
        let state = test_state();
        let app = create_router(state.clone(), &ServerConfig::default());

        let resp = app.oneshot(post(r#"{"cpu":1.0}"#)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.registry.device_count(), 0);

        let exposition = state.metrics.export().unwrap();
        assert!(exposition.contains(
            r#"stream_processor_request_total{endpoint="/stream",status="no_device"} 1"#
        ));
    }

    #[tokio::test]
    async fn test_cache_failure_does_not_reject_reading() {
        let state = state_with(RegistryConfig::default(), Arc::new(DownStore));
        let app = create_router(state.clone(), &ServerConfig::default());

        let resp = app
            .oneshot(post(r#"{"device_id":"d2","cpu":7.0,"rps":1}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        wait_for_samples(&state, "d2", 1).await;
    }
}
