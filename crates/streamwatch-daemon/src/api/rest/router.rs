//! API Router configuration

use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        // Ingest and query
        .route("/stream", post(handlers::stream_data))
        .route("/analyze/:device_id", get(handlers::analyze_device))
        // Operations
        .route("/metrics", get(handlers::metrics))
        .route("/status", get(handlers::service_status))
        .route("/health", get(handlers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http());

    let router = if config.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
