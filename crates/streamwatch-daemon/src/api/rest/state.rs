//! Application state for API handlers

use crate::cache::LastValueStore;
use crate::pipeline::IngestPipeline;
use std::sync::Arc;
use streamwatch_core::AnomalyRegistry;
use streamwatch_observability::MetricsRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Per-device statistics
    pub registry: Arc<AnomalyRegistry>,

    /// Ingest worker pool
    pub pipeline: IngestPipeline,

    /// Last raw value per device
    pub cache: Arc<dyn LastValueStore>,

    /// Prometheus metrics
    pub metrics: Arc<MetricsRegistry>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        registry: Arc<AnomalyRegistry>,
        pipeline: IngestPipeline,
        cache: Arc<dyn LastValueStore>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            registry,
            pipeline,
            cache,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let secs = (chrono::Utc::now() - self.started_at).num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
