//! Central metrics registry

use prometheus::Registry;
use std::sync::Arc;

use super::collectors::StreamMetrics;
use crate::error::Result;

/// Metric name prefix, matching the series names dashboards already use.
pub const DEFAULT_PREFIX: &str = "stream_processor";

/// Central metrics registry
pub struct MetricsRegistry {
    registry: Arc<Registry>,
    stream_metrics: StreamMetrics,
}

impl MetricsRegistry {
    /// Create a new metrics registry with the default prefix
    pub fn new() -> Result<Self> {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Create a new metrics registry with custom prefix
    pub fn with_prefix(prefix: &str) -> Result<Self> {
        let registry = Arc::new(Registry::new_custom(Some(prefix.to_string()), None)?);
        let stream_metrics = StreamMetrics::new(&registry)?;

        Ok(Self {
            registry,
            stream_metrics,
        })
    }

    /// Get the stream processor metrics
    pub fn stream(&self) -> &StreamMetrics {
        &self.stream_metrics
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String> {
        super::exporter::export_metrics(&self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new().unwrap();
        registry.stream().record_request("/stream", "success");
        registry.stream().record_anomaly("d1");

        let output = registry.export().unwrap();
        assert!(output.contains("stream_processor_request_total"));
        assert!(output.contains("stream_processor_anomaly_counter{device_id=\"d1\"} 1"));
    }

    #[test]
    fn test_registry_with_prefix() {
        let registry = MetricsRegistry::with_prefix("test").unwrap();
        registry.stream().set_current_rps("d1", 4.0);
        let output = registry.export().unwrap();
        assert!(output.contains("test_current_rps"));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        assert!(MetricsRegistry::with_prefix("").is_err());
    }
}
