//! Metrics collection and export
//!
//! Provides Prometheus-compatible metrics for the stream processor.

pub mod collectors;
pub mod exporter;
pub mod registry;

pub use collectors::StreamMetrics;
pub use exporter::{export_metrics, CONTENT_TYPE};
pub use registry::{MetricsRegistry, DEFAULT_PREFIX};
