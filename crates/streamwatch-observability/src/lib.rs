//! Streamwatch Observability
//!
//! Metrics and tracing infrastructure for streamwatch components.
//!
//! ## Features
//!
//! - **Metrics**: Prometheus-compatible request, device and anomaly series
//! - **Tracing**: `tracing-subscriber` setup with env filter and optional JSON output
//!
//! [`StreamMetrics`] implements [`streamwatch_core::AnomalySink`], so it can
//! be attached to a registry to count anomalies per device.

pub mod error;
pub mod metrics;
pub mod tracing;

pub use error::{ObservabilityError, Result};
pub use metrics::{export_metrics, MetricsRegistry, StreamMetrics, CONTENT_TYPE, DEFAULT_PREFIX};
pub use self::tracing::{init_tracing, TracingConfig};
