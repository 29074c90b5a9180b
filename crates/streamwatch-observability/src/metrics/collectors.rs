//! Stream processor metrics

use prometheus::core::Collector;
use prometheus::{
    GaugeVec, HistogramOpts, HistogramTimer, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    DEFAULT_BUCKETS,
};
use streamwatch_core::{AnomalySignal, AnomalySink};

use crate::error::Result;

/// Metrics for ingest requests and detected anomalies.
///
/// Cloning is cheap; clones share the underlying series.
#[derive(Clone)]
pub struct StreamMetrics {
    /// Requests by endpoint and outcome
    pub requests_total: IntCounterVec,

    /// Request handling time by endpoint
    pub request_duration_seconds: HistogramVec,

    /// Requests per second last reported by each device
    pub current_rps: GaugeVec,

    /// Cumulative anomalies by device
    pub anomalies_total: IntCounterVec,

    /// Devices known to the registry
    pub tracked_devices: IntGauge,
}

impl StreamMetrics {
    /// Create and register stream metrics
    pub fn new(registry: &Registry) -> Result<Self> {
        let requests_total = register(
            registry,
            IntCounterVec::new(
                Opts::new("request_total", "Total number of stream data points processed."),
                &["endpoint", "status"],
            )?,
        )?;

        let request_duration_seconds = register(
            registry,
            HistogramVec::new(
                HistogramOpts::new(
                    "request_duration_seconds",
                    "Processing time of stream requests in seconds.",
                )
                .buckets(DEFAULT_BUCKETS.to_vec()),
                &["endpoint"],
            )?,
        )?;

        let current_rps = register(
            registry,
            GaugeVec::new(
                Opts::new("current_rps", "Requests processed per second."),
                &["device_id"],
            )?,
        )?;

        let anomalies_total = register(
            registry,
            IntCounterVec::new(
                Opts::new(
                    "anomaly_counter",
                    "Total cumulative count of detected anomalies.",
                ),
                &["device_id"],
            )?,
        )?;

        let tracked_devices = register(
            registry,
            IntGauge::new("tracked_devices", "Devices with a rolling window.")?,
        )?;

        Ok(Self {
            requests_total,
            request_duration_seconds,
            current_rps,
            anomalies_total,
            tracked_devices,
        })
    }

    /// Count a request outcome
    pub fn record_request(&self, endpoint: &str, status: &str) {
        self.requests_total
            .with_label_values(&[endpoint, status])
            .inc();
    }

    /// Start timing a request; the duration is observed when the timer drops.
    pub fn start_request_timer(&self, endpoint: &str) -> HistogramTimer {
        self.request_duration_seconds
            .with_label_values(&[endpoint])
            .start_timer()
    }

    pub fn set_current_rps(&self, device_id: &str, rps: f64) {
        self.current_rps.with_label_values(&[device_id]).set(rps);
    }

    pub fn record_anomaly(&self, device_id: &str) {
        self.anomalies_total.with_label_values(&[device_id]).inc();
    }

    pub fn set_tracked_devices(&self, count: usize) {
        self.tracked_devices
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }
}

impl AnomalySink for StreamMetrics {
    fn on_anomaly(&self, signal: &AnomalySignal) {
        self.record_anomaly(&signal.device_id);
    }
}

fn register<C: Collector + Clone + 'static>(registry: &Registry, collector: C) -> Result<C> {
    registry.register(Box::new(collector.clone()))?;
    Ok(collector)
}
