//! Side channel for anomaly signals.

use tracing::warn;

use crate::events::AnomalySignal;

/// Receives a signal for every reading classified as anomalous.
///
/// Called inside the device's critical section, so implementations must be
/// cheap and must not block.
pub trait AnomalySink: Send + Sync {
    fn on_anomaly(&self, signal: &AnomalySignal);
}

/// Logs anomalies at `warn` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AnomalySink for TracingSink {
    fn on_anomaly(&self, signal: &AnomalySignal) {
        warn!(
            device_id = %signal.device_id,
            value = signal.value,
            z_score = %format!("{:.3}", signal.z_score),
            threshold = signal.threshold,
            anomaly_count = signal.anomaly_count,
            "anomaly detected"
        );
    }
}
