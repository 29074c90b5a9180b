//! Values that leave the core: per-reading results, anomaly signals and
//! published statistic snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics of one device as they stood after a completed admission.
///
/// Published whole, so readers never observe fields from two different
/// readings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Rolling average of the window.
    pub average: f64,
    /// Sample standard deviation of the window.
    pub std_dev: f64,
    /// Z-score of the most recent reading.
    pub z_score: f64,
    /// Readings classified as anomalous so far.
    pub anomaly_count: u64,
    /// Samples currently retained in the window.
    pub sample_count: usize,
}

/// One record per processed reading, emitted on the registry's result queue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResult {
    pub device_id: String,
    pub value: f64,
    pub average: f64,
    pub std_dev: f64,
    pub z_score: f64,
    pub is_anomaly: bool,
    /// 1-based admission number within this device's stream.
    pub sequence: u64,
    pub processed_at: DateTime<Utc>,
}

/// Side-channel event raised when a reading crosses the threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnomalySignal {
    pub device_id: String,
    pub value: f64,
    pub z_score: f64,
    pub threshold: f64,
    /// Device anomaly count including this reading.
    pub anomaly_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_default_is_zeroed() {
        let snap = StatsSnapshot::default();
        assert_eq!(snap.average, 0.0);
        assert_eq!(snap.std_dev, 0.0);
        assert_eq!(snap.z_score, 0.0);
        assert_eq!(snap.anomaly_count, 0);
        assert_eq!(snap.sample_count, 0);
    }

    #[test]
    fn test_result_serializes_with_snake_case_fields() {
        let result = AnalyticsResult {
            device_id: "d1".into(),
            value: 12.5,
            average: 10.0,
            std_dev: 1.0,
            z_score: 2.5,
            is_anomaly: true,
            sequence: 3,
            processed_at: Utc::now(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"device_id\":\"d1\""));
        assert!(json.contains("\"is_anomaly\":true"));
        assert!(json.contains("\"sequence\":3"));
    }
}
