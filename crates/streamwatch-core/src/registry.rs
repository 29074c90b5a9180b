//! Device registry and the ingest → compute → classify → publish pipeline.
//!
//! ## Locking
//!
//! ```text
//!   devices: RwLock<HashMap<id, Arc<DeviceSlot>>>     read-mostly, insert on first sight
//!       │
//!       └── DeviceSlot
//!             ├── stats:     tokio Mutex<RollingWindowStats>   per-device critical section
//!             └── published: RwLock<StatsSnapshot>             whole-value replace
//! ```
//!
//! A reading holds its device's `stats` lock from admission until its result
//! is on the output queue, so results for one device leave in admission
//! order. Devices never share a lock. Queries read `published` and never wait
//! on a producer blocked by a full queue.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::error::{CoreError, CoreResult};
use crate::events::{AnalyticsResult, AnomalySignal, StatsSnapshot};
use crate::sink::AnomalySink;
use crate::window::RollingWindowStats;
use crate::{DEFAULT_RESULT_QUEUE_CAPACITY, DEFAULT_WINDOW_CAPACITY, DEFAULT_Z_SCORE_THRESHOLD};

/// Which window a reading's z-score is measured against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZScoreReference {
    /// The window after the reading was admitted (it scores against itself).
    #[default]
    PostAdmission,
    /// The window as it stood before the reading was admitted.
    PreAdmission,
}

/// Fixed parameters of a registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Samples retained per device.
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
    /// `|z|` above which a reading is anomalous.
    #[serde(default = "default_z_score_threshold")]
    pub z_score_threshold: f64,
    #[serde(default)]
    pub reference: ZScoreReference,
    /// Bound of the result queue. Producers wait when it is full.
    #[serde(default = "default_result_queue_capacity")]
    pub result_queue_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            z_score_threshold: DEFAULT_Z_SCORE_THRESHOLD,
            reference: ZScoreReference::default(),
            result_queue_capacity: DEFAULT_RESULT_QUEUE_CAPACITY,
        }
    }
}

fn default_window_capacity() -> usize {
    DEFAULT_WINDOW_CAPACITY
}

fn default_z_score_threshold() -> f64 {
    DEFAULT_Z_SCORE_THRESHOLD
}

fn default_result_queue_capacity() -> usize {
    DEFAULT_RESULT_QUEUE_CAPACITY
}

impl RegistryConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.window_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "window_capacity must be positive".into(),
            ));
        }
        if !self.z_score_threshold.is_finite() || self.z_score_threshold < 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "z_score_threshold must be a finite non-negative number, got {}",
                self.z_score_threshold
            )));
        }
        if self.result_queue_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "result_queue_capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Per-device state and its lock.
#[derive(Debug)]
pub struct DeviceSlot {
    stats: Mutex<RollingWindowStats>,
    published: RwLock<StatsSnapshot>,
}

impl DeviceSlot {
    fn new(capacity: usize) -> Self {
        Self {
            stats: Mutex::new(RollingWindowStats::new(capacity)),
            published: RwLock::new(StatsSnapshot::default()),
        }
    }

    /// Statistics as of the last completed admission.
    pub fn snapshot(&self) -> StatsSnapshot {
        *self.published.read()
    }

    /// Retained samples, oldest first. Waits for any in-flight reading of
    /// this device to finish publishing.
    pub async fn samples(&self) -> Vec<f64> {
        self.stats.lock().await.samples().collect()
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, RollingWindowStats> {
        self.stats.lock().await
    }
}

/// Maps device identities to their rolling statistics and runs each reading
/// through classification.
pub struct AnomalyRegistry {
    config: RegistryConfig,
    devices: RwLock<HashMap<String, Arc<DeviceSlot>>>,
    results: mpsc::Sender<AnalyticsResult>,
    sinks: Vec<Arc<dyn AnomalySink>>,
}

impl std::fmt::Debug for AnomalyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnomalyRegistry")
            .field("config", &self.config)
            .field("devices", &self.device_count())
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl AnomalyRegistry {
    /// Create a registry and the receiving end of its result queue.
    pub fn new(config: RegistryConfig) -> CoreResult<(Self, mpsc::Receiver<AnalyticsResult>)> {
        config.validate()?;
        let (results, rx) = mpsc::channel(config.result_queue_capacity);
        debug!(
            window_capacity = config.window_capacity,
            threshold = config.z_score_threshold,
            reference = ?config.reference,
            "anomaly registry initialized"
        );
        Ok((
            Self {
                config,
                devices: RwLock::new(HashMap::new()),
                results,
                sinks: Vec::new(),
            },
            rx,
        ))
    }

    /// Register a side-channel receiver for anomaly signals.
    pub fn with_sink(mut self, sink: Arc<dyn AnomalySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Look up a device, creating its window on first sight.
    ///
    /// Concurrent first-time callers all receive the same slot.
    pub fn get_or_create(&self, device_id: &str) -> Arc<DeviceSlot> {
        if let Some(slot) = self.devices.read().get(device_id) {
            return Arc::clone(slot);
        }

        let mut devices = self.devices.write();
        // Another caller may have inserted between the read and write locks.
        if let Some(slot) = devices.get(device_id) {
            return Arc::clone(slot);
        }

        let slot = Arc::new(DeviceSlot::new(self.config.window_capacity));
        devices.insert(device_id.to_string(), Arc::clone(&slot));
        debug!(device_id = %device_id, devices = devices.len(), "device registered");
        slot
    }

    /// Run one reading through the pipeline and publish its result.
    ///
    /// Waits while the result queue is full. Dropping the returned future
    /// after the reading was admitted loses its result record but not its
    /// effect on the statistics.
    pub async fn process(&self, device_id: &str, value: f64) -> CoreResult<AnalyticsResult> {
        if device_id.is_empty() {
            return Err(CoreError::EmptyDeviceId);
        }
        if !value.is_finite() {
            return Err(CoreError::NonFiniteValue {
                device_id: device_id.to_string(),
                value,
            });
        }

        let slot = self.get_or_create(device_id);
        let mut stats = slot.lock().await;

        let prior = match self.config.reference {
            ZScoreReference::PreAdmission => Some(stats.moments()),
            ZScoreReference::PostAdmission => None,
        };
        let (average, std_dev) = stats.admit_and_compute(value);
        let z_score = match prior {
            Some(reference) => stats.compute_z_score_against(value, reference),
            None => stats.compute_z_score(value, average, std_dev),
        };

        let threshold = self.config.z_score_threshold;
        let is_anomaly = z_score.abs() > threshold;
        if is_anomaly {
            let anomaly_count = stats.increment_anomaly_count();
            let signal = AnomalySignal {
                device_id: device_id.to_string(),
                value,
                z_score,
                threshold,
                anomaly_count,
            };
            for sink in &self.sinks {
                sink.on_anomaly(&signal);
            }
        }

        *slot.published.write() = stats.snapshot();

        let result = AnalyticsResult {
            device_id: device_id.to_string(),
            value,
            average,
            std_dev,
            z_score,
            is_anomaly,
            sequence: stats.admitted(),
            processed_at: Utc::now(),
        };
        trace!(
            device_id = %device_id,
            value,
            z_score,
            is_anomaly,
            "reading classified"
        );

        self.results
            .send(result.clone())
            .await
            .map_err(|_| CoreError::OutputClosed)?;
        drop(stats);

        Ok(result)
    }

    /// Current statistics of a device, or `None` if it was never seen.
    pub fn query(&self, device_id: &str) -> Option<StatsSnapshot> {
        self.devices
            .read()
            .get(device_id)
            .map(|slot| slot.snapshot())
    }

    /// Number of devices seen so far.
    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }

    /// Identities of all devices seen so far, sorted.
    pub fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.devices.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn threshold(&self) -> f64 {
        self.config.z_score_threshold
    }

    pub fn window_capacity(&self) -> usize {
        self.config.window_capacity
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}
