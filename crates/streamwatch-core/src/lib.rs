//! # streamwatch-core
//!
//! Per-device streaming anomaly detection over bounded rolling windows.
//!
//! ## Architecture
//!
//! ```text
//!   (device_id, value)
//!          │
//!          ▼
//!   ┌────────────────────┐   get_or_create    ┌──────────────────────┐
//!   │  AnomalyRegistry   │──────────────────► │  RollingWindowStats  │  one per device
//!   │                    │ ◄────────────────  │  (avg, std dev, z)   │
//!   └─────────┬──────────┘   |z| > threshold? └──────────────────────┘
//!             │
//!             ├──► AnomalySink::on_anomaly      side channel (metrics, logs)
//!             └──► mpsc::Sender<AnalyticsResult> bounded result queue
//! ```
//!
//! ## Guarantees
//!
//! - One window per device identity, even under concurrent first sight
//! - Results for a device are published in admission order
//! - A snapshot read never mixes statistics from two readings
//! - Insufficient data (fewer than two samples, zero spread) scores `0.0`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use streamwatch_core::{AnomalyRegistry, RegistryConfig};
//!
//! # async fn run() -> streamwatch_core::CoreResult<()> {
//! let (registry, mut results) = AnomalyRegistry::new(RegistryConfig::default())?;
//!
//! registry.process("sensor-1", 21.5).await?;
//! let result = results.recv().await.expect("queue open");
//! assert_eq!(result.device_id, "sensor-1");
//!
//! let stats = registry.query("sensor-1").expect("device seen");
//! assert_eq!(stats.sample_count, 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod events;
pub mod registry;
pub mod sink;
pub mod window;

pub use error::{CoreError, CoreResult};
pub use events::{AnalyticsResult, AnomalySignal, StatsSnapshot};
pub use registry::{AnomalyRegistry, DeviceSlot, RegistryConfig, ZScoreReference};
pub use sink::{AnomalySink, TracingSink};
pub use window::{standard_score, RollingWindowStats, WindowMoments};

/// Default number of samples retained per device.
pub const DEFAULT_WINDOW_CAPACITY: usize = 50;

/// Default `|z|` threshold above which a reading is anomalous.
pub const DEFAULT_Z_SCORE_THRESHOLD: f64 = 2.0;

/// Default bound of the result queue.
pub const DEFAULT_RESULT_QUEUE_CAPACITY: usize = 100;
