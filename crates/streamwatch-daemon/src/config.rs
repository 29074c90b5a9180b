//! Configuration for streamwatch-daemon

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use streamwatch_core::RegistryConfig;

use crate::error::{DaemonError, DaemonResult};

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rolling window and threshold settings
    #[serde(default)]
    pub detector: RegistryConfig,

    /// Ingest worker pool
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Last-value cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Ingest pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Number of ingest workers; each device is pinned to one
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Bound of each worker's queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Last-value cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry lifetime in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    /// Key prefix prepended to the device id
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Interval between sweeps of expired entries, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            key_prefix: default_key_prefix(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,

    /// Emit a warning per detected anomaly
    #[serde(default = "default_true")]
    pub anomalies: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            anomalies: true,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_request_timeout() -> u64 {
    10
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_cache_ttl() -> u64 {
    15 * 60
}

fn default_key_prefix() -> String {
    "stream:data:".to_string()
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `STREAMWATCH_*` environment variables (`__` separates sections,
    /// e.g. `STREAMWATCH_DETECTOR__WINDOW_CAPACITY=100`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("STREAMWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject settings the daemon cannot run with.
    pub fn validate(&self) -> DaemonResult<()> {
        self.detector
            .validate()
            .map_err(|e| DaemonError::Config(e.to_string()))?;

        if self.ingest.workers == 0 {
            return Err(DaemonError::Config("ingest.workers must be positive".into()));
        }
        if self.ingest.queue_capacity == 0 {
            return Err(DaemonError::Config(
                "ingest.queue_capacity must be positive".into(),
            ));
        }
        if self.cache.ttl_secs == 0 {
            return Err(DaemonError::Config("cache.ttl_secs must be positive".into()));
        }
        if self.cache.sweep_interval_secs == 0 {
            return Err(DaemonError::Config(
                "cache.sweep_interval_secs must be positive".into(),
            ));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(DaemonError::Config(
                "server.request_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamwatch_core::ZScoreReference;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert_eq!(config.detector.window_capacity, 50);
        assert_eq!(config.detector.z_score_threshold, 2.0);
        assert_eq!(config.cache.ttl_secs, 900);
        assert_eq!(config.cache.key_prefix, "stream:data:");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert!(config.enable_cors);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_validation_rejects_zero_workers() {
        let mut config = DaemonConfig::default();
        config.ingest.workers = 0;
        assert!(matches!(config.validate(), Err(DaemonError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_negative_threshold() {
        let mut config = DaemonConfig::default();
        config.detector.z_score_threshold = -0.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("z_score_threshold"));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "streamwatch-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"
[detector]
window_capacity = 3
z_score_threshold = 1.5
reference = "pre_admission"

[ingest]
workers = 2
"#,
        )
        .unwrap();

        let config = DaemonConfig::load(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.detector.window_capacity, 3);
        assert_eq!(config.detector.z_score_threshold, 1.5);
        assert_eq!(config.detector.reference, ZScoreReference::PreAdmission);
        assert_eq!(config.ingest.workers, 2);
        // Untouched sections keep their defaults.
        assert_eq!(config.ingest.queue_capacity, 1024);
        assert_eq!(config.server.listen_addr.port(), 8080);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = DaemonConfig::load(Some("/nonexistent/streamwatch")).unwrap();
        assert_eq!(config.detector.window_capacity, 50);
    }
}
