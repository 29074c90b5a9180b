//! Tracing subscriber initialization

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ObservabilityError, Result};

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name, attached to the startup event
    pub service_name: String,

    /// Enable JSON format for console output
    pub json_format: bool,

    /// Log level filter, used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "streamwatch".to_string(),
            json_format: false,
            log_level: "info".to_string(),
        }
    }
}

impl TracingConfig {
    /// Create config for a specific service
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Enable JSON format
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level`. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let installed = if config.json_format {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        subscriber.with(fmt_layer).try_init()
    } else {
        let fmt_layer = fmt::layer().with_target(true);
        subscriber.with(fmt_layer).try_init()
    };
    installed.map_err(|e| ObservabilityError::Tracing(e.to_string()))?;

    tracing::info!(service = %config.service_name, "tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_config() {
        let config = TracingConfig::new("streamwatchd")
            .with_log_level("debug")
            .with_json_format(true);

        assert_eq!(config.service_name, "streamwatchd");
        assert_eq!(config.log_level, "debug");
        assert!(config.json_format);
    }

    #[test]
    fn test_second_init_fails() {
        let config = TracingConfig::default();
        let _ = init_tracing(&config);
        // A global subscriber is in place now, whoever installed it.
        assert!(init_tracing(&config).is_err());
    }
}
