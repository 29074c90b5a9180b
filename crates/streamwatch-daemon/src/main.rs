//! Streamwatch daemon - per-device streaming anomaly detection
//!
//! The daemon provides:
//! - HTTP ingest of device readings
//! - Rolling-window statistics and z-score anomaly flags per device
//! - Prometheus metrics and a cache-backed status probe

use clap::Parser;
use std::net::SocketAddr;
use streamwatch_daemon::error::{DaemonError, DaemonResult};
use streamwatch_daemon::{DaemonConfig, Server};
use streamwatch_observability::{init_tracing, TracingConfig};

/// Streamwatch Daemon CLI
#[derive(Parser)]
#[command(name = "streamwatchd")]
#[command(about = "Streamwatch Daemon - streaming anomaly detection service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "STREAMWATCH_CONFIG")]
    config: Option<String>,

    /// Listen address, overrides the configuration file
    #[arg(short, long, env = "STREAMWATCH_LISTEN_ADDR")]
    listen: Option<String>,

    /// Listen port, overrides the port of the listen address
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(long, env = "STREAMWATCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "STREAMWATCH_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse::<SocketAddr>()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(port) = cli.port {
        config.server.listen_addr.set_port(port);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.json = true;
    }

    init_tracing(
        &TracingConfig::new("streamwatchd")
            .with_log_level(config.logging.level.clone())
            .with_json_format(config.logging.json),
    )?;

    config.validate()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        window_capacity = config.detector.window_capacity,
        z_score_threshold = config.detector.z_score_threshold,
        reference = ?config.detector.reference,
        workers = config.ingest.workers,
        "starting streamwatch daemon"
    );

    Server::new(config)?.run().await
}
