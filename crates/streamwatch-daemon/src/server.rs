//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::cache::{InMemoryLastValueStore, LastValueStore};
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::pipeline::{spawn_result_consumer, IngestPipeline};
use std::sync::Arc;
use std::time::Duration;
use streamwatch_core::{AnalyticsResult, AnomalyRegistry, TracingSink};
use streamwatch_observability::MetricsRegistry;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Streamwatch daemon server
pub struct Server {
    config: DaemonConfig,
    registry: Arc<AnomalyRegistry>,
    results: mpsc::Receiver<AnalyticsResult>,
    cache: Arc<InMemoryLastValueStore>,
    metrics: Arc<MetricsRegistry>,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        config.validate()?;

        let metrics = Arc::new(MetricsRegistry::new()?);

        let (registry, results) = AnomalyRegistry::new(config.detector.clone())?;
        let mut registry = registry.with_sink(Arc::new(metrics.stream().clone()));
        if config.logging.anomalies {
            registry = registry.with_sink(Arc::new(TracingSink));
        }

        let cache = Arc::new(InMemoryLastValueStore::from_config(&config.cache));

        Ok(Self {
            config,
            registry: Arc::new(registry),
            results,
            cache,
            metrics,
        })
    }

    /// Run the server until a shutdown signal, then drain in-flight readings
    pub async fn run(self) -> DaemonResult<()> {
        let Server {
            config,
            registry,
            results,
            cache,
            metrics,
        } = self;
        let addr = config.server.listen_addr;

        let consumer = spawn_result_consumer(results);
        let (pipeline, workers) = IngestPipeline::spawn(&config.ingest, Arc::clone(&registry));
        let sweeper = spawn_cache_sweeper(
            Arc::clone(&cache),
            Duration::from_secs(config.cache.sweep_interval_secs),
        );

        let store: Arc<dyn LastValueStore> = cache;
        let state = AppState::new(Arc::clone(&registry), pipeline, store, metrics);
        let app = create_router(state, &config.server);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "streamwatch daemon listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("streamwatch daemon shutting down");

        // The router (and with it every pipeline handle) is gone; let the
        // workers drain, then close the result queue.
        sweeper.abort();
        for worker in futures::future::join_all(workers).await {
            if let Err(e) = worker {
                tracing::error!(error = %e, "ingest worker failed");
            }
        }
        drop(registry);

        match consumer.await {
            Ok(consumed) => tracing::info!(consumed, "results drained"),
            Err(e) => tracing::error!(error = %e, "result consumer failed"),
        }

        Ok(())
    }
}

fn spawn_cache_sweeper(cache: Arc<InMemoryLastValueStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "expired cache entries removed");
            }
        }
    })
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
