//! API request handlers

mod analyze;
mod stream;
mod system;

pub use analyze::*;
pub use stream::*;
pub use system::*;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::api::rest::state::AppState;
    use crate::cache::{CacheResult, InMemoryLastValueStore, LastValueStore};
    use crate::config::IngestConfig;
    use crate::error::CacheError;
    use crate::pipeline::{spawn_result_consumer, IngestPipeline};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use streamwatch_core::{AnomalyRegistry, RegistryConfig};
    use streamwatch_observability::MetricsRegistry;

    /// Cache whose backend is unreachable.
    pub struct DownStore;

    #[async_trait]
    impl LastValueStore for DownStore {
        async fn set(&self, _device_id: &str, _value: f64) -> CacheResult<()> {
            Err(CacheError::Connection("connection refused".into()))
        }

        async fn get(&self, _device_id: &str) -> CacheResult<Option<f64>> {
            Err(CacheError::Connection("connection refused".into()))
        }

        async fn ping(&self) -> CacheResult<()> {
            Err(CacheError::Connection("connection refused".into()))
        }
    }

    pub fn state_with(config: RegistryConfig, cache: Arc<dyn LastValueStore>) -> AppState {
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        let (registry, rx) = AnomalyRegistry::new(config).unwrap();
        let registry = Arc::new(registry.with_sink(Arc::new(metrics.stream().clone())));
        spawn_result_consumer(rx);
        let (pipeline, _workers) = IngestPipeline::spawn(
            &IngestConfig {
                workers: 2,
                queue_capacity: 16,
            },
            Arc::clone(&registry),
        );
        AppState::new(registry, pipeline, cache, metrics)
    }

    pub fn test_state() -> AppState {
        state_with(
            RegistryConfig::default(),
            Arc::new(InMemoryLastValueStore::new(
                Duration::from_secs(900),
                "stream:data:",
            )),
        )
    }
}
