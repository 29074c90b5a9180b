//! Last-value cache
//!
//! Keeps the most recent raw reading per device for the analyze endpoint.
//! Entries expire after a fixed TTL.

mod memory;

pub use memory::InMemoryLastValueStore;

use crate::error::CacheError;
use async_trait::async_trait;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Store of the latest reading per device
#[async_trait]
pub trait LastValueStore: Send + Sync {
    /// Record the latest value for a device, restarting its TTL
    async fn set(&self, device_id: &str, value: f64) -> CacheResult<()>;

    /// Latest unexpired value for a device
    async fn get(&self, device_id: &str) -> CacheResult<Option<f64>>;

    /// Check that the backend is reachable
    async fn ping(&self) -> CacheResult<()>;
}
