//! Streamwatch daemon library
//!
//! Components of the `streamwatchd` service:
//! - REST API for ingest, per-device statistics, metrics and status
//! - Sharded ingest pipeline in front of the anomaly registry
//! - Last-value cache with TTL
//! - Server lifecycle management

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;

pub use cache::{InMemoryLastValueStore, LastValueStore};
pub use config::DaemonConfig;
pub use error::{ApiError, CacheError, DaemonError};
pub use pipeline::{IngestPipeline, Reading};
pub use server::Server;
