//! Ingest pipeline
//!
//! A fixed pool of workers in front of the [`AnomalyRegistry`]. Each worker
//! owns a bounded queue and readings are routed by device identity, so a
//! device is always handled by the same worker in arrival order.

mod consumer;

pub use consumer::spawn_result_consumer;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use streamwatch_core::{AnomalyRegistry, CoreError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::IngestConfig;

/// A single accepted reading
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub device_id: String,
    pub value: f64,
}

impl Reading {
    pub fn new(device_id: impl Into<String>, value: f64) -> Self {
        Self {
            device_id: device_id.into(),
            value,
        }
    }
}

/// The worker for this reading has stopped.
#[derive(Debug, Error)]
#[error("ingest pipeline closed")]
pub struct PipelineClosed(pub Reading);

/// Handle for submitting readings to the worker pool.
#[derive(Clone)]
pub struct IngestPipeline {
    shards: Arc<[mpsc::Sender<Reading>]>,
}

impl IngestPipeline {
    /// Start `config.workers` workers feeding `registry`.
    ///
    /// Workers exit once every handle is dropped and their queues drain.
    pub fn spawn(
        config: &IngestConfig,
        registry: Arc<AnomalyRegistry>,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let workers = config.workers.max(1);
        let capacity = config.queue_capacity.max(1);

        let mut shards = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let (tx, rx) = mpsc::channel(capacity);
            shards.push(tx);
            handles.push(tokio::spawn(run_worker(worker, rx, Arc::clone(&registry))));
        }

        info!(workers, queue_capacity = capacity, "ingest pipeline started");

        (
            Self {
                shards: shards.into(),
            },
            handles,
        )
    }

    /// Queue a reading, waiting while its worker's queue is full.
    pub async fn submit(&self, reading: Reading) -> Result<(), PipelineClosed> {
        let shard = self.shard_for(&reading.device_id);
        self.shards[shard]
            .send(reading)
            .await
            .map_err(|e| PipelineClosed(e.0))
    }

    /// Index of the worker responsible for a device.
    pub fn shard_for(&self, device_id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        device_id.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    pub fn workers(&self) -> usize {
        self.shards.len()
    }
}

impl std::fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("workers", &self.shards.len())
            .finish()
    }
}

async fn run_worker(
    worker: usize,
    mut rx: mpsc::Receiver<Reading>,
    registry: Arc<AnomalyRegistry>,
) {
    debug!(worker, "ingest worker started");
    while let Some(reading) = rx.recv().await {
        match registry.process(&reading.device_id, reading.value).await {
            Ok(_) => {}
            Err(CoreError::OutputClosed) => {
                warn!(worker, "result queue closed, stopping ingest worker");
                break;
            }
            Err(e) => {
                warn!(
                    worker,
                    device_id = %reading.device_id,
                    error = %e,
                    "rejected reading"
                );
            }
        }
    }
    debug!(worker, "ingest worker stopped");
}
