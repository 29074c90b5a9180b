//! Result queue consumer

use streamwatch_core::AnalyticsResult;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Drain the registry's result queue until every sender is gone.
///
/// The task resolves to the number of results consumed.
pub fn spawn_result_consumer(mut rx: mpsc::Receiver<AnalyticsResult>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut consumed = 0u64;
        while let Some(result) = rx.recv().await {
            consumed += 1;
            debug!(
                device_id = %result.device_id,
                sequence = result.sequence,
                value = result.value,
                average = result.average,
                std_dev = result.std_dev,
                z_score = result.z_score,
                is_anomaly = result.is_anomaly,
                "analytics result"
            );
        }
        info!(consumed, "result consumer stopped");
        consumed
    })
}
