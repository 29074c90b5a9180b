//! In-memory last-value cache

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::{CacheResult, LastValueStore};
use crate::config::CacheConfig;

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: f64,
    expires_at: Instant,
}

/// DashMap-backed cache with lazy expiry plus an explicit sweep.
pub struct InMemoryLastValueStore {
    entries: DashMap<String, Entry>,
    ttl: Duration,
    key_prefix: String,
}

impl InMemoryLastValueStore {
    pub fn new(ttl: Duration, key_prefix: impl Into<String>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            key_prefix: key_prefix.into(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs), config.key_prefix.clone())
    }

    fn key(&self, device_id: &str) -> String {
        format!("{}{}", self.key_prefix, device_id)
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LastValueStore for InMemoryLastValueStore {
    async fn set(&self, device_id: &str, value: f64) -> CacheResult<()> {
        self.entries.insert(
            self.key(device_id),
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, device_id: &str) -> CacheResult<Option<f64>> {
        let key = self.key(device_id);
        let now = Instant::now();
        let entry = match self.entries.get(&key) {
            Some(entry) => *entry,
            None => return Ok(None),
        };
        if entry.expires_at <= now {
            self.entries.remove_if(&key, |_, e| e.expires_at <= now);
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
