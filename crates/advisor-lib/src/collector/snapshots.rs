//! Historical signal snapshots
//!
//! The advisor only needs two things from a time-series store: append a batch
//! and read one (region, SKU) history back. [`InMemorySnapshotStore`] is a
//! bounded ring buffer with FIFO eviction, suitable for a single daemon and
//! for tests.

use crate::error::AdvisorResult;
use crate::models::SignalSnapshot;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Default retention period (7 days, matching the volatility window)
const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default maximum number of snapshots kept
const DEFAULT_MAX_SIZE: usize = 100_000;

/// Read/write access to persisted signal snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Append a batch, returning how many snapshots were stored
    async fn persist(&self, batch: Vec<SignalSnapshot>) -> AdvisorResult<usize>;

    /// Snapshots for one (region, SKU) collected at or after `since`, oldest first
    async fn history(
        &self,
        region: &str,
        sku: &str,
        since: DateTime<Utc>,
    ) -> AdvisorResult<Vec<SignalSnapshot>>;
}

/// Configuration for the in-memory store
#[derive(Debug, Clone)]
pub struct SnapshotStoreConfig {
    pub max_retention: Duration,
    pub max_size: usize,
}

impl Default for SnapshotStoreConfig {
    fn default() -> Self {
        Self {
            max_retention: DEFAULT_RETENTION,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

/// Ring buffer of snapshots ordered by insertion
#[derive(Debug)]
pub struct InMemorySnapshotStore {
    buffer: RwLock<VecDeque<SignalSnapshot>>,
    config: SnapshotStoreConfig,
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new(SnapshotStoreConfig::default())
    }
}

impl InMemorySnapshotStore {
    pub fn new(config: SnapshotStoreConfig) -> Self {
        Self {
            buffer: RwLock::new(VecDeque::with_capacity(config.max_size.min(10_000))),
            config,
        }
    }

    pub async fn len(&self) -> usize {
        self.buffer.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.buffer.read().await.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.max_size
    }

    fn retention_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let retention = ChronoDuration::from_std(self.config.max_retention)
            .unwrap_or_else(|_| ChronoDuration::days(7));
        now - retention
    }

    /// Drop snapshots older than the retention period
    fn evict_expired(&self, buffer: &mut VecDeque<SignalSnapshot>, now: DateTime<Utc>) -> usize {
        let cutoff = self.retention_cutoff(now);
        let before = buffer.len();
        buffer.retain(|s| s.collected_at >= cutoff);
        before - buffer.len()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn persist(&self, batch: Vec<SignalSnapshot>) -> AdvisorResult<usize> {
        let stored = batch.len();
        let mut buffer = self.buffer.write().await;

        for snapshot in batch {
            while buffer.len() >= self.config.max_size.max(1) {
                buffer.pop_front();
            }
            buffer.push_back(snapshot);
        }

        let evicted = self.evict_expired(&mut buffer, Utc::now());
        debug!(
            stored = stored,
            evicted = evicted,
            entries = buffer.len(),
            "Persisted signal snapshots"
        );
        Ok(stored)
    }

    async fn history(
        &self,
        region: &str,
        sku: &str,
        since: DateTime<Utc>,
    ) -> AdvisorResult<Vec<SignalSnapshot>> {
        let buffer = self.buffer.read().await;
        let mut matching: Vec<SignalSnapshot> = buffer
            .iter()
            .filter(|s| {
                s.collected_at >= since
                    && s.region.eq_ignore_ascii_case(region)
                    && s.sku.eq_ignore_ascii_case(sku)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.collected_at);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpotLabel;

    fn snapshot(region: &str, sku: &str, minutes_ago: i64) -> SignalSnapshot {
        SignalSnapshot {
            region: region.into(),
            sku: sku.into(),
            collected_at: Utc::now() - ChronoDuration::minutes(minutes_ago),
            spot_label: SpotLabel::High,
            paygo_price: Some(0.2),
            spot_price: Some(0.05),
            zone_count: Some(3),
            restrictions_present: Some(false),
        }
    }

    #[tokio::test]
    async fn test_history_filters_by_target_and_time() {
        let store = InMemorySnapshotStore::default();
        store
            .persist(vec![
                snapshot("eastus", "Standard_D4s_v5", 30),
                snapshot("eastus", "Standard_D4s_v5", 90),
                snapshot("westeurope", "Standard_D4s_v5", 10),
                snapshot("eastus", "Standard_E4s_v5", 10),
            ])
            .await
            .unwrap();

        let since = Utc::now() - ChronoDuration::hours(1);
        let history = store
            .history("EastUS", "standard_d4s_v5", since)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);

        let all = store
            .history("eastus", "Standard_D4s_v5", Utc::now() - ChronoDuration::days(1))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].collected_at < all[1].collected_at);
    }

    #[tokio::test]
    async fn test_ring_buffer_evicts_oldest_at_capacity() {
        let store = InMemorySnapshotStore::new(SnapshotStoreConfig {
            max_size: 3,
            ..Default::default()
        });
        let batch = (0..5).map(|i| snapshot("eastus", "D4", 10 - i)).collect();
        assert_eq!(store.persist(batch).await.unwrap(), 5);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_expired_snapshots_are_dropped() {
        let store = InMemorySnapshotStore::new(SnapshotStoreConfig {
            max_retention: Duration::from_secs(3600),
            ..Default::default()
        });
        store
            .persist(vec![snapshot("eastus", "D4", 120), snapshot("eastus", "D4", 5)])
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }
}
