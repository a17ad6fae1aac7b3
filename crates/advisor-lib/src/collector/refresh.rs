//! Background signal refresh
//!
//! Periodically re-collects signals for a registered set of (region, SKU)
//! targets and persists them as snapshots. A failed target or a failed
//! persist is logged and counted, never fatal.

use super::signals::{SignalCollector, SignalKey, SignalRequest};
use crate::health::{components, HealthRegistry};
use crate::observability::{AdvisorMetrics, StructuredLogger};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default refresh interval (30 minutes)
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub interval: Duration,
    /// Run a cycle immediately on start instead of waiting one interval
    pub refresh_on_start: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REFRESH_INTERVAL,
            refresh_on_start: true,
        }
    }
}

/// Outcome of one refresh cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshStats {
    pub targets: usize,
    pub refreshed: usize,
    pub failed: usize,
    pub persisted: usize,
    pub elapsed_ms: u64,
}

pub struct RefreshWorker {
    collector: Arc<SignalCollector>,
    targets: DashMap<SignalKey, SignalRequest>,
    config: RefreshConfig,
    health: Option<HealthRegistry>,
    last_cycle: RwLock<Option<RefreshStats>>,
    logger: StructuredLogger,
    metrics: AdvisorMetrics,
}

impl RefreshWorker {
    pub fn new(collector: Arc<SignalCollector>, config: RefreshConfig) -> Self {
        Self {
            collector,
            targets: DashMap::new(),
            config,
            health: None,
            last_cycle: RwLock::new(None),
            logger: StructuredLogger::new("refresh-worker"),
            metrics: AdvisorMetrics::new(),
        }
    }

    /// Report cycle outcomes to a health registry
    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    /// Register a target. Re-registering the same target is a no-op.
    pub fn register(&self, request: SignalRequest) {
        self.targets.insert(request.key(), request);
        self.metrics.set_refresh_targets(self.targets.len() as i64);
    }

    pub fn unregister(&self, request: &SignalRequest) {
        self.targets.remove(&request.key());
        self.metrics.set_refresh_targets(self.targets.len() as i64);
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub async fn last_cycle(&self) -> Option<RefreshStats> {
        self.last_cycle.read().await.clone()
    }

    /// Run until a shutdown signal arrives
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            targets = self.targets.len(),
            "Starting signal refresh worker"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !self.config.refresh_on_start {
            // the first tick of a tokio interval completes immediately
            ticker.tick().await;
        }

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh_once().await;
                }
                _ = shutdown.recv() => {
                    info!("Shutting down signal refresh worker");
                    break;
                }
            }
        }
    }

    /// Re-collect every registered target once, bypassing the cache
    pub async fn refresh_once(&self) -> RefreshStats {
        let start = Instant::now();
        let requests: Vec<SignalRequest> =
            self.targets.iter().map(|entry| entry.value().clone()).collect();

        let mut stats = RefreshStats {
            targets: requests.len(),
            ..Default::default()
        };

        if requests.is_empty() {
            debug!("No refresh targets registered");
            self.record(stats.clone()).await;
            return stats;
        }

        let results = self.collector.collect_batch(requests, true).await;
        let mut records = Vec::with_capacity(results.len());
        for (request, result) in results {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    stats.failed += 1;
                    warn!(
                        region = %request.region,
                        sku = %request.sku,
                        error = %e,
                        "Signal refresh failed for target"
                    );
                }
            }
        }
        stats.refreshed = records.len();

        match self.collector.persist(&records).await {
            Ok(count) => stats.persisted = count,
            Err(e) => warn!(error = %e, "Failed to persist signal snapshots"),
        }

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        self.logger
            .log_refresh_cycle(stats.targets, stats.refreshed, stats.failed, stats.persisted);
        self.record(stats.clone()).await;
        stats
    }

    async fn record(&self, stats: RefreshStats) {
        if let Some(health) = &self.health {
            if stats.failed > 0 && stats.refreshed == 0 {
                health
                    .set_degraded(
                        components::REFRESH_WORKER,
                        format!("all {} refresh targets failed", stats.failed),
                    )
                    .await;
            } else if stats.failed > 0 {
                health
                    .set_degraded(
                        components::REFRESH_WORKER,
                        format!("{} of {} refresh targets failed", stats.failed, stats.targets),
                    )
                    .await;
            } else {
                health.set_healthy(components::REFRESH_WORKER).await;
            }
        }
        *self.last_cycle.write().await = Some(stats);
    }
}
