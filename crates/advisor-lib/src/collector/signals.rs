//! Per-(region, SKU) signal collection
//!
//! The collector shields the cloud API from redundant traffic: results are
//! cached for a TTL window, identical concurrent requests share one fetch,
//! and every external call goes through the shared [`CallGate`].
//!
//! A single fetch makes up to four calls (SKU lookup, usages, prices, spot
//! scores). Only the SKU lookup is mandatory; the others degrade to missing
//! signals plus a warning on the record.

use super::cache::{TtlCache, DEFAULT_CACHE_TTL};
use super::gate::{CallGate, RetryPolicy, DEFAULT_MAX_CONCURRENCY};
use super::single_flight::SingleFlight;
use super::snapshots::SnapshotStore;
use crate::cloud::{enrich_with_prices, enrich_with_quotas, CloudApi, VIRTUAL_MACHINES};
use crate::error::{AdvisorError, AdvisorResult, CloudApiError};
use crate::models::{SignalSet, SignalSnapshot, SkuFilter, SkuRecord, SpotLabel};
use crate::observability::AdvisorMetrics;
use crate::scoring::{
    classify_volatility, deployment_confidence, ConfidenceResult, VolatilityLabel,
    VolatilityReport, DEFAULT_VOLATILITY_WINDOW,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Configuration for the signal collector
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub cache_ttl: Duration,
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
    /// Currency used for retail price lookups
    pub currency: String,
    /// Look-back window for volatility classification
    pub volatility_window: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            retry: RetryPolicy::default(),
            currency: "USD".to_string(),
            volatility_window: DEFAULT_VOLATILITY_WINDOW,
        }
    }
}

/// What to collect signals for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalRequest {
    pub subscription: String,
    #[serde(default)]
    pub tenant: Option<String>,
    pub region: String,
    pub sku: String,
    #[serde(default = "default_instance_count")]
    pub instance_count: u32,
}

fn default_instance_count() -> u32 {
    1
}

impl SignalRequest {
    pub fn new(subscription: impl Into<String>, region: impl Into<String>, sku: impl Into<String>) -> Self {
        Self {
            subscription: subscription.into(),
            tenant: None,
            region: region.into(),
            sku: sku.into(),
            instance_count: 1,
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_instance_count(mut self, count: u32) -> Self {
        self.instance_count = count.max(1);
        self
    }

    /// Cache identity: (tenant, region, SKU, instance count), case-insensitive
    pub fn key(&self) -> SignalKey {
        SignalKey {
            tenant: self.tenant.clone().unwrap_or_default().to_ascii_lowercase(),
            region: self.region.trim().to_ascii_lowercase(),
            sku: self.sku.trim().to_ascii_lowercase(),
            instance_count: self.instance_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalKey {
    tenant: String,
    region: String,
    sku: String,
    instance_count: u32,
}

/// Merged signals for one (region, SKU)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub region: String,
    pub sku: String,
    pub vcpus: Option<u32>,
    pub spot_label: SpotLabel,
    pub paygo_price: Option<f64>,
    pub spot_price: Option<f64>,
    pub zone_count: Option<u32>,
    pub restrictions_present: Option<bool>,
    pub quota_remaining: Option<u64>,
    pub eviction_rate: Option<String>,
    pub volatility: Option<VolatilityLabel>,
    pub confidence: ConfidenceResult,
    pub collected_at: DateTime<Utc>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl SignalRecord {
    pub fn signal_set(&self) -> SignalSet {
        SignalSet {
            vcpus: self.vcpus,
            zones_available: self.zone_count,
            restrictions_present: self.restrictions_present,
            quota_remaining: self.quota_remaining,
            spot_label: self.spot_label.is_known().then_some(self.spot_label),
            paygo_price: self.paygo_price,
            spot_price: self.spot_price,
            eviction_rate: self.eviction_rate.clone(),
            volatility: self.volatility,
        }
    }

    pub fn to_snapshot(&self) -> SignalSnapshot {
        SignalSnapshot {
            region: self.region.clone(),
            sku: self.sku.clone(),
            collected_at: self.collected_at,
            spot_label: self.spot_label,
            paygo_price: self.paygo_price,
            spot_price: self.spot_price,
            zone_count: self.zone_count,
            restrictions_present: self.restrictions_present,
        }
    }
}

/// Cached, deduplicated, rate-limited signal source
pub struct SignalCollector {
    api: Arc<dyn CloudApi>,
    gate: CallGate,
    cache: TtlCache<SignalKey, SignalRecord>,
    flights: SingleFlight<SignalKey, SignalRecord, CloudApiError>,
    store: Option<Arc<dyn SnapshotStore>>,
    config: CollectorConfig,
    metrics: AdvisorMetrics,
}

impl SignalCollector {
    pub fn new(api: Arc<dyn CloudApi>, config: CollectorConfig) -> Self {
        Self {
            api,
            gate: CallGate::new(config.max_concurrency, config.retry.clone()),
            cache: TtlCache::new(config.cache_ttl),
            flights: SingleFlight::new(),
            store: None,
            config,
            metrics: AdvisorMetrics::new(),
        }
    }

    /// Attach a snapshot store used for persistence and volatility
    pub fn with_snapshot_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn api(&self) -> &Arc<dyn CloudApi> {
        &self.api
    }

    /// The gate shared with every other component calling the cloud API
    pub fn gate(&self) -> &CallGate {
        &self.gate
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn has_snapshot_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached record
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Signals for one (region, SKU), served from cache when still fresh
    pub async fn collect(&self, request: &SignalRequest) -> AdvisorResult<SignalRecord> {
        let key = request.key();
        if let Some(record) = self.cache.get(&key) {
            self.metrics.inc_cache_hit();
            return Ok(record);
        }
        self.metrics.inc_cache_miss();

        let flight = self
            .flights
            .run(key.clone(), || self.fetch(request))
            .await?;

        if flight.shared {
            self.metrics.inc_inflight_shared();
            debug!(region = %request.region, sku = %request.sku, "Joined in-flight signal fetch");
        }

        Ok(self.cache.insert(key, flight.value))
    }

    /// Bypass the cache and replace the entry with a fresh fetch
    pub async fn collect_fresh(&self, request: &SignalRequest) -> AdvisorResult<SignalRecord> {
        self.cache.invalidate(&request.key());
        self.collect(request).await
    }

    /// Collect many targets concurrently. Results keep the input order.
    pub async fn collect_batch(
        self: &Arc<Self>,
        requests: Vec<SignalRequest>,
        fresh: bool,
    ) -> Vec<(SignalRequest, AdvisorResult<SignalRecord>)> {
        let mut tasks = JoinSet::new();
        for (index, request) in requests.iter().cloned().enumerate() {
            let collector = Arc::clone(self);
            tasks.spawn(async move {
                let result = if fresh {
                    collector.collect_fresh(&request).await
                } else {
                    collector.collect(&request).await
                };
                (index, result)
            });
        }

        let mut slots: Vec<Option<AdvisorResult<SignalRecord>>> =
            requests.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => warn!(error = %e, "Signal collection task failed"),
            }
        }

        requests
            .into_iter()
            .zip(slots)
            .map(|(request, slot)| {
                let result = slot.unwrap_or_else(|| {
                    Err(AdvisorError::Api(CloudApiError::Transport(
                        "collection task aborted".to_string(),
                    )))
                });
                (request, result)
            })
            .collect()
    }

    /// Persist records as snapshots. Without a store this is a no-op.
    pub async fn persist(&self, records: &[SignalRecord]) -> AdvisorResult<usize> {
        match &self.store {
            Some(store) if !records.is_empty() => {
                store
                    .persist(records.iter().map(SignalRecord::to_snapshot).collect())
                    .await
            }
            _ => Ok(0),
        }
    }

    /// Volatility over the configured window, if a store is attached
    pub async fn volatility_for(&self, region: &str, sku: &str) -> Option<VolatilityReport> {
        let store = self.store.as_ref()?;
        let now = Utc::now();
        let window = ChronoDuration::from_std(self.config.volatility_window)
            .unwrap_or_else(|_| ChronoDuration::days(7));

        match store.history(region, sku, now - window).await {
            Ok(history) => Some(classify_volatility(
                &history,
                now,
                self.config.volatility_window,
            )),
            Err(e) => {
                warn!(region = %region, sku = %sku, error = %e, "Snapshot history unavailable");
                None
            }
        }
    }

    async fn fetch(&self, request: &SignalRequest) -> Result<SignalRecord, CloudApiError> {
        let tenant = request.tenant.as_deref();
        let filter = SkuFilter {
            names: vec![request.sku.clone()],
            ..Default::default()
        };

        let skus = self
            .gate
            .call("get_skus", || {
                self.api.get_skus(
                    &request.region,
                    &request.subscription,
                    tenant,
                    VIRTUAL_MACHINES,
                    &filter,
                )
            })
            .await?;

        let mut sku: SkuRecord = skus
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(&request.sku))
            .ok_or_else(|| {
                CloudApiError::NotFound(format!("SKU {} not offered in {}", request.sku, request.region))
            })?;

        let mut warnings = Vec::new();

        match self
            .gate
            .call("get_compute_usages", || {
                self.api
                    .get_compute_usages(&request.region, &request.subscription, tenant)
            })
            .await
        {
            Ok(usages) => enrich_with_quotas(std::slice::from_mut(&mut sku), &usages),
            Err(e) => warnings.push(format!("{}: quota unavailable ({})", request.region, e)),
        }

        let names = vec![sku.name.clone()];
        match self
            .gate
            .call("get_retail_prices", || {
                self.api
                    .get_retail_prices(&request.region, &names, &self.config.currency)
            })
            .await
        {
            Ok(prices) => {
                enrich_with_prices(std::slice::from_mut(&mut sku), &prices, &self.config.currency)
            }
            Err(e) => warnings.push(format!("{}: pricing unavailable ({})", request.region, e)),
        }

        let spot_label = match self
            .gate
            .call("get_spot_placement_scores", || {
                self.api.get_spot_placement_scores(
                    &request.region,
                    &request.subscription,
                    &names,
                    request.instance_count,
                    tenant,
                )
            })
            .await
        {
            Ok(result) => {
                warnings.extend(result.errors.iter().cloned());
                result.best_label(&sku.name)
            }
            Err(e) => {
                warnings.push(format!("{}: spot placement score unavailable ({})", request.region, e));
                SpotLabel::Unknown
            }
        };

        let volatility = self
            .volatility_for(&request.region, &sku.name)
            .await
            .map(|report| report.label);

        let pricing = sku.pricing.clone();
        let signals = SignalSet {
            vcpus: Some(sku.capabilities.vcpus),
            zones_available: Some(sku.usable_zones().len() as u32),
            restrictions_present: Some(sku.restrictions_present()),
            quota_remaining: sku.quota.map(|q| q.remaining),
            spot_label: spot_label.is_known().then_some(spot_label),
            paygo_price: pricing.as_ref().and_then(|p| p.paygo),
            spot_price: pricing.as_ref().and_then(|p| p.spot),
            eviction_rate: sku.eviction_rate.clone(),
            volatility,
        };
        let confidence = deployment_confidence(&signals);

        Ok(SignalRecord {
            region: request.region.trim().to_ascii_lowercase(),
            sku: sku.name,
            vcpus: signals.vcpus,
            spot_label,
            paygo_price: signals.paygo_price,
            spot_price: signals.spot_price,
            zone_count: signals.zones_available,
            restrictions_present: signals.restrictions_present,
            quota_remaining: signals.quota_remaining,
            eviction_rate: signals.eviction_rate,
            volatility,
            confidence,
            collected_at: Utc::now(),
            warnings,
        })
    }
}
