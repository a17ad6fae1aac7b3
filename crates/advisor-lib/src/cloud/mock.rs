//! Instrumented cloud API for tests

use super::{async_trait, CloudApi, StaticCatalog};
use crate::error::CloudApiError;
use crate::models::{
    ComputeUsage, QuotaInfo, RegionInfo, RetailPrice, SkuCapabilities, SkuFilter, SkuRecord,
    SpotLabel, SpotScoreResult,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Wraps a [`StaticCatalog`], counting calls and optionally throttling or
/// delaying them.
pub struct MockCloudApi {
    catalog: StaticCatalog,
    pub sku_calls: AtomicUsize,
    pub usage_calls: AtomicUsize,
    pub price_calls: AtomicUsize,
    pub spot_calls: AtomicUsize,
    /// Number of upcoming `get_skus` calls that fail with throttling
    pub throttle_skus: AtomicUsize,
    pub delay: Duration,
    /// Regions whose every call fails with a timeout
    pub failing_regions: Vec<String>,
}

impl MockCloudApi {
    pub fn new(catalog: StaticCatalog) -> Self {
        Self {
            catalog,
            sku_calls: AtomicUsize::new(0),
            usage_calls: AtomicUsize::new(0),
            price_calls: AtomicUsize::new(0),
            spot_calls: AtomicUsize::new(0),
            throttle_skus: AtomicUsize::new(0),
            delay: Duration::ZERO,
            failing_regions: Vec::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_failing_region(mut self, region: &str) -> Self {
        self.failing_regions.push(region.to_ascii_lowercase());
        self
    }

    pub fn total_calls(&self) -> usize {
        self.sku_calls.load(Ordering::SeqCst)
            + self.usage_calls.load(Ordering::SeqCst)
            + self.price_calls.load(Ordering::SeqCst)
            + self.spot_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self, region: &str) -> Result<(), CloudApiError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing_regions.contains(&region.to_ascii_lowercase()) {
            return Err(CloudApiError::Forbidden(format!("region {} unavailable", region)));
        }
        Ok(())
    }
}

#[async_trait]
impl CloudApi for MockCloudApi {
    async fn list_regions(
        &self,
        subscription: &str,
        tenant: Option<&str>,
    ) -> Result<Vec<RegionInfo>, CloudApiError> {
        self.catalog.list_regions(subscription, tenant).await
    }

    async fn get_skus(
        &self,
        region: &str,
        subscription: &str,
        tenant: Option<&str>,
        resource_type: &str,
        filter: &SkuFilter,
    ) -> Result<Vec<SkuRecord>, CloudApiError> {
        self.sku_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(region).await?;
        let throttled = self
            .throttle_skus
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if throttled {
            return Err(CloudApiError::Throttled {
                retry_after: Some(Duration::from_millis(1)),
            });
        }
        self.catalog
            .get_skus(region, subscription, tenant, resource_type, filter)
            .await
    }

    async fn get_spot_placement_scores(
        &self,
        region: &str,
        subscription: &str,
        sku_names: &[String],
        instance_count: u32,
        tenant: Option<&str>,
    ) -> Result<SpotScoreResult, CloudApiError> {
        self.spot_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(region).await?;
        self.catalog
            .get_spot_placement_scores(region, subscription, sku_names, instance_count, tenant)
            .await
    }

    async fn get_compute_usages(
        &self,
        region: &str,
        subscription: &str,
        tenant: Option<&str>,
    ) -> Result<Vec<ComputeUsage>, CloudApiError> {
        self.usage_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(region).await?;
        self.catalog.get_compute_usages(region, subscription, tenant).await
    }

    async fn get_retail_prices(
        &self,
        region: &str,
        sku_names: &[String],
        currency: &str,
    ) -> Result<Vec<RetailPrice>, CloudApiError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(region).await?;
        self.catalog.get_retail_prices(region, sku_names, currency).await
    }
}

/// Per-region fixture: SKU shape, quota and spot label
pub struct RegionFixture {
    pub region: &'static str,
    pub sku: &'static str,
    pub vcpus: u32,
    pub zones: u32,
    pub quota_remaining: Option<u64>,
    pub spot: SpotLabel,
    pub paygo: f64,
    pub spot_price: f64,
}

impl RegionFixture {
    pub fn new(region: &'static str) -> Self {
        Self {
            region,
            sku: "Standard_D2s_v5",
            vcpus: 2,
            zones: 3,
            quota_remaining: Some(1000),
            spot: SpotLabel::High,
            paygo: 0.10,
            spot_price: 0.02,
        }
    }
}

/// Build a catalog from region fixtures; the first fixture's region is listed first.
pub fn catalog_from(fixtures: &[RegionFixture]) -> StaticCatalog {
    let mut catalog = StaticCatalog::default();
    for f in fixtures {
        let family = "standardDSv5Family".to_string();
        catalog.regions.push(RegionInfo {
            name: f.region.to_string(),
            display_name: f.region.to_string(),
        });
        catalog.skus.entry(f.region.to_string()).or_default().push(SkuRecord {
            name: f.sku.to_string(),
            family: family.clone(),
            zones: (1..=f.zones).map(|z| z.to_string()).collect(),
            restrictions: vec![],
            capabilities: SkuCapabilities {
                vcpus: f.vcpus,
                memory_gb: f.vcpus as f64 * 4.0,
                ..Default::default()
            },
            eviction_rate: Some("0-5".to_string()),
            quota: None,
            pricing: None,
        });
        if let Some(remaining) = f.quota_remaining {
            let quota = QuotaInfo::new(remaining, 0);
            catalog.usages.entry(f.region.to_string()).or_default().push(ComputeUsage {
                family,
                limit: quota.limit,
                used: quota.used,
            });
        }
        catalog.prices.entry(f.region.to_string()).or_default().push(RetailPrice {
            sku: f.sku.to_string(),
            paygo: Some(f.paygo),
            spot: Some(f.spot_price),
            currency: "USD".to_string(),
        });
        if f.spot.is_known() {
            let zones: BTreeMap<String, SpotLabel> =
                (1..=f.zones).map(|z| (z.to_string(), f.spot)).collect();
            catalog
                .spot_scores
                .entry(f.region.to_string())
                .or_default()
                .insert(f.sku.to_string(), zones);
        }
    }
    catalog
}
