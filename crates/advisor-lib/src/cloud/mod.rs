//! Cloud management API seam
//!
//! The advisor never talks HTTP itself. Everything it knows about regions,
//! SKUs, quotas, prices and spot placement comes through [`CloudApi`].
//! Implementations must be cheap to share across tasks.

mod catalog;
mod enrich;
#[cfg(test)]
pub(crate) mod mock;

pub use catalog::StaticCatalog;
pub use enrich::{enrich_with_prices, enrich_with_quotas};

use crate::error::CloudApiError;
use crate::models::{
    ComputeUsage, RegionInfo, RetailPrice, SkuFilter, SkuRecord, SpotScoreResult,
};
pub use async_trait::async_trait;

/// Resource type queried for virtual machine SKUs
pub const VIRTUAL_MACHINES: &str = "virtualMachines";

/// Trait for cloud management API clients
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// List availability-zone-enabled regions
    async fn list_regions(
        &self,
        subscription: &str,
        tenant: Option<&str>,
    ) -> Result<Vec<RegionInfo>, CloudApiError>;

    /// List SKUs offered in a region, filtered
    async fn get_skus(
        &self,
        region: &str,
        subscription: &str,
        tenant: Option<&str>,
        resource_type: &str,
        filter: &SkuFilter,
    ) -> Result<Vec<SkuRecord>, CloudApiError>;

    /// Spot placement scores for a batch of SKUs in one region
    async fn get_spot_placement_scores(
        &self,
        region: &str,
        subscription: &str,
        sku_names: &[String],
        instance_count: u32,
        tenant: Option<&str>,
    ) -> Result<SpotScoreResult, CloudApiError>;

    /// Per-family vCPU usage and limits
    async fn get_compute_usages(
        &self,
        region: &str,
        subscription: &str,
        tenant: Option<&str>,
    ) -> Result<Vec<ComputeUsage>, CloudApiError>;

    /// Retail prices for a set of SKUs
    async fn get_retail_prices(
        &self,
        region: &str,
        sku_names: &[String],
        currency: &str,
    ) -> Result<Vec<RetailPrice>, CloudApiError>;
}
