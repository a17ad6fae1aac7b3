//! Offline cloud API backed by a JSON catalog snapshot
//!
//! Used by the CLI for what-if planning and by the daemon when no live client
//! is wired in. Region keys are matched case-insensitively.

use super::{async_trait, CloudApi};
use crate::error::{AdvisorResult, CloudApiError};
use crate::models::{
    ComputeUsage, RegionInfo, RetailPrice, SkuFilter, SkuRecord, SpotLabel, SpotScoreResult,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Serialized catalog layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    pub regions: Vec<RegionInfo>,
    /// region -> SKUs
    #[serde(default)]
    pub skus: HashMap<String, Vec<SkuRecord>>,
    /// region -> usages
    #[serde(default)]
    pub usages: HashMap<String, Vec<ComputeUsage>>,
    /// region -> retail prices
    #[serde(default)]
    pub prices: HashMap<String, Vec<RetailPrice>>,
    /// region -> sku -> zone -> label
    #[serde(default)]
    pub spot_scores: HashMap<String, BTreeMap<String, BTreeMap<String, SpotLabel>>>,
}

impl StaticCatalog {
    /// Parse a catalog from JSON text
    pub fn from_json(json: &str) -> AdvisorResult<Self> {
        let catalog: StaticCatalog = serde_json::from_str(json)?;
        Ok(catalog.normalized())
    }

    /// Load a catalog from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> AdvisorResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Lower-case every region key so lookups are case-insensitive
    fn normalized(self) -> Self {
        fn lower<V>(map: HashMap<String, V>) -> HashMap<String, V> {
            map.into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect()
        }

        Self {
            regions: self
                .regions
                .into_iter()
                .map(|r| RegionInfo {
                    name: r.name.to_ascii_lowercase(),
                    display_name: r.display_name,
                })
                .collect(),
            skus: lower(self.skus),
            usages: lower(self.usages),
            prices: lower(self.prices),
            spot_scores: lower(self.spot_scores),
        }
    }

    fn region_key(region: &str) -> String {
        region.trim().to_ascii_lowercase()
    }
}

#[async_trait]
impl CloudApi for StaticCatalog {
    async fn list_regions(
        &self,
        _subscription: &str,
        _tenant: Option<&str>,
    ) -> Result<Vec<RegionInfo>, CloudApiError> {
        Ok(self.regions.clone())
    }

    async fn get_skus(
        &self,
        region: &str,
        _subscription: &str,
        _tenant: Option<&str>,
        _resource_type: &str,
        filter: &SkuFilter,
    ) -> Result<Vec<SkuRecord>, CloudApiError> {
        let skus = self
            .skus
            .get(&Self::region_key(region))
            .ok_or_else(|| CloudApiError::NotFound(format!("no SKUs for region {}", region)))?;

        Ok(skus.iter().filter(|s| filter.matches(s)).cloned().collect())
    }

    async fn get_spot_placement_scores(
        &self,
        region: &str,
        _subscription: &str,
        sku_names: &[String],
        _instance_count: u32,
        _tenant: Option<&str>,
    ) -> Result<SpotScoreResult, CloudApiError> {
        let mut result = SpotScoreResult::default();
        let region_scores = self.spot_scores.get(&Self::region_key(region));

        for name in sku_names {
            let zones = region_scores.and_then(|scores| {
                scores
                    .iter()
                    .find(|(sku, _)| sku.eq_ignore_ascii_case(name))
                    .map(|(_, zones)| zones.clone())
            });
            match zones {
                Some(zones) => {
                    result.scores.insert(name.clone(), zones);
                }
                None => result
                    .errors
                    .push(format!("no spot placement score for {} in {}", name, region)),
            }
        }

        Ok(result)
    }

    async fn get_compute_usages(
        &self,
        region: &str,
        _subscription: &str,
        _tenant: Option<&str>,
    ) -> Result<Vec<ComputeUsage>, CloudApiError> {
        self.usages
            .get(&Self::region_key(region))
            .cloned()
            .ok_or_else(|| CloudApiError::Forbidden(format!("usage data unavailable for {}", region)))
    }

    async fn get_retail_prices(
        &self,
        region: &str,
        sku_names: &[String],
        currency: &str,
    ) -> Result<Vec<RetailPrice>, CloudApiError> {
        let prices = self
            .prices
            .get(&Self::region_key(region))
            .ok_or_else(|| CloudApiError::NotFound(format!("no prices for region {}", region)))?;

        Ok(prices
            .iter()
            .filter(|p| p.currency.eq_ignore_ascii_case(currency))
            .filter(|p| sku_names.iter().any(|n| n.eq_ignore_ascii_case(&p.sku)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"{
        "regions": [{"name": "FranceCentral", "display_name": "France Central"}],
        "skus": {
            "FranceCentral": [{
                "name": "Standard_D4s_v5",
                "family": "standardDSv5Family",
                "zones": ["1", "2", "3"],
                "capabilities": {"vcpus": 4, "memory_gb": 16.0}
            }]
        },
        "usages": {"francecentral": [{"family": "standardDSv5Family", "limit": 100, "used": 10}]},
        "prices": {"francecentral": [{"sku": "Standard_D4s_v5", "paygo": 0.2, "spot": 0.05, "currency": "USD"}]},
        "spot_scores": {"francecentral": {"Standard_D4s_v5": {"1": "High", "2": "Low"}}}
    }"#;

    #[tokio::test]
    async fn test_catalog_lookups_are_case_insensitive() {
        let catalog = StaticCatalog::from_json(CATALOG).unwrap();

        let regions = catalog.list_regions("sub", None).await.unwrap();
        assert_eq!(regions[0].name, "francecentral");

        let skus = catalog
            .get_skus("FRANCECENTRAL", "sub", None, super::super::VIRTUAL_MACHINES, &SkuFilter::default())
            .await
            .unwrap();
        assert_eq!(skus.len(), 1);
    }

    #[tokio::test]
    async fn test_catalog_spot_scores_report_missing() {
        let catalog = StaticCatalog::from_json(CATALOG).unwrap();
        let names = vec!["Standard_D4s_v5".to_string(), "Standard_E4s_v5".to_string()];
        let result = catalog
            .get_spot_placement_scores("francecentral", "sub", &names, 2, None)
            .await
            .unwrap();

        assert_eq!(result.best_label("Standard_D4s_v5"), SpotLabel::High);
        assert_eq!(result.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_catalog_missing_usages_is_forbidden() {
        let catalog = StaticCatalog::from_json(CATALOG).unwrap();
        let err = catalog.get_compute_usages("westeurope", "sub", None).await.unwrap_err();
        assert!(matches!(err, CloudApiError::Forbidden(_)));
    }

    #[test]
    fn test_catalog_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = StaticCatalog::from_path(file.path()).unwrap();
        assert!(catalog.skus.contains_key("francecentral"));
    }
}
