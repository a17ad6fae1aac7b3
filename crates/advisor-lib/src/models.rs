//! Core data models shared by the collector, evaluator and planners

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Qualitative spot placement score reported by the cloud provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SpotLabel {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl SpotLabel {
    /// Parse a provider label, case-insensitively. Anything unrecognised is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => SpotLabel::High,
            "medium" => SpotLabel::Medium,
            "low" => SpotLabel::Low,
            _ => SpotLabel::Unknown,
        }
    }

    /// Optimism rank used to pick the best label across zones (higher is better)
    pub fn rank(&self) -> u8 {
        match self {
            SpotLabel::High => 3,
            SpotLabel::Medium => 2,
            SpotLabel::Low => 1,
            SpotLabel::Unknown => 0,
        }
    }

    pub fn is_known(&self) -> bool {
        *self != SpotLabel::Unknown
    }

    /// Most optimistic label of a set; `Unknown` when empty
    pub fn best<'a>(labels: impl IntoIterator<Item = &'a SpotLabel>) -> SpotLabel {
        labels
            .into_iter()
            .copied()
            .max_by_key(|l| l.rank())
            .unwrap_or(SpotLabel::Unknown)
    }
}

impl fmt::Display for SpotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpotLabel::High => "High",
            SpotLabel::Medium => "Medium",
            SpotLabel::Low => "Low",
            SpotLabel::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// An availability-zone-enabled region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub name: String,
    pub display_name: String,
}

/// Restriction scope reported for a SKU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionKind {
    Location,
    Zone,
}

/// A deployment restriction on a SKU
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuRestriction {
    pub kind: RestrictionKind,
    pub reason_code: String,
    #[serde(default)]
    pub zones: Vec<String>,
}

/// Hardware capabilities of a SKU
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkuCapabilities {
    pub vcpus: u32,
    pub memory_gb: f64,
    #[serde(default)]
    pub gpus: u32,
    #[serde(default)]
    pub rdma: bool,
    #[serde(default)]
    pub ultra_ssd: bool,
}

/// Quota for the SKU's family, in vCPUs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaInfo {
    pub limit: u64,
    pub used: u64,
    pub remaining: u64,
}

impl QuotaInfo {
    pub fn new(limit: u64, used: u64) -> Self {
        Self {
            limit,
            used,
            remaining: limit.saturating_sub(used),
        }
    }
}

/// Hourly price pair for a SKU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    pub paygo: Option<f64>,
    pub spot: Option<f64>,
    pub currency: String,
}

/// A VM size offered in a region, optionally enriched with quota and price data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuRecord {
    pub name: String,
    pub family: String,
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default)]
    pub restrictions: Vec<SkuRestriction>,
    pub capabilities: SkuCapabilities,
    /// Spot eviction-rate band such as `"0-5"` or `"20+"`
    #[serde(default)]
    pub eviction_rate: Option<String>,
    #[serde(default)]
    pub quota: Option<QuotaInfo>,
    #[serde(default)]
    pub pricing: Option<PriceInfo>,
}

impl SkuRecord {
    /// Zones not excluded by a zone-scoped restriction
    pub fn usable_zones(&self) -> Vec<String> {
        self.zones
            .iter()
            .filter(|z| {
                !self
                    .restrictions
                    .iter()
                    .any(|r| r.kind == RestrictionKind::Zone && r.zones.contains(z))
            })
            .cloned()
            .collect()
    }

    pub fn restrictions_present(&self) -> bool {
        !self.restrictions.is_empty()
    }

    pub fn restriction_codes(&self) -> Vec<String> {
        self.restrictions.iter().map(|r| r.reason_code.clone()).collect()
    }
}

/// Optional filters applied when listing SKUs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkuFilter {
    /// Exact SKU names (case-insensitive); empty means any
    #[serde(default)]
    pub names: Vec<String>,
    /// Family substring (case-insensitive)
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub require_gpu: bool,
    #[serde(default)]
    pub min_vcpus: Option<u32>,
    #[serde(default)]
    pub min_memory_gb: Option<f64>,
}

impl SkuFilter {
    pub fn matches(&self, sku: &SkuRecord) -> bool {
        if !self.names.is_empty() && !self.names.iter().any(|n| n.eq_ignore_ascii_case(&sku.name)) {
            return false;
        }
        if let Some(family) = &self.family {
            if !sku
                .family
                .to_ascii_lowercase()
                .contains(&family.to_ascii_lowercase())
            {
                return false;
            }
        }
        if self.require_gpu && sku.capabilities.gpus == 0 {
            return false;
        }
        if let Some(min) = self.min_vcpus {
            if sku.capabilities.vcpus < min {
                return false;
            }
        }
        if let Some(min) = self.min_memory_gb {
            if sku.capabilities.memory_gb < min {
                return false;
            }
        }
        true
    }
}

/// Per-SKU, per-zone spot placement scores for one region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotScoreResult {
    /// sku name -> zone -> label
    pub scores: BTreeMap<String, BTreeMap<String, SpotLabel>>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl SpotScoreResult {
    /// Best label across the SKU's zones
    pub fn best_label(&self, sku: &str) -> SpotLabel {
        self.scores
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(sku))
            .map(|(_, zones)| SpotLabel::best(zones.values()))
            .unwrap_or(SpotLabel::Unknown)
    }
}

/// Compute usage line item for one quota family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeUsage {
    pub family: String,
    pub limit: u64,
    pub used: u64,
}

/// Retail price line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailPrice {
    pub sku: String,
    pub paygo: Option<f64>,
    pub spot: Option<f64>,
    pub currency: String,
}

/// Raw signals for one (region, SKU). Every field is optional; absence is explicit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    pub vcpus: Option<u32>,
    pub zones_available: Option<u32>,
    pub restrictions_present: Option<bool>,
    pub quota_remaining: Option<u64>,
    pub spot_label: Option<SpotLabel>,
    pub paygo_price: Option<f64>,
    pub spot_price: Option<f64>,
    pub eviction_rate: Option<String>,
    pub volatility: Option<crate::scoring::VolatilityLabel>,
}

/// A point-in-time observation of one (region, SKU), kept for volatility analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub region: String,
    pub sku: String,
    pub collected_at: DateTime<Utc>,
    pub spot_label: SpotLabel,
    pub paygo_price: Option<f64>,
    pub spot_price: Option<f64>,
    pub zone_count: Option<u32>,
    pub restrictions_present: Option<bool>,
}
