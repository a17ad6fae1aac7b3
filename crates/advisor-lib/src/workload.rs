//! Placement requests
//!
//! Two request shapes reach the planners: a flat [`WorkloadProfile`] for
//! multi-region capacity strategy, and a sectioned [`DeploymentIntent`] for a
//! single ranked recommendation. Both reduce to the same
//! [`DerivedRequirements`].

use crate::models::SkuFilter;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Statefulness {
    #[default]
    Stateless,
    SoftState,
    Stateful,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LatencySensitivity {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CrossRegionTraffic {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PricingPreference {
    /// On-demand only; spot signals are not fetched
    PaygoOnly,
    #[default]
    Balanced,
    SpotPreferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Immediate,
    #[default]
    Normal,
    /// Deployment can wait for capacity
    Flexible,
}

macro_rules! display_via_serde_names {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self { $(Self::$variant => $name),+ })
            }
        }
    };
}

display_via_serde_names!(Statefulness { Stateless => "stateless", SoftState => "soft-state", Stateful => "stateful" });
display_via_serde_names!(LatencySensitivity { Low => "low", Medium => "medium", High => "high" });
display_via_serde_names!(CrossRegionTraffic { Low => "low", Medium => "medium", High => "high" });
display_via_serde_names!(PricingPreference { PaygoOnly => "paygo-only", Balanced => "balanced", SpotPreferred => "spot-preferred" });
display_via_serde_names!(Urgency { Immediate => "immediate", Normal => "normal", Flexible => "flexible" });

fn default_instance_count() -> u32 {
    1
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Capacity-strategy request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadProfile {
    pub subscription: String,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub sku_family: Option<String>,
    #[serde(default)]
    pub require_gpu: bool,
    #[serde(default)]
    pub vcpus_per_instance: Option<u32>,
    #[serde(default)]
    pub memory_gb_per_instance: Option<f64>,
    #[serde(default = "default_instance_count")]
    pub instance_count: u32,
    #[serde(default)]
    pub allow_regions: Vec<String>,
    #[serde(default)]
    pub deny_regions: Vec<String>,
    #[serde(default)]
    pub data_residency: Option<String>,
    #[serde(default)]
    pub max_regions: Option<usize>,
    #[serde(default)]
    pub statefulness: Statefulness,
    #[serde(default)]
    pub latency_sensitivity: LatencySensitivity,
    #[serde(default)]
    pub max_rtt_ms: Option<u32>,
    #[serde(default)]
    pub cross_region_traffic: CrossRegionTraffic,
    #[serde(default)]
    pub spot_preferred: bool,
    #[serde(default)]
    pub zonal_required: bool,
    #[serde(default)]
    pub rdma_required: bool,
    #[serde(default)]
    pub ultra_ssd_required: bool,
    #[serde(default)]
    pub monthly_budget: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub urgency: Urgency,
}

impl WorkloadProfile {
    pub fn new(subscription: impl Into<String>, instance_count: u32) -> Self {
        Self {
            subscription: subscription.into(),
            tenant: None,
            sku: None,
            sku_family: None,
            require_gpu: false,
            vcpus_per_instance: None,
            memory_gb_per_instance: None,
            instance_count,
            allow_regions: Vec::new(),
            deny_regions: Vec::new(),
            data_residency: None,
            max_regions: None,
            statefulness: Statefulness::default(),
            latency_sensitivity: LatencySensitivity::default(),
            max_rtt_ms: None,
            cross_region_traffic: CrossRegionTraffic::default(),
            spot_preferred: false,
            zonal_required: false,
            rdma_required: false,
            ultra_ssd_required: false,
            monthly_budget: None,
            currency: default_currency(),
            urgency: Urgency::default(),
        }
    }

    pub fn pricing_preference(&self) -> PricingPreference {
        if self.spot_preferred {
            PricingPreference::SpotPreferred
        } else {
            PricingPreference::Balanced
        }
    }

    pub fn requirements(&self) -> DerivedRequirements {
        DerivedRequirements::derive(
            self.zonal_required,
            self.pricing_preference(),
            self.urgency,
            self.monthly_budget.is_some(),
        )
    }

    /// SKU listing filter implied by the profile
    pub fn sku_filter(&self) -> SkuFilter {
        SkuFilter {
            names: self.sku.iter().cloned().collect(),
            family: self.sku_family.clone(),
            require_gpu: self.require_gpu,
            min_vcpus: self.vcpus_per_instance,
            min_memory_gb: self.memory_gb_per_instance,
        }
    }

    /// Inputs that were not supplied but would sharpen the plan
    pub fn missing_inputs(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.sku.is_none() && self.sku_family.is_none() && self.vcpus_per_instance.is_none() {
            missing.push("sku".to_string());
        }
        if self.monthly_budget.is_none() {
            missing.push("monthlyBudget".to_string());
        }
        if self.latency_sensitivity == LatencySensitivity::High && self.max_rtt_ms.is_none() {
            missing.push("maxRttMs".to_string());
        }
        if self.allow_regions.is_empty() && self.data_residency.is_none() {
            missing.push("dataResidency".to_string());
        }
        missing
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSpec {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub sku_family: Option<String>,
    #[serde(default = "default_instance_count")]
    pub instance_count: u32,
    #[serde(default)]
    pub vcpus_per_instance: Option<u32>,
    #[serde(default)]
    pub memory_gb_per_instance: Option<f64>,
    #[serde(default)]
    pub require_gpu: bool,
}

impl Default for ScaleSpec {
    fn default() -> Self {
        Self {
            sku: None,
            sku_family: None,
            instance_count: 1,
            vcpus_per_instance: None,
            memory_gb_per_instance: None,
            require_gpu: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintSpec {
    #[serde(default)]
    pub allow_regions: Vec<String>,
    #[serde(default)]
    pub deny_regions: Vec<String>,
    #[serde(default)]
    pub data_residency: Option<String>,
    #[serde(default)]
    pub max_regions: Option<usize>,
    #[serde(default)]
    pub zone_redundancy: bool,
    #[serde(default)]
    pub rdma_required: bool,
    #[serde(default)]
    pub ultra_ssd_required: bool,
    #[serde(default)]
    pub max_rtt_ms: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSpec {
    #[serde(default)]
    pub statefulness: Statefulness,
    #[serde(default)]
    pub latency_sensitivity: LatencySensitivity,
    #[serde(default)]
    pub cross_region_traffic: CrossRegionTraffic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSpec {
    #[serde(default)]
    pub preference: PricingPreference,
    #[serde(default)]
    pub monthly_budget: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for PricingSpec {
    fn default() -> Self {
        Self {
            preference: PricingPreference::default(),
            monthly_budget: None,
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingSpec {
    #[serde(default)]
    pub urgency: Urgency,
}

/// Single-recommendation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentIntent {
    pub subscription: String,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub scale: ScaleSpec,
    #[serde(default)]
    pub constraints: ConstraintSpec,
    #[serde(default)]
    pub usage: UsageSpec,
    #[serde(default)]
    pub pricing: PricingSpec,
    #[serde(default)]
    pub timing: TimingSpec,
}

impl DeploymentIntent {
    pub fn new(subscription: impl Into<String>) -> Self {
        Self {
            subscription: subscription.into(),
            tenant: None,
            scale: ScaleSpec::default(),
            constraints: ConstraintSpec::default(),
            usage: UsageSpec::default(),
            pricing: PricingSpec::default(),
            timing: TimingSpec::default(),
        }
    }

    pub fn requirements(&self) -> DerivedRequirements {
        DerivedRequirements::derive(
            self.constraints.zone_redundancy,
            self.pricing.preference,
            self.timing.urgency,
            self.pricing.monthly_budget.is_some(),
        )
    }

    /// Flatten into the profile shape the evaluation pipeline consumes
    pub fn to_profile(&self) -> WorkloadProfile {
        WorkloadProfile {
            subscription: self.subscription.clone(),
            tenant: self.tenant.clone(),
            sku: self.scale.sku.clone(),
            sku_family: self.scale.sku_family.clone(),
            require_gpu: self.scale.require_gpu,
            vcpus_per_instance: self.scale.vcpus_per_instance,
            memory_gb_per_instance: self.scale.memory_gb_per_instance,
            instance_count: self.scale.instance_count,
            allow_regions: self.constraints.allow_regions.clone(),
            deny_regions: self.constraints.deny_regions.clone(),
            data_residency: self.constraints.data_residency.clone(),
            max_regions: self.constraints.max_regions,
            statefulness: self.usage.statefulness,
            latency_sensitivity: self.usage.latency_sensitivity,
            max_rtt_ms: self.constraints.max_rtt_ms,
            cross_region_traffic: self.usage.cross_region_traffic,
            spot_preferred: self.pricing.preference == PricingPreference::SpotPreferred,
            zonal_required: self.constraints.zone_redundancy,
            rdma_required: self.constraints.rdma_required,
            ultra_ssd_required: self.constraints.ultra_ssd_required,
            monthly_budget: self.pricing.monthly_budget,
            currency: self.pricing.currency.clone(),
            urgency: self.timing.urgency,
        }
    }
}

/// Requirements mechanically derived from a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRequirements {
    pub min_zones: u32,
    pub requires_spot_score: bool,
    pub requires_quota_check: bool,
    pub requires_price_check: bool,
}

impl DerivedRequirements {
    pub fn derive(
        zone_redundant: bool,
        pricing: PricingPreference,
        urgency: Urgency,
        has_budget: bool,
    ) -> Self {
        let spot_preferred = pricing == PricingPreference::SpotPreferred;
        Self {
            min_zones: if zone_redundant { 3 } else { 1 },
            requires_spot_score: pricing != PricingPreference::PaygoOnly,
            // spot capacity that can wait is not bound by on-demand quota
            requires_quota_check: !(spot_preferred && urgency == Urgency::Flexible),
            requires_price_check: has_budget || spot_preferred,
        }
    }
}
