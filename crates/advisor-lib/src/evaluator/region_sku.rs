//! Per-region SKU evaluation
//!
//! One region at a time: list candidate SKUs, enrich them with quota, price
//! and spot signals, then score each SKU and attach a verdict. A failed
//! enrichment call downgrades the affected signals to missing and adds a
//! region warning; it never aborts the region.

use crate::cloud::{enrich_with_prices, enrich_with_quotas, VIRTUAL_MACHINES};
use crate::collector::SignalCollector;
use crate::models::{SignalSet, SkuRecord, SpotLabel, SpotScoreResult};
use crate::scoring::{
    admission_confidence, deployment_confidence, estimate_fragmentation, normalize,
    ConfidenceResult, FragmentationEstimate, FragmentationInput, VolatilityLabel,
};
use crate::workload::{DerivedRequirements, WorkloadProfile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Default cap on SKUs evaluated per region
pub const DEFAULT_MAX_CANDIDATE_SKUS: usize = 30;

/// Hours used to turn an hourly price into a monthly estimate
pub const HOURS_PER_MONTH: f64 = 730.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaStatus {
    Ok,
    Low,
    Blocking,
    Unknown,
}

impl QuotaStatus {
    /// Classify remaining vCPUs against the total vCPU demand
    pub fn classify(remaining: Option<u64>, demand_vcpus: u64) -> Self {
        match remaining {
            None => QuotaStatus::Unknown,
            Some(r) if r < demand_vcpus => QuotaStatus::Blocking,
            Some(r) if r < demand_vcpus.saturating_mul(2) => QuotaStatus::Low,
            Some(_) => QuotaStatus::Ok,
        }
    }
}

impl fmt::Display for QuotaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuotaStatus::Ok => "ok",
            QuotaStatus::Low => "low",
            QuotaStatus::Blocking => "blocking",
            QuotaStatus::Unknown => "unknown",
        })
    }
}

/// Why a candidate is ineligible, or a concern worth surfacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonCode {
    ZoneMissing,
    Restricted,
    QuotaBlocking,
    BudgetExceeded,
    QuotaLow,
    QuotaUnknown,
    SpotLow,
    PriceUnknown,
}

impl ReasonCode {
    /// Whether this reason alone makes a candidate ineligible
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            ReasonCode::ZoneMissing
                | ReasonCode::Restricted
                | ReasonCode::QuotaBlocking
                | ReasonCode::BudgetExceeded
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::ZoneMissing => "ZoneMissing",
            ReasonCode::Restricted => "Restricted",
            ReasonCode::QuotaBlocking => "QuotaBlocking",
            ReasonCode::BudgetExceeded => "BudgetExceeded",
            ReasonCode::QuotaLow => "QuotaLow",
            ReasonCode::QuotaUnknown => "QuotaUnknown",
            ReasonCode::SpotLow => "SpotLow",
            ReasonCode::PriceUnknown => "PriceUnknown",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub eligible: bool,
    pub reason_codes: Vec<ReasonCode>,
}

impl Verdict {
    pub fn from_reasons(reason_codes: Vec<ReasonCode>) -> Self {
        Self {
            eligible: !reason_codes.iter().any(ReasonCode::is_blocking),
            reason_codes,
        }
    }

    /// Ineligible only because quota is short, so partial capacity may still be placed
    pub fn is_quota_limited(&self) -> bool {
        !self.eligible
            && self
                .reason_codes
                .iter()
                .filter(|r| r.is_blocking())
                .all(|r| *r == ReasonCode::QuotaBlocking)
    }
}

/// One candidate placement: a SKU in a region with its signals and verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSkuEvaluation {
    pub region: String,
    pub sku: String,
    pub family: String,
    pub vcpus: u32,
    pub memory_gb: f64,
    pub zones: Vec<String>,
    pub restriction_codes: Vec<String>,
    pub quota_status: QuotaStatus,
    pub quota_remaining: Option<u64>,
    pub spot_label: SpotLabel,
    pub paygo_price: Option<f64>,
    pub spot_price: Option<f64>,
    pub currency: String,
    pub estimated_monthly_cost: Option<f64>,
    pub volatility: Option<VolatilityLabel>,
    pub confidence: ConfidenceResult,
    pub admission: ConfidenceResult,
    pub fragmentation: FragmentationEstimate,
    pub verdict: Verdict,
}

impl RegionSkuEvaluation {
    pub fn zone_count(&self) -> u32 {
        self.zones.len() as u32
    }

    /// Instances the remaining quota can hold; `None` when quota is unknown
    pub fn max_instances(&self) -> Option<u32> {
        self.quota_remaining
            .map(|r| (r / self.vcpus.max(1) as u64).min(u32::MAX as u64) as u32)
    }

    /// Instances placeable out of `requested`; unknown quota is unbounded
    pub fn capacity_for(&self, requested: u32) -> u32 {
        self.max_instances().map_or(requested, |max| max.min(requested))
    }
}

/// Evaluation-time view of a request
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub profile: WorkloadProfile,
    pub requirements: DerivedRequirements,
    pub max_candidate_skus: usize,
}

impl EvaluationContext {
    pub fn new(profile: WorkloadProfile) -> Self {
        let requirements = profile.requirements();
        Self {
            profile,
            requirements,
            max_candidate_skus: DEFAULT_MAX_CANDIDATE_SKUS,
        }
    }

    pub fn with_requirements(mut self, requirements: DerivedRequirements) -> Self {
        self.requirements = requirements;
        self
    }
}

/// Every SKU evaluated in one region plus the region's degradations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionEvaluation {
    pub region: String,
    pub evaluations: Vec<RegionSkuEvaluation>,
    pub warnings: Vec<String>,
}

impl RegionEvaluation {
    /// Best candidate: highest deployment confidence among eligible SKUs,
    /// falling back to quota-limited ones. Ties keep listing order.
    pub fn best(&self) -> Option<&RegionSkuEvaluation> {
        self.best_by(|e| e.verdict.eligible)
            .or_else(|| self.best_by(|e| e.verdict.is_quota_limited()))
    }

    fn best_by(&self, keep: impl Fn(&RegionSkuEvaluation) -> bool) -> Option<&RegionSkuEvaluation> {
        self.evaluations
            .iter()
            .filter(|e| keep(e))
            .fold(None, |best: Option<&RegionSkuEvaluation>, e| match best {
                Some(b) if b.confidence.score >= e.confidence.score => Some(b),
                _ => Some(e),
            })
    }
}

/// Evaluates candidate SKUs in one region through the collector's gate
#[derive(Clone)]
pub struct RegionEvaluator {
    collector: Arc<SignalCollector>,
}

impl RegionEvaluator {
    pub fn new(collector: Arc<SignalCollector>) -> Self {
        Self { collector }
    }

    pub async fn evaluate(&self, ctx: &EvaluationContext, region: &str) -> RegionEvaluation {
        let profile = &ctx.profile;
        let tenant = profile.tenant.as_deref();
        let api = self.collector.api();
        let gate = self.collector.gate();
        let filter = profile.sku_filter();
        let mut warnings = Vec::new();

        let mut skus: Vec<SkuRecord> = match gate
            .call("get_skus", || {
                api.get_skus(region, &profile.subscription, tenant, VIRTUAL_MACHINES, &filter)
            })
            .await
        {
            Ok(skus) => skus,
            Err(e) => {
                warnings.push(format!("{}: SKU listing failed ({})", region, e));
                return RegionEvaluation {
                    region: region.to_string(),
                    evaluations: Vec::new(),
                    warnings,
                };
            }
        };

        if skus.is_empty() {
            warnings.push(format!("{}: no SKUs match the requested shape", region));
        }
        if skus.len() > ctx.max_candidate_skus {
            debug!(region = %region, total = skus.len(), cap = ctx.max_candidate_skus, "Capping candidate SKUs");
            skus.truncate(ctx.max_candidate_skus);
        }
        let names: Vec<String> = skus.iter().map(|s| s.name.clone()).collect();

        if ctx.requirements.requires_quota_check && !skus.is_empty() {
            match gate
                .call("get_compute_usages", || {
                    api.get_compute_usages(region, &profile.subscription, tenant)
                })
                .await
            {
                Ok(usages) => enrich_with_quotas(&mut skus, &usages),
                Err(e) => warnings.push(format!("{}: quota unavailable ({})", region, e)),
            }
        }

        if ctx.requirements.requires_price_check && !skus.is_empty() {
            match gate
                .call("get_retail_prices", || {
                    api.get_retail_prices(region, &names, &profile.currency)
                })
                .await
            {
                Ok(prices) => enrich_with_prices(&mut skus, &prices, &profile.currency),
                Err(e) => warnings.push(format!("{}: pricing unavailable ({})", region, e)),
            }
        }

        let spot_scores = if ctx.requirements.requires_spot_score && !skus.is_empty() {
            match gate
                .call("get_spot_placement_scores", || {
                    api.get_spot_placement_scores(
                        region,
                        &profile.subscription,
                        &names,
                        profile.instance_count,
                        tenant,
                    )
                })
                .await
            {
                Ok(result) => {
                    if !result.errors.is_empty() {
                        warnings.push(format!(
                            "{}: spot placement scores incomplete ({} SKUs)",
                            region,
                            result.errors.len()
                        ));
                    }
                    result
                }
                Err(e) => {
                    warnings.push(format!("{}: spot placement scores unavailable ({})", region, e));
                    SpotScoreResult::default()
                }
            }
        } else {
            SpotScoreResult::default()
        };

        let mut evaluations = Vec::with_capacity(skus.len());
        for sku in &skus {
            let volatility = if self.collector.has_snapshot_store() {
                self.collector
                    .volatility_for(region, &sku.name)
                    .await
                    .map(|report| report.label)
            } else {
                None
            };
            let spot_label = spot_scores.best_label(&sku.name);
            evaluations.push(evaluate_sku(ctx, region, sku, spot_label, volatility));
        }

        RegionEvaluation {
            region: region.to_string(),
            evaluations,
            warnings,
        }
    }
}

/// Score and judge one enriched SKU. Pure.
pub fn evaluate_sku(
    ctx: &EvaluationContext,
    region: &str,
    sku: &SkuRecord,
    spot_label: SpotLabel,
    volatility: Option<VolatilityLabel>,
) -> RegionSkuEvaluation {
    let profile = &ctx.profile;
    let requirements = &ctx.requirements;
    let vcpus = sku.capabilities.vcpus;
    let zones = sku.usable_zones();
    let quota_remaining = sku.quota.map(|q| q.remaining);
    let demand = vcpus as u64 * profile.instance_count as u64;
    let quota_status = QuotaStatus::classify(quota_remaining, demand);

    let paygo_price = sku.pricing.as_ref().and_then(|p| p.paygo);
    let spot_price = sku.pricing.as_ref().and_then(|p| p.spot);
    let hourly = if profile.spot_preferred {
        spot_price.or(paygo_price)
    } else {
        paygo_price
    };
    let estimated_monthly_cost =
        hourly.map(|h| h * profile.instance_count as f64 * HOURS_PER_MONTH);

    let signals = SignalSet {
        vcpus: Some(vcpus),
        zones_available: Some(zones.len() as u32),
        restrictions_present: Some(sku.restrictions_present()),
        quota_remaining,
        spot_label: spot_label.is_known().then_some(spot_label),
        paygo_price,
        spot_price,
        eviction_rate: sku.eviction_rate.clone(),
        volatility,
    };

    let fragmentation = estimate_fragmentation(&FragmentationInput {
        gpu_count: sku.capabilities.gpus,
        vcpus,
        memory_gb: sku.capabilities.memory_gb,
        zonal_required: profile.zonal_required,
        rdma_required: profile.rdma_required,
        ultra_ssd_required: profile.ultra_ssd_required,
        spot_label: signals.spot_label,
        price_ratio: normalize::price_ratio(paygo_price, spot_price),
    });
    let confidence = deployment_confidence(&signals);
    let admission = admission_confidence(&signals, Some(&fragmentation));

    let mut reasons = Vec::new();
    if (zones.len() as u32) < requirements.min_zones {
        reasons.push(ReasonCode::ZoneMissing);
    }
    if sku.restrictions_present() {
        reasons.push(ReasonCode::Restricted);
    }
    match quota_status {
        QuotaStatus::Blocking => reasons.push(ReasonCode::QuotaBlocking),
        QuotaStatus::Low => reasons.push(ReasonCode::QuotaLow),
        QuotaStatus::Unknown if requirements.requires_quota_check => {
            reasons.push(ReasonCode::QuotaUnknown)
        }
        _ => {}
    }
    if let (Some(budget), Some(cost)) = (profile.monthly_budget, estimated_monthly_cost) {
        if cost > budget {
            reasons.push(ReasonCode::BudgetExceeded);
        }
    }
    if spot_label == SpotLabel::Low {
        reasons.push(ReasonCode::SpotLow);
    }
    if requirements.requires_price_check && estimated_monthly_cost.is_none() {
        reasons.push(ReasonCode::PriceUnknown);
    }

    RegionSkuEvaluation {
        region: region.to_string(),
        sku: sku.name.clone(),
        family: sku.family.clone(),
        vcpus,
        memory_gb: sku.capabilities.memory_gb,
        zones,
        restriction_codes: sku.restriction_codes(),
        quota_status,
        quota_remaining,
        spot_label,
        paygo_price,
        spot_price,
        currency: sku
            .pricing
            .as_ref()
            .map(|p| p.currency.clone())
            .unwrap_or_else(|| profile.currency.clone()),
        estimated_monthly_cost,
        volatility,
        confidence,
        admission,
        fragmentation,
        verdict: Verdict::from_reasons(reasons),
    }
}
