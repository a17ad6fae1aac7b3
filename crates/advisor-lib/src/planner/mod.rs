//! Planners
//!
//! Two entry points share one pipeline:
//! - [`CapacityPlanner`]: workload profile to multi-region strategy and allocations
//! - [`DeploymentAdvisor`]: deployment intent to one ranked recommendation plus alternatives
//!
//! Pipeline: resolve candidate regions, evaluate every region concurrently,
//! rank, then decide. A failure in one region never aborts the others.

mod business;
mod capacity;
mod deployment;

pub use business::{capacity_view, deployment_view, BusinessView};
pub use capacity::{CapacityPlanner, CapacityStrategyResponse};
pub use deployment::{DeploymentAdvisor, DeploymentPlanResponse, Recommendation, DEFAULT_MAX_ALTERNATIVES};

use crate::collector::SignalCollector;
use crate::error::AdvisorError;
use crate::evaluator::{
    CandidateRegionResolver, EvaluationContext, RegionEvaluation, RegionEvaluator, RegionQuery,
    RegionSkuEvaluation, RegionSource, ResolvedRegions, DEFAULT_MAX_CANDIDATE_SKUS,
    DEFAULT_MAX_REGIONS,
};
use crate::observability::{AdvisorMetrics, StructuredLogger};
use crate::scoring::SignalName;
use crate::workload::{DerivedRequirements, WorkloadProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Attached to every response
pub const DISCLAIMER: &str = "Heuristic estimate from observable signals at planning time. \
It is not a guarantee of capacity, placement success or price.";

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Region cap when the request does not set one
    pub max_regions: usize,
    pub max_candidate_skus: usize,
    pub max_alternatives: usize,
    /// Instance name used in structured log events
    pub instance: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_regions: DEFAULT_MAX_REGIONS,
            max_candidate_skus: DEFAULT_MAX_CANDIDATE_SKUS,
            max_alternatives: DEFAULT_MAX_ALTERNATIVES,
            instance: "placement-advisor".to_string(),
        }
    }
}

/// Evaluation data behind a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalView {
    pub region_source: RegionSource,
    pub candidate_regions: Vec<String>,
    pub requirements: DerivedRequirements,
    /// Total SKU evaluations across all regions
    pub evaluated_skus: usize,
    pub evaluations: Vec<RegionSkuEvaluation>,
}

/// Result of evaluating every candidate region
#[derive(Debug, Clone, Default)]
pub(crate) struct RegionSweep {
    /// Per-region results in candidate order
    pub regions: Vec<RegionEvaluation>,
    pub warnings: Vec<String>,
}

impl RegionSweep {
    /// Best candidate per region, ranked by deployment confidence; ties keep candidate order
    pub fn ranked_best(&self) -> Vec<RegionSkuEvaluation> {
        let best = self.regions.iter().filter_map(|r| r.best().cloned()).collect();
        rank_by_confidence(best)
    }

    pub fn evaluated_skus(&self) -> usize {
        self.regions.iter().map(|r| r.evaluations.len()).sum()
    }

    pub fn all_evaluations(&self) -> impl Iterator<Item = &RegionSkuEvaluation> {
        self.regions.iter().flat_map(|r| r.evaluations.iter())
    }
}

/// Stable sort by confidence score, highest first
pub(crate) fn rank_by_confidence(mut evaluations: Vec<RegionSkuEvaluation>) -> Vec<RegionSkuEvaluation> {
    evaluations.sort_by(|a, b| b.confidence.score.cmp(&a.confidence.score));
    evaluations
}

/// Union of missing signals across evaluations, in first-seen order
pub(crate) fn missing_signals<'a>(
    evaluations: impl IntoIterator<Item = &'a RegionSkuEvaluation>,
) -> Vec<SignalName> {
    let mut missing = Vec::new();
    for eval in evaluations {
        for name in &eval.confidence.missing {
            if !missing.contains(name) {
                missing.push(*name);
            }
        }
    }
    missing
}

/// Shared resolve-and-evaluate pipeline
#[derive(Clone)]
pub(crate) struct PlanEngine {
    collector: Arc<SignalCollector>,
    evaluator: RegionEvaluator,
    config: PlannerConfig,
    pub metrics: AdvisorMetrics,
    pub logger: StructuredLogger,
}

impl PlanEngine {
    pub fn new(collector: Arc<SignalCollector>, config: PlannerConfig) -> Self {
        Self {
            evaluator: RegionEvaluator::new(Arc::clone(&collector)),
            logger: StructuredLogger::new(config.instance.clone()),
            collector,
            config,
            metrics: AdvisorMetrics::new(),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub async fn resolve(&self, profile: &WorkloadProfile) -> ResolvedRegions {
        let resolver = CandidateRegionResolver::new(
            Arc::clone(self.collector.api()),
            self.collector.gate().clone(),
        )
        .with_default_max(self.config.max_regions);

        let mut resolved = resolver
            .resolve(&RegionQuery {
                subscription: &profile.subscription,
                tenant: profile.tenant.as_deref(),
                allow: &profile.allow_regions,
                deny: &profile.deny_regions,
                data_residency: profile.data_residency.as_deref(),
                max_regions: profile.max_regions,
            })
            .await;

        if resolved.is_empty() {
            let reason = match resolved.source {
                RegionSource::AllowList => "every allowed region is denied",
                RegionSource::DataResidency => "the data-residency constraint maps to no usable region",
                RegionSource::Discovery => "region discovery returned no usable region",
            };
            resolved
                .errors
                .push(AdvisorError::NoCandidateRegions(reason.to_string()).to_string());
        }
        resolved
    }

    pub fn context(&self, profile: WorkloadProfile, requirements: DerivedRequirements) -> EvaluationContext {
        let mut ctx = EvaluationContext::new(profile).with_requirements(requirements);
        ctx.max_candidate_skus = self.config.max_candidate_skus;
        ctx
    }

    /// Evaluate all regions concurrently; results keep candidate order
    pub async fn sweep(&self, ctx: EvaluationContext, regions: &[String]) -> RegionSweep {
        let ctx = Arc::new(ctx);
        let mut tasks = JoinSet::new();
        for (index, region) in regions.iter().cloned().enumerate() {
            let evaluator = self.evaluator.clone();
            let ctx = Arc::clone(&ctx);
            tasks.spawn(async move { (index, evaluator.evaluate(&ctx, &region).await) });
        }

        let mut slots: Vec<Option<RegionEvaluation>> = regions.iter().map(|_| None).collect();
        let mut warnings = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, evaluation)) => slots[index] = Some(evaluation),
                Err(e) => {
                    self.metrics.inc_region_evaluation_error();
                    warn!(error = %e, "Region evaluation task failed");
                    warnings.push(format!("region evaluation task failed: {}", e));
                }
            }
        }

        let regions: Vec<RegionEvaluation> = slots.into_iter().flatten().collect();
        for region in &regions {
            if region.evaluations.is_empty() && !region.warnings.is_empty() {
                self.metrics.inc_region_evaluation_error();
            }
            warnings.extend(region.warnings.iter().cloned());
        }
        debug!(
            regions = regions.len(),
            warnings = warnings.len(),
            "Region sweep complete"
        );

        RegionSweep { regions, warnings }
    }
}

#[cfg(test)]
mod tests;
