//! Multi-region capacity strategy planning

use super::business::{capacity_view, BusinessView};
use super::{missing_signals, PlanEngine, PlannerConfig, RegionSweep, TechnicalView, DISCLAIMER};
use crate::collector::SignalCollector;
use crate::strategy::{
    build_allocations, select_strategy, RegionAllocation, StrategyInput, StrategyType,
};
use crate::workload::WorkloadProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityStrategyResponse {
    pub summary: String,
    pub strategy: StrategyType,
    pub rationale: String,
    pub allocations: Vec<RegionAllocation>,
    pub instances_requested: u32,
    pub instances_placed: u32,
    pub instances_unplaced: u32,
    pub business_view: BusinessView,
    pub technical_view: TechnicalView,
    pub missing_inputs: Vec<String>,
    pub missing_signals: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub disclaimer: String,
    pub generated_at: DateTime<Utc>,
}

impl CapacityStrategyResponse {
    pub fn has_recommendation(&self) -> bool {
        !self.allocations.is_empty()
    }
}

#[derive(Clone)]
pub struct CapacityPlanner {
    engine: PlanEngine,
}

impl CapacityPlanner {
    pub fn new(collector: Arc<SignalCollector>) -> Self {
        Self::with_config(collector, PlannerConfig::default())
    }

    pub fn with_config(collector: Arc<SignalCollector>, config: PlannerConfig) -> Self {
        Self {
            engine: PlanEngine::new(collector, config),
        }
    }

    pub async fn plan(&self, profile: WorkloadProfile) -> CapacityStrategyResponse {
        let started = Instant::now();
        let requested = profile.instance_count;
        let requirements = profile.requirements();
        let missing_inputs = profile.missing_inputs();

        let resolved = self.engine.resolve(&profile).await;
        let mut warnings = resolved.warnings.clone();
        let mut errors = resolved.errors.clone();

        let statefulness = profile.statefulness;
        let latency_sensitivity = profile.latency_sensitivity;
        let max_rtt_ms = profile.max_rtt_ms;
        let cross_region_traffic = profile.cross_region_traffic;
        let spot_preferred = profile.spot_preferred;

        let sweep = if resolved.is_empty() {
            RegionSweep::default()
        } else {
            let ctx = self.engine.context(profile, requirements);
            self.engine.sweep(ctx, &resolved.regions).await
        };
        warnings.extend(sweep.warnings.iter().cloned());

        let ranked = sweep.ranked_best();
        let decision = select_strategy(&StrategyInput {
            ranked: &ranked,
            instance_count: requested,
            statefulness,
            latency_sensitivity,
            max_rtt_ms,
            cross_region_traffic,
            spot_preferred,
        });
        warnings.extend(decision.warnings.iter().cloned());

        let plan = build_allocations(decision.strategy, &ranked, requested);
        warnings.extend(plan.warnings.iter().cloned());

        let missing = missing_signals(sweep.all_evaluations());
        let business_view = if resolved.is_empty() {
            BusinessView::no_recommendation("no candidate regions were resolved")
        } else {
            capacity_view(decision.strategy, &ranked, &plan, requested, &missing)
        };

        if ranked.is_empty() && !resolved.is_empty() {
            errors.push(format!(
                "No eligible SKU found in {} evaluated regions",
                resolved.regions.len()
            ));
        }

        let elapsed = started.elapsed().as_secs_f64();
        self.engine.metrics.observe_plan_latency(elapsed);
        if plan.allocations.is_empty() {
            let reason = errors.first().cloned().unwrap_or_else(|| "no allocation".to_string());
            self.engine.logger.log_no_recommendation("capacity", &reason);
        } else {
            self.engine.metrics.inc_plan_generated(decision.strategy.as_str());
            self.engine.logger.log_plan(
                "capacity",
                decision.strategy.as_str(),
                sweep.regions.len(),
                plan.placed,
                requested,
                warnings.len(),
                errors.len(),
            );
        }

        CapacityStrategyResponse {
            summary: business_view.summary.clone(),
            strategy: decision.strategy,
            rationale: decision.rationale,
            allocations: plan.allocations,
            instances_requested: requested,
            instances_placed: plan.placed,
            instances_unplaced: plan.unplaced,
            business_view,
            technical_view: TechnicalView {
                region_source: resolved.source,
                candidate_regions: resolved.regions,
                requirements,
                evaluated_skus: sweep.evaluated_skus(),
                evaluations: ranked,
            },
            missing_inputs,
            missing_signals: missing.iter().map(|s| s.as_str().to_string()).collect(),
            warnings,
            errors,
            disclaimer: DISCLAIMER.to_string(),
            generated_at: Utc::now(),
        }
    }
}
