//! Single ranked deployment recommendation

use super::business::{deployment_view, BusinessView};
use super::{
    missing_signals, rank_by_confidence, PlanEngine, PlannerConfig, RegionSweep, TechnicalView,
    DISCLAIMER,
};
use crate::collector::SignalCollector;
use crate::evaluator::RegionSkuEvaluation;
use crate::workload::DeploymentIntent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Alternatives returned next to the recommendation
pub const DEFAULT_MAX_ALTERNATIVES: usize = 4;

/// A ranked candidate; rank 1 is the recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub rank: usize,
    pub instance_count: u32,
    #[serde(flatten)]
    pub evaluation: RegionSkuEvaluation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPlanResponse {
    pub summary: String,
    pub recommendation: Option<Recommendation>,
    pub alternatives: Vec<Recommendation>,
    pub business_view: BusinessView,
    pub technical_view: TechnicalView,
    pub missing_inputs: Vec<String>,
    pub missing_signals: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub disclaimer: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct DeploymentAdvisor {
    engine: PlanEngine,
}

impl DeploymentAdvisor {
    pub fn new(collector: Arc<SignalCollector>) -> Self {
        Self::with_config(collector, PlannerConfig::default())
    }

    pub fn with_config(collector: Arc<SignalCollector>, config: PlannerConfig) -> Self {
        Self {
            engine: PlanEngine::new(collector, config),
        }
    }

    pub async fn recommend(&self, intent: DeploymentIntent) -> DeploymentPlanResponse {
        let started = Instant::now();
        // the intent carries the pricing preference the flat profile cannot express
        let requirements = intent.requirements();
        let profile = intent.to_profile();
        let instance_count = profile.instance_count;
        let missing_inputs = profile.missing_inputs();

        let resolved = self.engine.resolve(&profile).await;
        let mut warnings = resolved.warnings.clone();
        let mut errors = resolved.errors.clone();

        let sweep = if resolved.is_empty() {
            RegionSweep::default()
        } else {
            let ctx = self.engine.context(profile, requirements);
            self.engine.sweep(ctx, &resolved.regions).await
        };
        warnings.extend(sweep.warnings.iter().cloned());

        let eligible: Vec<RegionSkuEvaluation> = sweep
            .all_evaluations()
            .filter(|e| e.verdict.eligible)
            .cloned()
            .collect();
        let ranked = rank_by_confidence(eligible);
        let rejected: Vec<&RegionSkuEvaluation> = sweep
            .all_evaluations()
            .filter(|e| !e.verdict.eligible)
            .collect();

        let shortlist = &ranked[..ranked.len().min(1 + self.engine.config().max_alternatives)];
        let mut picks = shortlist
            .iter()
            .enumerate()
            .map(|(i, evaluation)| Recommendation {
                rank: i + 1,
                instance_count,
                evaluation: evaluation.clone(),
            });
        let recommendation = picks.next();
        let alternatives: Vec<Recommendation> = picks.collect();

        let missing = missing_signals(sweep.all_evaluations());
        let business_view = if resolved.is_empty() {
            BusinessView::no_recommendation("no candidate regions were resolved")
        } else {
            deployment_view(shortlist.first(), &rejected, instance_count, &missing)
        };

        if recommendation.is_none() && !resolved.is_empty() {
            errors.push(format!(
                "No eligible SKU found in {} evaluated regions ({} SKUs rejected)",
                resolved.regions.len(),
                rejected.len()
            ));
        }

        self.engine
            .metrics
            .observe_plan_latency(started.elapsed().as_secs_f64());
        match &recommendation {
            Some(_) => {
                self.engine.metrics.inc_plan_generated("ranked_recommendation");
                self.engine.logger.log_plan(
                    "deployment",
                    "ranked_recommendation",
                    sweep.regions.len(),
                    instance_count,
                    instance_count,
                    warnings.len(),
                    errors.len(),
                );
            }
            None => {
                let reason = errors.first().cloned().unwrap_or_else(|| "no eligible SKU".to_string());
                self.engine.logger.log_no_recommendation("deployment", &reason);
            }
        }

        DeploymentPlanResponse {
            summary: business_view.summary.clone(),
            recommendation,
            alternatives,
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
