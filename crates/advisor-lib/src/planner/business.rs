//! Business view: a short templated summary with risks and mitigations
//!
//! Every sentence comes from a fixed template filled with evaluation data.
//! Nothing here is generative, so identical plans produce identical text.

use crate::evaluator::{ReasonCode, RegionSkuEvaluation};
use crate::scoring::{ConfidenceLabel, SignalName};
use crate::strategy::{AllocationPlan, AllocationRole, StrategyType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessView {
    pub summary: String,
    pub risks: Vec<String>,
    pub mitigations: Vec<String>,
}

impl BusinessView {
    pub fn no_recommendation(reason: &str) -> Self {
        Self {
            summary: format!("No placement can be recommended: {}.", reason),
            risks: vec![reason.to_string()],
            mitigations: vec![
                "Widen the allowed regions or relax the data-residency constraint".to_string(),
                "Relax SKU, zone or budget requirements".to_string(),
            ],
        }
    }

    fn push_risk(&mut self, risk: String) {
        if !self.risks.contains(&risk) {
            self.risks.push(risk);
        }
    }

    fn push_mitigation(&mut self, mitigation: String) {
        if !self.mitigations.contains(&mitigation) {
            self.mitigations.push(mitigation);
        }
    }

    fn add_reason(&mut self, eval: &RegionSkuEvaluation, code: ReasonCode) {
        let (risk, mitigation) = match code {
            ReasonCode::ZoneMissing => (
                format!(
                    "{} offers {} in only {} zone(s)",
                    eval.region,
                    eval.sku,
                    eval.zone_count()
                ),
                "Relax the zone-redundancy requirement or pick a region with three zones".to_string(),
            ),
            ReasonCode::Restricted => (
                format!(
                    "{} is restricted for this subscription in {} ({})",
                    eval.sku,
                    eval.region,
                    eval.restriction_codes.join(", ")
                ),
                "Choose a SKU without subscription restrictions or request access".to_string(),
            ),
            ReasonCode::QuotaBlocking => (
                format!(
                    "{} quota in {} cannot hold the requested instances",
                    eval.family, eval.region
                ),
                format!(
                    "Request a quota increase for {} in {}",
                    eval.family, eval.region
                ),
            ),
            ReasonCode::QuotaLow => (
                format!("{} quota headroom in {} is tight", eval.family, eval.region),
                format!(
                    "Request a quota increase for {} in {} before scaling out",
                    eval.family, eval.region
                ),
            ),
            ReasonCode::QuotaUnknown => (
                format!("Quota for {} in {} could not be read", eval.family, eval.region),
                "Verify quota headroom before deploying".to_string(),
            ),
            ReasonCode::BudgetExceeded => (
                format!(
                    "Estimated cost of {} in {} exceeds the monthly budget",
                    eval.sku, eval.region
                ),
                "Raise the budget, reduce the instance count or pick a smaller SKU".to_string(),
            ),
            ReasonCode::SpotLow => (
                format!("Spot placement likelihood in {} is Low", eval.region),
                "Fall back to PAYGO capacity or deploy in a later window".to_string(),
            ),
            ReasonCode::PriceUnknown => (
                format!("No retail price found for {} in {}", eval.sku, eval.region),
                "Confirm pricing before committing to a budget".to_string(),
            ),
        };
        self.push_risk(risk);
        self.push_mitigation(mitigation);
    }

    fn add_confidence(&mut self, eval: &RegionSkuEvaluation) {
        match eval.confidence.label {
            ConfidenceLabel::High | ConfidenceLabel::Medium => {}
            ConfidenceLabel::Unknown => {
                self.push_risk(format!(
                    "Too few signals to score {} in {}",
                    eval.sku, eval.region
                ));
                self.push_mitigation("Re-run once quota and spot signals are available".to_string());
            }
            label => self.push_risk(format!(
                "Deployment confidence for {} in {} is {} ({}/100)",
                eval.sku, eval.region, label, eval.confidence.score
            )),
        }
    }

    fn add_missing_signals(&mut self, missing: &[SignalName]) {
        if missing.is_empty() {
            return;
        }
        let names: Vec<&str> = missing.iter().map(SignalName::as_str).collect();
        self.push_risk(format!("Signals unavailable: {}", names.join(", ")));
    }
}

/// Business view for a multi-region capacity plan
pub fn capacity_view(
    strategy: StrategyType,
    ranked: &[RegionSkuEvaluation],
    plan: &AllocationPlan,
    requested: u32,
    missing: &[SignalName],
) -> BusinessView {
    let Some(primary) = ranked.first() else {
        return BusinessView::no_recommendation("no region offers an eligible SKU");
    };

    let mut view = BusinessView {
        summary: capacity_summary(strategy, primary, plan, requested),
        ..Default::default()
    };

    for allocation in &plan.allocations {
        if let Some(eval) = ranked.iter().find(|e| e.region == allocation.region) {
            for code in &eval.verdict.reason_codes {
                view.add_reason(eval, *code);
            }
            view.add_confidence(eval);
        }
    }
    view.add_missing_signals(missing);

    if plan.unplaced > 0 {
        view.push_risk(format!(
            "{} of {} instances have no quota headroom in any evaluated region",
            plan.unplaced, requested
        ));
        view.push_mitigation("Add regions to the plan or request additional quota".to_string());
    }

    match strategy {
        StrategyType::ActiveActive => {
            view.push_risk("Both regions serve traffic; data consistency across regions is the workload's responsibility".to_string());
        }
        StrategyType::ActivePassive => {
            view.push_risk("The standby region doubles the reserved footprint".to_string());
            view.push_mitigation("Rehearse failover to the standby region".to_string());
        }
        StrategyType::BurstOverflow => {
            view.push_risk("Burst capacity is reserved, not provisioned; scale-out depends on quota at the time of the burst".to_string());
        }
        StrategyType::TimeWindowDeploy => {
            view.push_risk("Deployment is deferred until spot capacity improves".to_string());
            view.push_mitigation("Schedule the deployment and re-check spot placement scores first".to_string());
        }
        StrategyType::ProgressiveRamp => {
            view.push_mitigation("Ramp in stages and confirm each stage before adding regions".to_string());
        }
        StrategyType::SingleRegion | StrategyType::ShardedMultiRegion => {}
    }

    view
}

fn capacity_summary(
    strategy: StrategyType,
    primary: &RegionSkuEvaluation,
    plan: &AllocationPlan,
    requested: u32,
) -> String {
    let serving: Vec<String> = plan
        .allocations
        .iter()
        .filter(|a| a.instance_count > 0 && a.role != AllocationRole::Burst)
        .map(|a| format!("{} x {} in {}", a.instance_count, a.sku, a.region))
        .collect();
    let lead = match strategy {
        StrategyType::SingleRegion => "Deploy in a single region",
        StrategyType::ActiveActive => "Serve from two active regions",
        StrategyType::ActivePassive => "Run active/passive with a failover standby",
        StrategyType::ShardedMultiRegion => "Shard the instances across regions",
        StrategyType::BurstOverflow => "Deploy in one region with a reserved burst region",
        StrategyType::TimeWindowDeploy => "Defer the deployment to a better spot window",
        StrategyType::ProgressiveRamp => "Ramp up in the primary region and overflow to others",
    };
    format!(
        "{}: {}. {} of {} instances placed; confidence {}/100 ({}) in {}.",
        lead,
        serving.join(", "),
        plan.placed,
        requested,
        primary.confidence.score,
        primary.confidence.label,
        primary.region
    )
}

/// Business view for a single ranked recommendation
pub fn deployment_view(
    recommended: Option<&RegionSkuEvaluation>,
    rejected: &[&RegionSkuEvaluation],
    instance_count: u32,
    missing: &[SignalName],
) -> BusinessView {
    let Some(best) = recommended else {
        let mut view = BusinessView::no_recommendation("no evaluated SKU is eligible");
        for eval in rejected {
            for code in eval.verdict.reason_codes.iter().filter(|c| c.is_blocking()) {
                view.add_reason(eval, *code);
            }
        }
        return view;
    };

    let cost = best
        .estimated_monthly_cost
        .map(|c| format!(" for about {:.2} {} per month", c, best.currency))
        .unwrap_or_default();
    let mut view = BusinessView {
        summary: format!(
            "Deploy {} x {} in {}{}; confidence {}/100 ({}).",
            instance_count,
            best.sku,
            best.region,
            cost,
            best.confidence.score,
            best.confidence.label
        ),
        ..Default::default()
    };
    for code in &best.verdict.reason_codes {
        view.add_reason(best, *code);
    }
    view.add_confidence(best);
    view.add_missing_signals(missing);
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpotLabel;
    use crate::strategy::build_allocations;
    use crate::strategy::test_support::candidate;

    #[test]
    fn test_summary_names_every_serving_region() {
        let ranked = vec![
            candidate("francecentral", 6, Some(1000), SpotLabel::High),
            candidate("westeurope", 6, Some(1000), SpotLabel::High),
        ];
        let plan = build_allocations(StrategyType::ActiveActive, &ranked, 6);
        let view = capacity_view(StrategyType::ActiveActive, &ranked, &plan, 6, &[]);

        assert!(view.summary.contains("3 x Standard_D2s_v5 in francecentral"));
        assert!(view.summary.contains("3 x Standard_D2s_v5 in westeurope"));
        assert!(view.summary.contains("6 of 6"));
    }

    #[test]
    fn test_shortfall_and_quota_become_risks() {
        let ranked = vec![
            candidate("francecentral", 100, Some(10), SpotLabel::High),
            candidate("westeurope", 100, Some(10), SpotLabel::High),
        ];
        let plan = build_allocations(StrategyType::ProgressiveRamp, &ranked, 100);
        let view = capacity_view(StrategyType::ProgressiveRamp, &ranked, &plan, 100, &[SignalName::PricePressure]);

        assert!(view.risks.iter().any(|r| r.contains("90 of 100")));
        assert!(view.risks.iter().any(|r| r.contains("pricePressure")));
        assert!(view
            .mitigations
            .iter()
            .any(|m| m.contains("quota increase for standardDSv5Family in francecentral")));
    }

    #[test]
    fn test_mitigations_are_not_repeated() {
        let ranked = vec![
            candidate("francecentral", 4, Some(0), SpotLabel::Low),
            candidate("westeurope", 4, Some(0), SpotLabel::Low),
        ];
        let plan = build_allocations(StrategyType::ShardedMultiRegion, &ranked, 4);
        let view = deployment_view(None, &ranked.iter().collect::<Vec<_>>(), 4, &[]);

        assert!(plan.allocations.is_empty());
        let restrict = view
            .mitigations
            .iter()
            .filter(|m| m.starts_with("Relax SKU"))
            .count();
        assert_eq!(restrict, 1);
        assert!(view.summary.starts_with("No placement can be recommended"));
    }

    #[test]
    fn test_deployment_summary_includes_cost() {
        let mut best = candidate("francecentral", 2, Some(1000), SpotLabel::High);
        best.estimated_monthly_cost = Some(146.0);
        let view = deployment_view(Some(&best), &[], 2, &[]);
        assert!(view.summary.contains("2 x Standard_D2s_v5 in francecentral"));
        assert!(view.summary.contains("146.00 USD"));
    }
}
