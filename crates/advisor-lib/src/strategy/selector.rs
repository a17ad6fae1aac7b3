//! Strategy selection
//!
//! Rules are evaluated in order and the first match wins. Quota shortfall
//! dominates statefulness, and a low spot score dominates everything except
//! the single-region short-circuits.

use super::latency::rtt_ms;
use super::StrategyType;
use crate::evaluator::{QuotaStatus, RegionSkuEvaluation};
use crate::models::SpotLabel;
use crate::workload::{CrossRegionTraffic, LatencySensitivity, Statefulness};
use serde::{Deserialize, Serialize};

/// Everything the selector looks at
#[derive(Debug, Clone, Copy)]
pub struct StrategyInput<'a> {
    /// Best candidate per region, ranked by confidence descending
    pub ranked: &'a [RegionSkuEvaluation],
    pub instance_count: u32,
    pub statefulness: Statefulness,
    pub latency_sensitivity: LatencySensitivity,
    pub max_rtt_ms: Option<u32>,
    pub cross_region_traffic: CrossRegionTraffic,
    pub spot_preferred: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDecision {
    pub strategy: StrategyType,
    pub rationale: String,
    pub warnings: Vec<String>,
}

impl StrategyDecision {
    fn new(strategy: StrategyType, rationale: impl Into<String>) -> Self {
        Self {
            strategy,
            rationale: rationale.into(),
            warnings: Vec::new(),
        }
    }

    fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

pub fn select_strategy(input: &StrategyInput<'_>) -> StrategyDecision {
    let Some(primary) = input.ranked.first() else {
        return StrategyDecision::new(
            StrategyType::SingleRegion,
            "No eligible region was found; the plan has no placement.",
        );
    };

    let Some(next) = input.ranked.get(1) else {
        return StrategyDecision::new(
            StrategyType::SingleRegion,
            format!("{} is the only candidate region.", primary.region),
        );
    };

    if input.spot_preferred && primary.spot_label == SpotLabel::Low {
        return StrategyDecision::new(
            StrategyType::TimeWindowDeploy,
            format!(
                "Spot placement in {} is currently Low; defer the deployment to a better window.",
                primary.region
            ),
        );
    }

    if let Some(capacity) = primary.max_instances() {
        if capacity < input.instance_count {
            return if capacity > 0 {
                StrategyDecision::new(
                    StrategyType::ProgressiveRamp,
                    format!(
                        "{} quota holds {} of {} instances; ramp there first and overflow to other regions.",
                        primary.region, capacity, input.instance_count
                    ),
                )
            } else {
                StrategyDecision::new(
                    StrategyType::ShardedMultiRegion,
                    format!(
                        "{} has no quota headroom for {}; shard the instances across regions.",
                        primary.region, primary.sku
                    ),
                )
            };
        }
    }

    match input.statefulness {
        Statefulness::Stateful => StrategyDecision::new(
            StrategyType::ActivePassive,
            format!(
                "Stateful workload: serve from {} with {} as a failover standby.",
                primary.region, next.region
            ),
        ),
        Statefulness::Stateless | Statefulness::SoftState => {
            select_for_stateless(input, primary, next)
        }
    }
}

fn select_for_stateless(
    input: &StrategyInput<'_>,
    primary: &RegionSkuEvaluation,
    next: &RegionSkuEvaluation,
) -> StrategyDecision {
    let mut warnings = Vec::new();

    if input.latency_sensitivity == LatencySensitivity::High {
        if let Some(max_rtt) = input.max_rtt_ms {
            match rtt_ms(&primary.region, &next.region) {
                Some(rtt) if rtt > max_rtt => {
                    return StrategyDecision::new(
                        StrategyType::SingleRegion,
                        format!(
                            "Latency-sensitive workload: {} to {} is {} ms, above the {} ms limit.",
                            primary.region, next.region, rtt, max_rtt
                        ),
                    )
                    .with_warning(format!(
                        "Multi-region rejected: RTT {} -> {} is {} ms (max {} ms)",
                        primary.region, next.region, rtt, max_rtt
                    ));
                }
                Some(_) => {}
                None => warnings.push(format!(
                    "No RTT data between {} and {}; latency limit not checked",
                    primary.region, next.region
                )),
            }
        }
    }

    let quota_sufficient = matches!(primary.quota_status, QuotaStatus::Ok | QuotaStatus::Unknown);
    let low_traffic = input.cross_region_traffic == CrossRegionTraffic::Low;

    let mut decision = if quota_sufficient && low_traffic {
        StrategyDecision::new(
            StrategyType::SingleRegion,
            format!(
                "{} has sufficient quota and little cross-region traffic is expected.",
                primary.region
            ),
        )
    } else {
        StrategyDecision::new(
            StrategyType::ActiveActive,
            format!(
                "Stateless workload: serve from both {} and {}.",
                primary.region, next.region
            ),
        )
    };
    decision.warnings.extend(warnings);
    decision
}
