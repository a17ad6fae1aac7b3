//! Allocation builder
//!
//! Turns a strategy and the ranked best candidate per region into per-region
//! instance counts. Quota-derived maxima are `floor(remaining / vcpus)`;
//! unknown quota is treated as unbounded.

use super::latency::rtt_ms;
use super::StrategyType;
use crate::evaluator::RegionSkuEvaluation;
use crate::models::SpotLabel;
use crate::scoring::ConfidenceLabel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationRole {
    Primary,
    Secondary,
    Shard,
    Burst,
}

impl AllocationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationRole::Primary => "primary",
            AllocationRole::Secondary => "secondary",
            AllocationRole::Shard => "shard",
            AllocationRole::Burst => "burst",
        }
    }
}

/// One concrete placement slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionAllocation {
    pub region: String,
    pub role: AllocationRole,
    pub sku: String,
    pub instance_count: u32,
    pub zones: Vec<String>,
    pub quota_remaining: Option<u64>,
    pub spot_label: SpotLabel,
    pub paygo_price: Option<f64>,
    pub spot_price: Option<f64>,
    pub confidence: u8,
    pub confidence_label: ConfidenceLabel,
    pub rtt_from_primary_ms: Option<u32>,
}

impl RegionAllocation {
    fn from_evaluation(
        eval: &RegionSkuEvaluation,
        role: AllocationRole,
        instance_count: u32,
        primary_region: &str,
    ) -> Self {
        Self {
            region: eval.region.clone(),
            role,
            sku: eval.sku.clone(),
            instance_count,
            zones: eval.zones.clone(),
            quota_remaining: eval.quota_remaining,
            spot_label: eval.spot_label,
            paygo_price: eval.paygo_price,
            spot_price: eval.spot_price,
            confidence: eval.confidence.score,
            confidence_label: eval.confidence.label,
            rtt_from_primary_ms: rtt_ms(primary_region, &eval.region),
        }
    }
}

/// Allocations for a plan plus what could not be placed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPlan {
    pub allocations: Vec<RegionAllocation>,
    /// Instances serving the requested count; standby mirrors are excluded
    pub placed: u32,
    pub unplaced: u32,
    pub warnings: Vec<String>,
}

impl AllocationPlan {
    pub fn primary(&self) -> Option<&RegionAllocation> {
        self.allocations
            .iter()
            .find(|a| a.role == AllocationRole::Primary)
    }

    pub fn regions(&self) -> Vec<&str> {
        self.allocations.iter().map(|a| a.region.as_str()).collect()
    }
}

pub fn build_allocations(
    strategy: StrategyType,
    ranked: &[RegionSkuEvaluation],
    instance_count: u32,
) -> AllocationPlan {
    let Some(primary) = ranked.first() else {
        let mut plan = AllocationPlan::default();
        if instance_count > 0 {
            plan.unplaced = instance_count;
            plan.warnings.push(format!(
                "No eligible region: {} instances unplaced",
                instance_count
            ));
        }
        return plan;
    };
    let home = primary.region.as_str();
    let secondary = ranked.get(1);

    let mut allocations = Vec::new();
    match strategy {
        StrategyType::SingleRegion | StrategyType::TimeWindowDeploy => {
            allocations.push(RegionAllocation::from_evaluation(
                primary,
                AllocationRole::Primary,
                instance_count,
                home,
            ));
        }
        StrategyType::ActiveActive => match secondary {
            Some(next) => {
                let half = instance_count / 2;
                allocations.push(RegionAllocation::from_evaluation(
                    primary,
                    AllocationRole::Primary,
                    instance_count - half,
                    home,
                ));
                // The secondary may be quota-limited; its shortfall stays unplaced
                allocations.push(RegionAllocation::from_evaluation(
                    next,
                    AllocationRole::Secondary,
                    next.capacity_for(half),
                    home,
                ));
            }
            None => allocations.push(RegionAllocation::from_evaluation(
                primary,
                AllocationRole::Primary,
                instance_count,
                home,
            )),
        },
        StrategyType::ActivePassive => {
            allocations.push(RegionAllocation::from_evaluation(
                primary,
                AllocationRole::Primary,
                instance_count,
                home,
            ));
            if let Some(next) = secondary {
                allocations.push(RegionAllocation::from_evaluation(
                    next,
                    AllocationRole::Secondary,
                    instance_count,
                    home,
                ));
            }
        }
        StrategyType::BurstOverflow => {
            allocations.push(RegionAllocation::from_evaluation(
                primary,
                AllocationRole::Primary,
                instance_count,
                home,
            ));
            if let Some(next) = secondary {
                allocations.push(RegionAllocation::from_evaluation(
                    next,
                    AllocationRole::Burst,
                    0,
                    home,
                ));
            }
        }
        StrategyType::ShardedMultiRegion => {
            let mut remaining = instance_count;
            for eval in ranked {
                if remaining == 0 {
                    break;
                }
                let take = eval.capacity_for(remaining);
                if take == 0 {
                    continue;
                }
                allocations.push(RegionAllocation::from_evaluation(
                    eval,
                    AllocationRole::Shard,
                    take,
                    home,
                ));
                remaining -= take;
            }
        }
        StrategyType::ProgressiveRamp => {
            let first = primary.capacity_for(instance_count);
            allocations.push(RegionAllocation::from_evaluation(
                primary,
                AllocationRole::Primary,
                first,
                home,
            ));
            let mut remaining = instance_count - first;
            for eval in &ranked[1..] {
                if remaining == 0 {
                    break;
                }
                let take = eval.capacity_for(remaining);
                if take == 0 {
                    continue;
                }
                allocations.push(RegionAllocation::from_evaluation(
                    eval,
                    AllocationRole::Shard,
                    take,
                    home,
                ));
                remaining -= take;
            }
        }
    }

    let placed: u32 = allocations
        .iter()
        .filter(|a| {
            !(strategy == StrategyType::ActivePassive && a.role == AllocationRole::Secondary)
        })
        .map(|a| a.instance_count)
        .sum();
    let unplaced = instance_count.saturating_sub(placed);

    let mut warnings = Vec::new();
    if unplaced > 0 {
        warnings.push(format!(
            "Quota shortfall: {} of {} instances could not be placed across {} regions",
            unplaced,
            instance_count,
            ranked.len()
        ));
    }
    if strategy == StrategyType::ActivePassive && secondary.is_none() {
        warnings.push(format!(
            "No secondary region available; {} runs without a failover standby",
            home
        ));
    }

    AllocationPlan {
        allocations,
        placed,
        unplaced,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::candidate;

    fn ranked(instances: u32, quotas: &[Option<u64>]) -> Vec<RegionSkuEvaluation> {
        let regions = ["francecentral", "westeurope", "northeurope", "uksouth"];
        quotas
            .iter()
            .zip(regions)
            .map(|(q, r)| candidate(r, instances, *q, SpotLabel::High))
            .collect()
    }

    fn total(plan: &AllocationPlan) -> u32 {
        plan.allocations.iter().map(|a| a.instance_count).sum()
    }

    #[test]
    fn test_single_region_places_everything_on_primary() {
        let plan = build_allocations(StrategyType::SingleRegion, &ranked(7, &[Some(100), Some(100)]), 7);
        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(plan.allocations[0].role, AllocationRole::Primary);
        assert_eq!(plan.allocations[0].instance_count, 7);
        assert_eq!(plan.allocations[0].rtt_from_primary_ms, Some(0));
        assert_eq!(plan.unplaced, 0);
    }

    #[test]
    fn test_active_active_gives_remainder_to_primary() {
        let plan = build_allocations(StrategyType::ActiveActive, &ranked(7, &[Some(100), Some(100)]), 7);
        assert_eq!(plan.allocations[0].instance_count, 4);
        assert_eq!(plan.allocations[1].instance_count, 3);
        assert_eq!(plan.allocations[1].role, AllocationRole::Secondary);
        assert_eq!(plan.allocations[1].rtt_from_primary_ms, Some(10));
        assert_eq!(plan.placed, 7);
    }

    #[test]
    fn test_active_active_caps_secondary_at_quota() {
        // 4 vCPUs at 2 per instance holds 2 of the 5 assigned to the secondary
        let plan = build_allocations(StrategyType::ActiveActive, &ranked(10, &[Some(100), Some(4)]), 10);
        assert_eq!(plan.allocations[0].instance_count, 5);
        assert_eq!(plan.allocations[1].instance_count, 2);
        assert_eq!(plan.placed, 7);
        assert_eq!(plan.unplaced, 3);
        assert!(plan.warnings[0].contains("3 of 10"));
    }

    #[test]
    fn test_active_passive_mirrors_full_count() {
        let plan = build_allocations(StrategyType::ActivePassive, &ranked(6, &[Some(100), Some(100)]), 6);
        assert_eq!(plan.allocations[0].instance_count, 6);
        assert_eq!(plan.allocations[1].instance_count, 6);
        assert_eq!(plan.allocations[1].role, AllocationRole::Secondary);
        assert_eq!(plan.placed, 6);
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_burst_reserves_zero_instances() {
        let plan = build_allocations(StrategyType::BurstOverflow, &ranked(4, &[Some(12), Some(100)]), 4);
        assert_eq!(plan.allocations[1].role, AllocationRole::Burst);
        assert_eq!(plan.allocations[1].instance_count, 0);
        assert_eq!(total(&plan), 4);
    }

    #[test]
    fn test_sharded_never_exceeds_request() {
        // 10 vCPUs at 2 per instance holds 5 per region
        let plan = build_allocations(StrategyType::ShardedMultiRegion, &ranked(100, &[Some(10), Some(10)]), 100);
        assert!(total(&plan) <= 100);
        assert_eq!(total(&plan), 10);
        assert_eq!(plan.unplaced, 90);
        assert!(plan.warnings[0].contains("90"));
        assert!(plan.allocations.iter().all(|a| a.role == AllocationRole::Shard));
    }

    #[test]
    fn test_sharded_skips_regions_without_headroom() {
        let plan = build_allocations(StrategyType::ShardedMultiRegion, &ranked(8, &[Some(0), Some(10), None]), 8);
        assert_eq!(plan.regions(), vec!["westeurope", "northeurope"]);
        assert_eq!(plan.allocations[0].instance_count, 5);
        assert_eq!(plan.allocations[1].instance_count, 3);
        assert_eq!(plan.unplaced, 0);
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_ramp_fills_primary_then_overflows() {
        let plan = build_allocations(
            StrategyType::ProgressiveRamp,
            &ranked(12, &[Some(10), Some(8), Some(100)]),
            12,
        );
        assert_eq!(plan.primary().map(|a| a.instance_count), Some(5));
        assert_eq!(plan.allocations[1].instance_count, 4);
        assert_eq!(plan.allocations[2].instance_count, 3);
        assert_eq!(total(&plan), 12);
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_ramp_reports_shortfall() {
        let plan = build_allocations(StrategyType::ProgressiveRamp, &ranked(100, &[Some(10), Some(10)]), 100);
        assert_eq!(total(&plan), 10);
        assert!(plan.warnings[0].contains("90 of 100"));
    }

    #[test]
    fn test_empty_ranking_is_all_unplaced() {
        let plan = build_allocations(StrategyType::SingleRegion, &[], 3);
        assert!(plan.allocations.is_empty());
        assert_eq!(plan.unplaced, 3);
        assert_eq!(plan.warnings.len(), 1);
    }
}
