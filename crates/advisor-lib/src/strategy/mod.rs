//! Deployment strategy selection and allocation
//!
//! The selector is a pure decision function over the ranked best candidate
//! of each region; the allocation builder then turns the chosen strategy
//! into concrete per-region instance counts.

mod allocation;
mod latency;
mod selector;

pub use allocation::{build_allocations, AllocationPlan, AllocationRole, RegionAllocation};
pub use latency::rtt_ms;
pub use selector::{select_strategy, StrategyDecision, StrategyInput};

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    SingleRegion,
    ActiveActive,
    ActivePassive,
    ShardedMultiRegion,
    BurstOverflow,
    TimeWindowDeploy,
    ProgressiveRamp,
}

impl StrategyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::SingleRegion => "single_region",
            StrategyType::ActiveActive => "active_active",
            StrategyType::ActivePassive => "active_passive",
            StrategyType::ShardedMultiRegion => "sharded_multi_region",
            StrategyType::BurstOverflow => "burst_overflow",
            StrategyType::TimeWindowDeploy => "time_window_deploy",
            StrategyType::ProgressiveRamp => "progressive_ramp",
        }
    }

    /// Whether the strategy spreads serving capacity over more than one region
    pub fn is_multi_region(&self) -> bool {
        matches!(
            self,
            StrategyType::ActiveActive
                | StrategyType::ActivePassive
                | StrategyType::ShardedMultiRegion
                | StrategyType::BurstOverflow
                | StrategyType::ProgressiveRamp
        )
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
