//! Fragmentation risk estimation
//!
//! Additive heuristic: each workload-shape factor that makes a placement
//! harder to satisfy from fragmented capacity adds a fixed amount. The sum is
//! clamped to [0, 1] and every contributing factor is named.

use crate::models::SpotLabel;
use serde::{Deserialize, Serialize};

const GPU_WEIGHT: f64 = 0.25;
const LARGE_VCPU_WEIGHT: f64 = 0.15;
const LARGE_MEMORY_WEIGHT: f64 = 0.15;
const ZONAL_WEIGHT: f64 = 0.15;
const RDMA_WEIGHT: f64 = 0.10;
const ULTRA_SSD_WEIGHT: f64 = 0.05;
const SPOT_LOW_WEIGHT: f64 = 0.10;
const PRICE_PRESSURE_WEIGHT: f64 = 0.10;

const LARGE_VCPU_THRESHOLD: u32 = 64;
const LARGE_MEMORY_GB_THRESHOLD: f64 = 512.0;
const HIGH_PRICE_RATIO: f64 = 0.85;

/// Workload shape fed to the estimator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentationInput {
    pub gpu_count: u32,
    pub vcpus: u32,
    pub memory_gb: f64,
    pub zonal_required: bool,
    pub rdma_required: bool,
    pub ultra_ssd_required: bool,
    pub spot_label: Option<SpotLabel>,
    /// Spot/PAYGO price ratio
    pub price_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentationLabel {
    Low,
    Medium,
    High,
}

impl FragmentationLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.5 {
            FragmentationLabel::High
        } else if score >= 0.25 {
            FragmentationLabel::Medium
        } else {
            FragmentationLabel::Low
        }
    }
}

/// A named factor and the amount it added
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentationFactor {
    pub name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentationEstimate {
    pub score: f64,
    pub label: FragmentationLabel,
    pub factors: Vec<FragmentationFactor>,
}

impl FragmentationEstimate {
    pub fn from_score(score: f64, factors: Vec<FragmentationFactor>) -> Self {
        let score = score.clamp(0.0, 1.0);
        Self {
            score,
            label: FragmentationLabel::from_score(score),
            factors,
        }
    }
}

/// Estimate fragmentation risk for a workload shape
pub fn estimate_fragmentation(input: &FragmentationInput) -> FragmentationEstimate {
    let checks: [(bool, &str, f64); 8] = [
        (input.gpu_count > 0, "gpu", GPU_WEIGHT),
        (input.vcpus >= LARGE_VCPU_THRESHOLD, "large_vcpu", LARGE_VCPU_WEIGHT),
        (
            input.memory_gb >= LARGE_MEMORY_GB_THRESHOLD,
            "large_memory",
            LARGE_MEMORY_WEIGHT,
        ),
        (input.zonal_required, "zonal_required", ZONAL_WEIGHT),
        (input.rdma_required, "rdma_required", RDMA_WEIGHT),
        (input.ultra_ssd_required, "ultra_ssd_required", ULTRA_SSD_WEIGHT),
        (input.spot_label == Some(SpotLabel::Low), "spot_low", SPOT_LOW_WEIGHT),
        (
            input.price_ratio.map(|r| r > HIGH_PRICE_RATIO).unwrap_or(false),
            "high_price_pressure",
            PRICE_PRESSURE_WEIGHT,
        ),
    ];

    let factors: Vec<FragmentationFactor> = checks
        .iter()
        .filter(|(active, _, _)| *active)
        .map(|(_, name, weight)| FragmentationFactor {
            name: name.to_string(),
            weight: *weight,
        })
        .collect();

    let total: f64 = factors.iter().map(|f| f.weight).sum();
    FragmentationEstimate::from_score(total, factors)
}
