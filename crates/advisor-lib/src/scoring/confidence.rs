//! Weighted confidence scoring with automatic weight renormalization
//!
//! A [`ScoringModel`] is an ordered list of `(signal, nominal weight)` pairs
//! plus a minimum number of present signals. Absent signals are dropped and
//! the remaining weights are rescaled so they sum to one. The order of the
//! weight list fixes the order of the breakdown.

use super::fragmentation::FragmentationEstimate;
use super::normalize;
use crate::models::SignalSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signals that can contribute to a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalName {
    Quota,
    Spot,
    Zones,
    Restrictions,
    PricePressure,
    SpotPlacement,
    EvictionRate,
    Volatility,
    Fragmentation,
    Policy,
}

impl SignalName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalName::Quota => "quota",
            SignalName::Spot => "spot",
            SignalName::Zones => "zones",
            SignalName::Restrictions => "restrictions",
            SignalName::PricePressure => "pricePressure",
            SignalName::SpotPlacement => "spotPlacement",
            SignalName::EvictionRate => "evictionRate",
            SignalName::Volatility => "volatility",
            SignalName::Fragmentation => "fragmentation",
            SignalName::Policy => "policy",
        }
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative band of a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceLabel {
    High,
    Medium,
    Low,
    #[serde(rename = "Very Low")]
    VeryLow,
    Unknown,
}

/// Ordered label thresholds, first match wins
const LABEL_THRESHOLDS: &[(u8, ConfidenceLabel)] = &[
    (80, ConfidenceLabel::High),
    (60, ConfidenceLabel::Medium),
    (40, ConfidenceLabel::Low),
];

impl ConfidenceLabel {
    pub fn from_score(score: u8) -> Self {
        LABEL_THRESHOLDS
            .iter()
            .find(|(min, _)| score >= *min)
            .map(|(_, label)| *label)
            .unwrap_or(ConfidenceLabel::VeryLow)
    }
}

impl fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfidenceLabel::High => "High",
            ConfidenceLabel::Medium => "Medium",
            ConfidenceLabel::Low => "Low",
            ConfidenceLabel::VeryLow => "Very Low",
            ConfidenceLabel::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// One present signal's share of the final score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownEntry {
    pub signal: SignalName,
    /// Normalized value on the 0-100 scale
    pub normalized_score: f64,
    pub effective_weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceResult {
    pub score: u8,
    pub label: ConfidenceLabel,
    pub breakdown: Vec<BreakdownEntry>,
    pub missing: Vec<SignalName>,
}

impl ConfidenceResult {
    fn unknown(missing: Vec<SignalName>) -> Self {
        Self {
            score: 0,
            label: ConfidenceLabel::Unknown,
            breakdown: Vec::new(),
            missing,
        }
    }

    pub fn is_known(&self) -> bool {
        self.label != ConfidenceLabel::Unknown
    }

    /// Sum of effective weights across the breakdown
    pub fn total_effective_weight(&self) -> f64 {
        self.breakdown.iter().map(|b| b.effective_weight).sum()
    }
}

/// Ordered signal weights and the minimum number of present signals needed to score
#[derive(Debug, Clone, Copy)]
pub struct ScoringModel {
    pub weights: &'static [(SignalName, f64)],
    pub min_signals: usize,
}

/// Five-signal deployment confidence
pub const DEPLOYMENT_MODEL: ScoringModel = ScoringModel {
    weights: &[
        (SignalName::Quota, 0.25),
        (SignalName::Spot, 0.35),
        (SignalName::Zones, 0.15),
        (SignalName::Restrictions, 0.15),
        (SignalName::PricePressure, 0.10),
    ],
    min_signals: 2,
};

/// Six-signal admission confidence
pub const ADMISSION_MODEL: ScoringModel = ScoringModel {
    weights: &[
        (SignalName::SpotPlacement, 0.25),
        (SignalName::EvictionRate, 0.20),
        (SignalName::Volatility, 0.15),
        (SignalName::Fragmentation, 0.20),
        (SignalName::Quota, 0.10),
        (SignalName::Policy, 0.10),
    ],
    min_signals: 3,
};

impl ScoringModel {
    /// Score the signals returned by `value_of` (each on 0-100, `None` when absent).
    pub fn score(&self, value_of: impl Fn(SignalName) -> Option<f64>) -> ConfidenceResult {
        let mut present: Vec<(SignalName, f64, f64)> = Vec::with_capacity(self.weights.len());
        let mut missing = Vec::new();
        let mut total_weight = 0.0;

        for &(signal, weight) in self.weights {
            match value_of(signal) {
                Some(value) if value.is_finite() => {
                    total_weight += weight;
                    present.push((signal, weight, value.clamp(0.0, 100.0)));
                }
                _ => missing.push(signal),
            }
        }

        if total_weight <= 0.0 || present.len() < self.min_signals {
            return ConfidenceResult::unknown(missing);
        }

        let breakdown: Vec<BreakdownEntry> = present
            .into_iter()
            .map(|(signal, weight, value)| {
                let effective_weight = weight / total_weight;
                BreakdownEntry {
                    signal,
                    normalized_score: value,
                    effective_weight,
                    contribution: value * effective_weight,
                }
            })
            .collect();

        // f64::round rounds half away from zero
        let raw: f64 = breakdown.iter().map(|b| b.contribution).sum();
        let score = raw.round().clamp(0.0, 100.0) as u8;

        ConfidenceResult {
            score,
            label: ConfidenceLabel::from_score(score),
            breakdown,
            missing,
        }
    }
}

/// Deployment confidence for one (region, SKU)
pub fn deployment_confidence(signals: &SignalSet) -> ConfidenceResult {
    let vcpus = signals.vcpus.unwrap_or(1);
    DEPLOYMENT_MODEL.score(|signal| match signal {
        SignalName::Quota => normalize::quota_score(signals.quota_remaining, vcpus),
        SignalName::Spot => normalize::spot_score(signals.spot_label),
        SignalName::Zones => normalize::zone_score(signals.zones_available),
        SignalName::Restrictions => normalize::restriction_score(signals.restrictions_present),
        SignalName::PricePressure => {
            normalize::price_pressure_score(signals.paygo_price, signals.spot_price)
        }
        _ => None,
    })
}

/// Zones and restrictions folded into one policy signal (mean of the present halves)
fn policy_score(signals: &SignalSet) -> Option<f64> {
    let parts: Vec<f64> = [
        normalize::zone_score(signals.zones_available),
        normalize::restriction_score(signals.restrictions_present),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.iter().sum::<f64>() / parts.len() as f64)
    }
}

/// Admission confidence for one (region, SKU); fragmentation risk counts inversely
pub fn admission_confidence(
    signals: &SignalSet,
    fragmentation: Option<&FragmentationEstimate>,
) -> ConfidenceResult {
    let vcpus = signals.vcpus.unwrap_or(1);
    ADMISSION_MODEL.score(|signal| match signal {
        SignalName::SpotPlacement => normalize::spot_score(signals.spot_label),
        SignalName::EvictionRate => {
            normalize::eviction_score(signals.eviction_rate.as_deref()).map(|v| v * 100.0)
        }
        SignalName::Volatility => normalize::volatility_score(signals.volatility).map(|v| v * 100.0),
        SignalName::Fragmentation => fragmentation.map(|f| (1.0 - f.score) * 100.0),
        SignalName::Quota => normalize::quota_score(signals.quota_remaining, vcpus),
        SignalName::Policy => policy_score(signals),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpotLabel;
    use crate::scoring::VolatilityLabel;

    fn full_signals() -> SignalSet {
        SignalSet {
            vcpus: Some(4),
            zones_available: Some(3),
            restrictions_present: Some(false),
            quota_remaining: Some(100),
            spot_label: Some(SpotLabel::High),
            paygo_price: Some(1.0),
            spot_price: Some(0.2),
            eviction_rate: Some("0-5".into()),
            volatility: Some(VolatilityLabel::Stable),
        }
    }

    fn fixed(score: f64) -> impl Fn(SignalName) -> Option<f64> {
        move |_| Some(score)
    }

    #[test]
    fn test_all_signals_perfect() {
        let result = deployment_confidence(&full_signals());
        assert_eq!(result.score, 100);
        assert_eq!(result.label, ConfidenceLabel::High);
        assert!(result.missing.is_empty());
        assert_eq!(result.breakdown.len(), 5);
    }

    #[test]
    fn test_effective_weights_sum_to_one() {
        let mut signals = full_signals();
        signals.spot_label = None;
        signals.paygo_price = None;
        let result = deployment_confidence(&signals);

        assert!((result.total_effective_weight() - 1.0).abs() < 0.01);
        assert_eq!(result.missing, vec![SignalName::Spot, SignalName::PricePressure]);
    }

    #[test]
    fn test_renormalization_changes_contribution() {
        let signals = SignalSet {
            vcpus: Some(2),
            zones_available: Some(3),
            restrictions_present: Some(true),
            ..Default::default()
        };
        let result = deployment_confidence(&signals);

        // zones .15 and restrictions .15 -> 0.5 each
        assert_eq!(result.breakdown.len(), 2);
        assert!((result.breakdown[0].effective_weight - 0.5).abs() < 1e-9);
        assert_eq!(result.score, 50);
        assert_eq!(result.label, ConfidenceLabel::Low);
    }

    #[test]
    fn test_breakdown_follows_weight_order() {
        let result = deployment_confidence(&full_signals());
        let order: Vec<SignalName> = result.breakdown.iter().map(|b| b.signal).collect();
        assert_eq!(
            order,
            vec![
                SignalName::Quota,
                SignalName::Spot,
                SignalName::Zones,
                SignalName::Restrictions,
                SignalName::PricePressure
            ]
        );
    }

    #[test]
    fn test_deployment_needs_two_signals() {
        let signals = SignalSet {
            zones_available: Some(3),
            ..Default::default()
        };
        let result = deployment_confidence(&signals);
        assert_eq!(result.label, ConfidenceLabel::Unknown);
        assert_eq!(result.score, 0);
        assert!(result.breakdown.is_empty());
        assert_eq!(result.missing.len(), 4);
    }

    #[test]
    fn test_scoring_is_pure() {
        let signals = SignalSet {
            vcpus: Some(8),
            quota_remaining: Some(24),
            spot_label: Some(SpotLabel::Medium),
            zones_available: Some(2),
            ..Default::default()
        };
        let a = deployment_confidence(&signals);
        let b = deployment_confidence(&signals);
        assert_eq!(a, b);
    }

    #[test]
    fn test_label_boundaries() {
        assert_eq!(ConfidenceLabel::from_score(80), ConfidenceLabel::High);
        assert_eq!(ConfidenceLabel::from_score(79), ConfidenceLabel::Medium);
        assert_eq!(ConfidenceLabel::from_score(60), ConfidenceLabel::Medium);
        assert_eq!(ConfidenceLabel::from_score(59), ConfidenceLabel::Low);
        assert_eq!(ConfidenceLabel::from_score(40), ConfidenceLabel::Low);
        assert_eq!(ConfidenceLabel::from_score(39), ConfidenceLabel::VeryLow);
    }

    #[test]
    fn test_model_rounds_to_nearest() {
        let result = DEPLOYMENT_MODEL.score(fixed(79.6));
        assert_eq!(result.score, 80);
        assert_eq!(result.label, ConfidenceLabel::High);

        let result = DEPLOYMENT_MODEL.score(fixed(79.4));
        assert_eq!(result.score, 79);
        assert_eq!(result.label, ConfidenceLabel::Medium);
    }

    #[test]
    fn test_admission_below_minimum_is_unknown() {
        let signals = SignalSet {
            spot_label: Some(SpotLabel::High),
            eviction_rate: Some("0-5".into()),
            ..Default::default()
        };
        let result = admission_confidence(&signals, None);
        assert_eq!(result.label, ConfidenceLabel::Unknown);
        assert_eq!(result.score, 0);
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn test_admission_with_fragmentation() {
        let estimate = FragmentationEstimate::from_score(0.0, vec![]);
        let result = admission_confidence(&full_signals(), Some(&estimate));
        assert_eq!(result.score, 100);
        assert_eq!(result.breakdown.len(), 6);
        assert!((result.total_effective_weight() - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_admission_policy_combines_zones_and_restrictions() {
        let signals = SignalSet {
            spot_label: Some(SpotLabel::High),
            eviction_rate: Some("0-5".into()),
            zones_available: Some(3),
            restrictions_present: Some(true),
            ..Default::default()
        };
        let result = admission_confidence(&signals, None);
        let policy = result
            .breakdown
            .iter()
            .find(|b| b.signal == SignalName::Policy)
            .unwrap();
        assert!((policy.normalized_score - 50.0).abs() < 1e-9);
    }
}
