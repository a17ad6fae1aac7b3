//! Signal normalizers
//!
//! Pure functions that map raw external signals onto a common scale.
//! Deployment-confidence signals land on 0-100, admission-only signals
//! (eviction band, volatility) on 0-1. Every function returns `None` when
//! its raw input is absent.

use super::VolatilityLabel;
use crate::models::SpotLabel;

/// Instances of headroom at which quota stops mattering
pub const QUOTA_FULL_SCORE_INSTANCES: f64 = 10.0;

/// Zones needed for a full zone-breadth score
pub const FULL_ZONE_BREADTH: f64 = 3.0;

/// Spot/PAYGO ratio at or below which spot is considered cheap
pub const CHEAP_SPOT_RATIO: f64 = 0.2;

/// Spot/PAYGO ratio at or above which spot carries no price advantage
pub const EXPENSIVE_SPOT_RATIO: f64 = 0.8;

/// Quota headroom in instances, mapped linearly to 0-100
pub fn quota_score(remaining_vcpus: Option<u64>, vcpu_per_instance: u32) -> Option<f64> {
    let remaining = remaining_vcpus? as f64;
    let instances = remaining / vcpu_per_instance.max(1) as f64;
    if instances <= 0.0 {
        Some(0.0)
    } else if instances >= QUOTA_FULL_SCORE_INSTANCES {
        Some(100.0)
    } else {
        Some(instances / QUOTA_FULL_SCORE_INSTANCES * 100.0)
    }
}

/// Spot placement label, 0-100
pub fn spot_score(label: Option<SpotLabel>) -> Option<f64> {
    match label? {
        SpotLabel::High => Some(100.0),
        SpotLabel::Medium => Some(60.0),
        SpotLabel::Low => Some(25.0),
        SpotLabel::Unknown => None,
    }
}

/// Zone breadth, 0-100
pub fn zone_score(zone_count: Option<u32>) -> Option<f64> {
    let zones = zone_count? as f64;
    Some((zones / FULL_ZONE_BREADTH).min(1.0) * 100.0)
}

/// Restriction presence, 0 when restricted
pub fn restriction_score(restrictions_present: Option<bool>) -> Option<f64> {
    restrictions_present.map(|present| if present { 0.0 } else { 100.0 })
}

/// Spot/PAYGO price ratio
pub fn price_ratio(paygo: Option<f64>, spot: Option<f64>) -> Option<f64> {
    let paygo = paygo?;
    let spot = spot?;
    if paygo <= 0.0 || !paygo.is_finite() || !spot.is_finite() {
        return None;
    }
    Some(spot / paygo)
}

/// Price pressure, 100 when spot is cheap relative to PAYGO
pub fn price_pressure_score(paygo: Option<f64>, spot: Option<f64>) -> Option<f64> {
    let ratio = price_ratio(paygo, spot)?;
    if ratio <= CHEAP_SPOT_RATIO {
        Some(100.0)
    } else if ratio >= EXPENSIVE_SPOT_RATIO {
        Some(0.0)
    } else {
        Some((EXPENSIVE_SPOT_RATIO - ratio) / (EXPENSIVE_SPOT_RATIO - CHEAP_SPOT_RATIO) * 100.0)
    }
}

/// Upper bound (percent) of an eviction band such as `"0-5"`, `"10-15%"` or `"20+"`.
/// Open-ended bands return infinity.
fn eviction_upper_bound(band: &str) -> Option<f64> {
    let cleaned = band.trim().trim_end_matches('%').trim();
    if cleaned.is_empty() {
        return None;
    }

    if let Some(lower) = cleaned.strip_suffix('+') {
        lower.trim().trim_end_matches('%').parse::<f64>().ok()?;
        return Some(f64::INFINITY);
    }

    if let Some((lo, hi)) = cleaned.split_once('-') {
        let lo: f64 = lo.trim().trim_end_matches('%').parse().ok()?;
        let hi: f64 = hi.trim().trim_end_matches('%').parse().ok()?;
        if hi < lo {
            return None;
        }
        return Some(hi);
    }

    cleaned.parse::<f64>().ok()
}

/// Eviction-rate band, 0-1
pub fn eviction_score(band: Option<&str>) -> Option<f64> {
    let upper = eviction_upper_bound(band?)?;
    let score = if upper <= 5.0 {
        1.0
    } else if upper <= 10.0 {
        0.8
    } else if upper <= 15.0 {
        0.6
    } else if upper <= 20.0 {
        0.4
    } else {
        0.2
    };
    Some(score)
}

/// Historical volatility, 0-1
pub fn volatility_score(label: Option<VolatilityLabel>) -> Option<f64> {
    match label? {
        VolatilityLabel::Stable => Some(1.0),
        VolatilityLabel::Moderate => Some(0.65),
        VolatilityLabel::Unstable => Some(0.3),
        VolatilityLabel::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|v| (v - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn test_quota_score_bounds() {
        assert!(approx(quota_score(Some(0), 4), 0.0));
        assert!(approx(quota_score(Some(40), 4), 100.0));
        assert!(approx(quota_score(Some(400), 4), 100.0));
        assert!(approx(quota_score(Some(20), 4), 50.0));
        assert_eq!(quota_score(None, 4), None);
    }

    #[test]
    fn test_quota_score_zero_vcpu_treated_as_one() {
        assert!(approx(quota_score(Some(5), 0), 50.0));
    }

    #[test]
    fn test_spot_score() {
        assert!(approx(spot_score(Some(SpotLabel::High)), 100.0));
        assert!(approx(spot_score(Some(SpotLabel::Medium)), 60.0));
        assert!(approx(spot_score(Some(SpotLabel::Low)), 25.0));
        assert_eq!(spot_score(Some(SpotLabel::Unknown)), None);
        assert_eq!(spot_score(None), None);
    }

    #[test]
    fn test_zone_score() {
        assert!(approx(zone_score(Some(0)), 0.0));
        assert!(approx(zone_score(Some(1)), 100.0 / 3.0));
        assert!(approx(zone_score(Some(3)), 100.0));
        assert!(approx(zone_score(Some(5)), 100.0));
        assert_eq!(zone_score(None), None);
    }

    #[test]
    fn test_restriction_score() {
        assert!(approx(restriction_score(Some(true)), 0.0));
        assert!(approx(restriction_score(Some(false)), 100.0));
        assert_eq!(restriction_score(None), None);
    }

    #[test]
    fn test_price_pressure_boundaries() {
        assert!(approx(price_pressure_score(Some(1.0), Some(0.2)), 100.0));
        assert!(approx(price_pressure_score(Some(1.0), Some(0.95)), 0.0));
        assert!(approx(price_pressure_score(Some(1.0), Some(0.8)), 0.0));
        assert!(approx(price_pressure_score(Some(1.0), Some(0.5)), 50.0));
    }

    #[test]
    fn test_price_pressure_absent() {
        assert_eq!(price_pressure_score(None, Some(0.2)), None);
        assert_eq!(price_pressure_score(Some(1.0), None), None);
        assert_eq!(price_pressure_score(Some(0.0), Some(0.2)), None);
        assert_eq!(price_pressure_score(Some(-1.0), Some(0.2)), None);
    }

    #[test]
    fn test_eviction_bands() {
        assert_eq!(eviction_score(Some("0-5")), Some(1.0));
        assert_eq!(eviction_score(Some("5-10")), Some(0.8));
        assert_eq!(eviction_score(Some("10-15%")), Some(0.6));
        assert_eq!(eviction_score(Some("15-20")), Some(0.4));
        assert_eq!(eviction_score(Some("20+")), Some(0.2));
        assert_eq!(eviction_score(Some("3")), Some(1.0));
    }

    #[test]
    fn test_eviction_unparseable() {
        assert_eq!(eviction_score(Some("unknown")), None);
        assert_eq!(eviction_score(Some("")), None);
        assert_eq!(eviction_score(Some("10-5")), None);
        assert_eq!(eviction_score(None), None);
    }

    #[test]
    fn test_volatility_score() {
        assert_eq!(volatility_score(Some(VolatilityLabel::Stable)), Some(1.0));
        assert_eq!(volatility_score(Some(VolatilityLabel::Moderate)), Some(0.65));
        assert_eq!(volatility_score(Some(VolatilityLabel::Unstable)), Some(0.3));
        assert_eq!(volatility_score(Some(VolatilityLabel::Unknown)), None);
    }
}
