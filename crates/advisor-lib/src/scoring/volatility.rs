//! Historical signal volatility
//!
//! Classifies a window of [`SignalSnapshot`]s for one (region, SKU) by how
//! often the spot label flipped and how much the spot price moved.

use crate::models::SignalSnapshot;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default look-back window (7 days)
pub const DEFAULT_VOLATILITY_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Minimum samples before a label other than `Unknown` is produced
pub const MIN_VOLATILITY_SAMPLES: usize = 3;

const UNSTABLE_CHANGE_RATIO: f64 = 0.40;
const UNSTABLE_PRICE_CV: f64 = 0.25;
const MODERATE_CHANGE_RATIO: f64 = 0.15;
const MODERATE_PRICE_CV: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityLabel {
    Stable,
    Moderate,
    Unstable,
    #[default]
    Unknown,
}

impl fmt::Display for VolatilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VolatilityLabel::Stable => "stable",
            VolatilityLabel::Moderate => "moderate",
            VolatilityLabel::Unstable => "unstable",
            VolatilityLabel::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Statistics behind a volatility label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityReport {
    pub label: VolatilityLabel,
    pub samples: usize,
    /// Fraction of consecutive samples whose spot label changed
    pub label_change_ratio: Option<f64>,
    /// Coefficient of variation of the spot price
    pub price_cv: Option<f64>,
}

impl VolatilityReport {
    fn unknown(samples: usize) -> Self {
        Self {
            label: VolatilityLabel::Unknown,
            samples,
            label_change_ratio: None,
            price_cv: None,
        }
    }
}

/// Coefficient of variation (sample standard deviation over mean)
fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean <= f64::EPSILON {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt() / mean)
}

/// Classify snapshots collected at or after `now - window`.
pub fn classify_volatility(
    snapshots: &[SignalSnapshot],
    now: DateTime<Utc>,
    window: Duration,
) -> VolatilityReport {
    let window = ChronoDuration::from_std(window).unwrap_or_else(|_| ChronoDuration::days(7));
    let cutoff = now - window;

    let mut recent: Vec<&SignalSnapshot> =
        snapshots.iter().filter(|s| s.collected_at >= cutoff).collect();
    recent.sort_by_key(|s| s.collected_at);

    if recent.len() < MIN_VOLATILITY_SAMPLES {
        return VolatilityReport::unknown(recent.len());
    }

    let labelled: Vec<_> = recent
        .iter()
        .map(|s| s.spot_label)
        .filter(|l| l.is_known())
        .collect();
    let label_change_ratio = if labelled.len() >= 2 {
        let changes = labelled.windows(2).filter(|w| w[0] != w[1]).count();
        Some(changes as f64 / (labelled.len() - 1) as f64)
    } else {
        None
    };

    let prices: Vec<f64> = recent.iter().filter_map(|s| s.spot_price).collect();
    let price_cv = coefficient_of_variation(&prices);

    if label_change_ratio.is_none() && price_cv.is_none() {
        return VolatilityReport::unknown(recent.len());
    }

    let ratio = label_change_ratio.unwrap_or(0.0);
    let cv = price_cv.unwrap_or(0.0);

    let label = if ratio > UNSTABLE_CHANGE_RATIO || cv > UNSTABLE_PRICE_CV {
        VolatilityLabel::Unstable
    } else if ratio > MODERATE_CHANGE_RATIO || cv > MODERATE_PRICE_CV {
        VolatilityLabel::Moderate
    } else {
        VolatilityLabel::Stable
    };

    VolatilityReport {
        label,
        samples: recent.len(),
        label_change_ratio,
        price_cv,
    }
}
