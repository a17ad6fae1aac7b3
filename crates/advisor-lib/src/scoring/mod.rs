//! Deterministic scoring
//!
//! This module provides:
//! - Signal normalizers (quota, spot, zones, restrictions, price, eviction, volatility)
//! - Deployment and admission confidence with weight renormalization
//! - Fragmentation risk estimation
//! - Volatility classification from historical snapshots

mod confidence;
mod fragmentation;
pub mod normalize;
mod volatility;

pub use confidence::{
    admission_confidence, deployment_confidence, BreakdownEntry, ConfidenceLabel,
    ConfidenceResult, ScoringModel, SignalName, ADMISSION_MODEL, DEPLOYMENT_MODEL,
};
pub use fragmentation::{
    estimate_fragmentation, FragmentationEstimate, FragmentationFactor, FragmentationInput,
    FragmentationLabel,
};
pub use volatility::{
    classify_volatility, VolatilityLabel, VolatilityReport, DEFAULT_VOLATILITY_WINDOW,
    MIN_VOLATILITY_SAMPLES,
};
