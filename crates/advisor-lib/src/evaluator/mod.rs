//! Candidate region resolution and per-region SKU evaluation

mod region_sku;
mod regions;

pub use region_sku::{
    evaluate_sku, EvaluationContext, QuotaStatus, ReasonCode, RegionEvaluation, RegionEvaluator,
    RegionSkuEvaluation, Verdict, DEFAULT_MAX_CANDIDATE_SKUS, HOURS_PER_MONTH,
};
pub use regions::{
    residency_regions, CandidateRegionResolver, RegionQuery, RegionSource, ResolvedRegions,
    DEFAULT_MAX_REGIONS,
};
