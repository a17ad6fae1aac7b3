//! End-to-end planner tests against the instrumented in-memory cloud API

#[cfg(test)]
mod planner_tests {
    use crate::cloud::mock::{catalog_from, MockCloudApi, RegionFixture};
    use crate::collector::{CollectorConfig, SignalCollector};
    use crate::evaluator::RegionSource;
    use crate::models::SpotLabel;
    use crate::planner::{CapacityPlanner, DeploymentAdvisor};
    use crate::strategy::{AllocationRole, StrategyType};
    use crate::workload::{
        DeploymentIntent, LatencySensitivity, PricingPreference, Statefulness, WorkloadProfile,
    };
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn collector(api: MockCloudApi) -> Arc<SignalCollector> {
        Arc::new(SignalCollector::new(Arc::new(api), CollectorConfig::default()))
    }

    fn two_regions() -> MockCloudApi {
        MockCloudApi::new(catalog_from(&[
            RegionFixture::new("francecentral"),
            RegionFixture::new("westeurope"),
        ]))
    }

    fn profile(instances: u32, allow: &[&str]) -> WorkloadProfile {
        let mut profile = WorkloadProfile::new("sub-1", instances);
        profile.allow_regions = allow.iter().map(|r| r.to_string()).collect();
        profile
    }

    #[tokio::test]
    async fn test_allow_and_deny_same_region_has_no_candidates() {
        let planner = CapacityPlanner::new(collector(two_regions()));
        let mut request = profile(4, &["francecentral"]);
        request.deny_regions = vec!["FranceCentral".to_string()];

        let response = planner.plan(request).await;
        assert!(response
            .errors
            .iter()
            .any(|e| e.contains("No candidate regions")));
        assert!(response.allocations.is_empty());
        assert!(!response.has_recommendation());
        assert!(!response.disclaimer.is_empty());
        assert_eq!(response.strategy, StrategyType::SingleRegion);
    }

    fn unknown_quota_regions() -> MockCloudApi {
        MockCloudApi::new(catalog_from(&[
            RegionFixture {
                quota_remaining: None,
                ..RegionFixture::new("francecentral")
            },
            RegionFixture {
                quota_remaining: None,
                ..RegionFixture::new("westeurope")
            },
        ]))
    }

    #[tokio::test]
    async fn test_all_rejected_still_reports_missing_quota() {
        let planner = CapacityPlanner::new(collector(unknown_quota_regions()));
        let mut request = profile(4, &["francecentral", "westeurope"]);
        // 4 x $0.10/h x 730 h is far above the budget
        request.monthly_budget = Some(10.0);

        let response = planner.plan(request).await;
        assert!(response.technical_view.evaluations.is_empty());
        assert!(!response.errors.is_empty());
        assert!(response.missing_signals.contains(&"quota".to_string()));
    }

    #[tokio::test]
    async fn test_deployment_all_rejected_still_reports_missing_quota() {
        let advisor = DeploymentAdvisor::new(collector(unknown_quota_regions()));
        let mut request = DeploymentIntent::new("sub-1");
        request.scale.instance_count = 4;
        request.constraints.allow_regions =
            vec!["francecentral".to_string(), "westeurope".to_string()];
        request.pricing.monthly_budget = Some(10.0);

        let response = advisor.recommend(request).await;
        assert!(response.recommendation.is_none());
        assert!(response.missing_signals.contains(&"quota".to_string()));
    }

    #[tokio::test]
    async fn test_stateful_workload_gets_active_passive() {
        let planner = CapacityPlanner::new(collector(two_regions()));
        let mut request = profile(4, &["francecentral", "westeurope"]);
        request.statefulness = Statefulness::Stateful;

        let response = planner.plan(request).await;
        assert_eq!(response.strategy, StrategyType::ActivePassive);
        assert_eq!(response.allocations.len(), 2);
        assert_eq!(response.allocations[0].role, AllocationRole::Primary);
        assert_eq!(response.allocations[1].role, AllocationRole::Secondary);
        assert_eq!(response.instances_placed, 4);
        assert_eq!(response.technical_view.region_source, RegionSource::AllowList);
        assert!(response.errors.is_empty());
    }

    #[tokio::test]
    async fn test_quota_shortfall_ramps_and_reports_unplaced() {
        let api = MockCloudApi::new(catalog_from(&[
            RegionFixture {
                quota_remaining: Some(10),
                ..RegionFixture::new("francecentral")
            },
            RegionFixture {
                quota_remaining: Some(10),
                ..RegionFixture::new("westeurope")
            },
        ]));
        let planner = CapacityPlanner::new(collector(api));
        let response = planner
            .plan(profile(100, &["francecentral", "westeurope"]))
            .await;

        assert!(matches!(
            response.strategy,
            StrategyType::ProgressiveRamp | StrategyType::ShardedMultiRegion
        ));
        let total: u32 = response.allocations.iter().map(|a| a.instance_count).sum();
        assert!(total <= 100);
        assert_eq!(total, 10);
        assert_eq!(response.instances_unplaced, 90);
        assert!(response.warnings.iter().any(|w| w.contains("90")));
        assert!(response
            .business_view
            .mitigations
            .iter()
            .any(|m| m.contains("quota increase")));
    }

    #[tokio::test]
    async fn test_failing_region_does_not_abort_plan() {
        let api = two_regions().with_failing_region("westeurope");
        let planner = CapacityPlanner::new(collector(api));
        let response = planner
            .plan(profile(4, &["francecentral", "westeurope"]))
            .await;

        assert_eq!(response.strategy, StrategyType::SingleRegion);
        assert_eq!(response.allocations.len(), 1);
        assert_eq!(response.allocations[0].region, "francecentral");
        assert!(response
            .warnings
            .iter()
            .any(|w| w.starts_with("westeurope: SKU listing failed")));
    }

    #[tokio::test]
    async fn test_unmapped_residency_warns_and_errors() {
        let planner = CapacityPlanner::new(collector(two_regions()));
        let mut request = profile(4, &[]);
        request.data_residency = Some("XX".to_string());

        let response = planner.plan(request).await;
        assert!(response.warnings.iter().any(|w| w.contains("'XX'")));
        assert!(response.errors.iter().any(|e| e.contains("No candidate regions")));
        assert_eq!(response.technical_view.region_source, RegionSource::DataResidency);
    }

    #[tokio::test]
    async fn test_latency_limit_keeps_single_region() {
        let api = MockCloudApi::new(catalog_from(&[
            RegionFixture::new("eastus"),
            RegionFixture::new("westus2"),
        ]));
        let planner = CapacityPlanner::new(collector(api));
        let mut request = profile(4, &["eastus", "westus2"]);
        request.latency_sensitivity = LatencySensitivity::High;
        request.max_rtt_ms = Some(30);

        let response = planner.plan(request).await;
        assert_eq!(response.strategy, StrategyType::SingleRegion);
        assert!(response.warnings.iter().any(|w| w.contains("Multi-region rejected")));
        assert!(response.missing_inputs.contains(&"monthlyBudget".to_string()));
    }

    #[tokio::test]
    async fn test_discovery_ranks_by_confidence() {
        let api = MockCloudApi::new(catalog_from(&[
            RegionFixture {
                spot: SpotLabel::Low,
                ..RegionFixture::new("eastus")
            },
            RegionFixture::new("westeurope"),
        ]));
        let planner = CapacityPlanner::new(collector(api));
        let response = planner.plan(profile(4, &[])).await;

        assert_eq!(response.technical_view.region_source, RegionSource::Discovery);
        assert_eq!(response.technical_view.evaluations[0].region, "westeurope");
        assert_eq!(response.allocations[0].region, "westeurope");
    }

    fn six_regions() -> MockCloudApi {
        MockCloudApi::new(catalog_from(&[
            RegionFixture {
                spot: SpotLabel::Low,
                ..RegionFixture::new("francecentral")
            },
            RegionFixture {
                spot: SpotLabel::Medium,
                ..RegionFixture::new("westeurope")
            },
            RegionFixture::new("northeurope"),
            RegionFixture {
                spot: SpotLabel::Medium,
                ..RegionFixture::new("uksouth")
            },
            RegionFixture {
                spot: SpotLabel::Low,
                ..RegionFixture::new("swedencentral")
            },
            RegionFixture {
                spot: SpotLabel::Low,
                ..RegionFixture::new("germanywestcentral")
            },
        ]))
    }

    fn intent(instances: u32) -> DeploymentIntent {
        let mut intent = DeploymentIntent::new("sub-1");
        intent.scale.instance_count = instances;
        intent.constraints.allow_regions = [
            "francecentral",
            "westeurope",
            "northeurope",
            "uksouth",
            "swedencentral",
            "germanywestcentral",
        ]
        .iter()
        .map(|r| r.to_string())
        .collect();
        intent
    }

    #[tokio::test]
    async fn test_recommendation_and_alternatives_are_ranked() {
        let advisor = DeploymentAdvisor::new(collector(six_regions()));
        let response = advisor.recommend(intent(2)).await;

        let best = response.recommendation.as_ref().unwrap();
        assert_eq!(best.rank, 1);
        assert_eq!(best.evaluation.region, "northeurope");
        assert_eq!(response.alternatives.len(), 4);
        assert_eq!(response.alternatives[0].evaluation.region, "westeurope");
        assert_eq!(response.alternatives[1].evaluation.region, "uksouth");

        let mut previous = best.evaluation.confidence.score;
        for (i, alt) in response.alternatives.iter().enumerate() {
            assert_eq!(alt.rank, i + 2);
            assert!(alt.evaluation.confidence.score <= previous);
            previous = alt.evaluation.confidence.score;
        }
        assert!(response.summary.contains("northeurope"));
        assert!(response.missing_signals.contains(&"pricePressure".to_string()));
    }

    #[tokio::test]
    async fn test_paygo_only_skips_spot_scores() {
        let api = Arc::new(six_regions());
        let advisor = DeploymentAdvisor::new(Arc::new(SignalCollector::new(
            api.clone(),
            CollectorConfig::default(),
        )));
        let mut request = intent(2);
        request.pricing.preference = PricingPreference::PaygoOnly;

        let response = advisor.recommend(request).await;
        assert_eq!(api.spot_calls.load(Ordering::SeqCst), 0);
        assert!(!response.technical_view.requirements.requires_spot_score);
        assert!(response.recommendation.is_some());
    }

    #[tokio::test]
    async fn test_budget_too_small_yields_no_recommendation() {
        let advisor = DeploymentAdvisor::new(collector(six_regions()));
        let mut request = intent(2);
        request.pricing.monthly_budget = Some(1.0);

        let response = advisor.recommend(request).await;
        assert!(response.recommendation.is_none());
        assert!(response.alternatives.is_empty());
        assert!(response.errors.iter().any(|e| e.contains("No eligible SKU")));
        assert!(response
            .business_view
            .risks
            .iter()
            .any(|r| r.contains("exceeds the monthly budget")));
    }
}
