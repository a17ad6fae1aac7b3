//! Integration tests for the advisor API endpoints

#[allow(dead_code)]
#[path = "../src/api.rs"]
mod api;

use advisor_lib::{
    cloud::StaticCatalog,
    collector::{CollectorConfig, RefreshConfig, RefreshWorker, SignalCollector, SignalRequest},
    health::{components, HealthRegistry},
    observability::AdvisorMetrics,
};
use api::{create_router, AppState};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::SIGNAL_COLLECTOR).await;
    health_registry.register(components::REFRESH_WORKER).await;

    let metrics = AdvisorMetrics::new();
    let state = Arc::new(AppState::new(health_registry, metrics));
    let router = create_router(state.clone());

    (router, state)
}

fn demo_catalog() -> StaticCatalog {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/catalog.json");
    StaticCatalog::from_path(path).unwrap()
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);

    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .set_degraded(components::REFRESH_WORKER, "2 of 6 targets failed")
        .await;

    // Degraded still returns 200 (operational)
    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);

    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .set_unhealthy(components::SIGNAL_COLLECTOR, "catalog unreadable")
        .await;

    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_returns_503_when_not_ready() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let readiness: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_readyz_returns_ok_when_ready() {
    let (app, state) = setup_test_app().await;
    state.health_registry.set_ready(true).await;

    let (status, body) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);

    let readiness: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_readyz_returns_503_when_ready_but_unhealthy() {
    let (app, state) = setup_test_app().await;

    state.health_registry.set_ready(true).await;
    state
        .health_registry
        .set_unhealthy(components::SIGNAL_COLLECTOR, "Failed")
        .await;

    let (status, _) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state) = setup_test_app().await;

    state.metrics.inc_external_call("get_skus");
    state.metrics.inc_cache_hit();
    state.metrics.observe_plan_latency(0.02);
    state.metrics.inc_plan_generated("active_passive");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("placement_advisor_external_calls_total"));
    assert!(metrics_text.contains("placement_advisor_signal_cache_hits_total"));
    assert!(metrics_text.contains("placement_advisor_plans_generated_total"));
    assert!(metrics_text.contains("placement_advisor_plan_latency_seconds_bucket"));
    assert!(metrics_text.contains("placement_advisor_plan_latency_seconds_count"));
}

#[tokio::test]
async fn test_healthz_includes_component_details() {
    let (app, _state) = setup_test_app().await;

    let (_, body) = get(app, "/healthz").await;
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert!(health["components"].is_object());
    assert!(health["components"]["signal_collector"].is_object());
    assert!(health["components"]["refresh_worker"].is_object());
}

#[tokio::test]
async fn test_refresh_status_without_worker() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/v1/refresh").await;
    assert_eq!(status, StatusCode::OK);

    let refresh: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(refresh["enabled"], false);
    assert!(refresh["lastCycle"].is_null());
}

#[tokio::test]
async fn test_refresh_status_reports_last_cycle() {
    let collector = Arc::new(SignalCollector::new(
        Arc::new(demo_catalog()),
        CollectorConfig::default(),
    ));
    let worker = Arc::new(RefreshWorker::new(collector, RefreshConfig::default()));
    worker.register(SignalRequest::new("sub-1", "francecentral", "Standard_D2s_v5"));
    worker.register(SignalRequest::new("sub-1", "eastus", "Standard_NC6s_v3"));
    worker.register(SignalRequest::new("sub-1", "eastus", "Standard_M128"));
    worker.refresh_once().await;

    let state = Arc::new(
        AppState::new(HealthRegistry::new(), AdvisorMetrics::new()).with_refresh_worker(worker),
    );
    let (status, body) = get(create_router(state), "/v1/refresh").await;
    assert_eq!(status, StatusCode::OK);

    let refresh: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(refresh["enabled"], true);
    assert_eq!(refresh["targets"], 3);
    assert_eq!(refresh["lastCycle"]["refreshed"], 2);
    assert_eq!(refresh["lastCycle"]["failed"], 1);
}
