//! HTTP surface of the daemon: probes, refresh status and Prometheus metrics

use advisor_lib::{
    collector::{RefreshStats, RefreshWorker},
    health::{ComponentStatus, HealthRegistry},
    observability::AdvisorMetrics,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: AdvisorMetrics,
    pub refresh_worker: Option<Arc<RefreshWorker>>,
}

impl AppState {
    pub fn new(health_registry: HealthRegistry, metrics: AdvisorMetrics) -> Self {
        Self {
            health_registry,
            metrics,
            refresh_worker: None,
        }
    }

    pub fn with_refresh_worker(mut self, worker: Arc<RefreshWorker>) -> Self {
        self.refresh_worker = Some(worker);
        self
    }
}

/// Body of `GET /v1/refresh`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatus {
    pub enabled: bool,
    pub targets: usize,
    pub last_cycle: Option<RefreshStats>,
}

impl RefreshStatus {
    async fn of(worker: Option<&RefreshWorker>) -> Self {
        match worker {
            Some(worker) => Self {
                enabled: true,
                targets: worker.target_count(),
                last_cycle: worker.last_cycle().await,
            },
            None => Self {
                enabled: false,
                targets: 0,
                last_cycle: None,
            },
        }
    }
}

/// Probe status code: only an unhealthy component fails liveness
fn liveness_code(status: ComponentStatus) -> StatusCode {
    match status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;
    (liveness_code(health.status), Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;
    let code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(readiness))
}

async fn refresh_status(State(state): State<Arc<AppState>>) -> Json<RefreshStatus> {
    Json(RefreshStatus::of(state.refresh_worker.as_deref()).await)
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    match encoder.encode(&prometheus::gather(), &mut buffer) {
        Ok(()) => (
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            buffer,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/v1/refresh", get(refresh_status))
        .with_state(state)
}

/// Bind `0.0.0.0:<port>` and serve until the task is aborted
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "API server listening");

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
