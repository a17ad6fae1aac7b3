//! Placement Advisor daemon
//!
//! Keeps placement signals warm for a configured set of (region, SKU)
//! targets and exposes health, refresh status and metrics over HTTP.

use advisor_lib::{
    cloud::StaticCatalog,
    collector::{InMemorySnapshotStore, RefreshWorker, SignalCollector},
    health::{components, HealthRegistry},
    observability::{AdvisorMetrics, StructuredLogger},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const ADVISOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting placement-advisor");

    let config = config::AdvisorConfig::load()?;
    info!(
        instance = %config.instance_name,
        targets = config.refresh_targets.len(),
        "Advisor configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register_all(components::ALL).await;

    let metrics = AdvisorMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(ADVISOR_VERSION);

    let catalog = match &config.catalog_path {
        Some(path) => StaticCatalog::from_path(path)
            .with_context(|| format!("Failed to load catalog from {}", path))?,
        None => {
            warn!("No catalog_path configured; serving an empty catalog");
            health_registry
                .set_degraded(components::CLOUD_API, "no catalog configured")
                .await;
            StaticCatalog::default()
        }
    };
    if config.catalog_path.is_some() {
        health_registry.set_healthy(components::CLOUD_API).await;
    }

    let store = Arc::new(InMemorySnapshotStore::new(config.snapshot_config()));
    health_registry.set_healthy(components::SNAPSHOT_STORE).await;

    let collector = Arc::new(
        SignalCollector::new(Arc::new(catalog), config.collector_config())
            .with_snapshot_store(store),
    );
    health_registry.set_healthy(components::SIGNAL_COLLECTOR).await;

    let worker = Arc::new(
        RefreshWorker::new(Arc::clone(&collector), config.refresh_config())
            .with_health(health_registry.clone()),
    );
    for request in config.signal_requests() {
        worker.register(request);
    }
    health_registry.set_healthy(components::REFRESH_WORKER).await;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let worker_handle = tokio::spawn(Arc::clone(&worker).run(shutdown_tx.subscribe()));

    let app_state = Arc::new(
        api::AppState::new(health_registry.clone(), metrics.clone()).with_refresh_worker(worker),
    );

    // Mark advisor as ready after initialization
    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    health_registry.set_ready(false).await;

    let _ = shutdown_tx.send(());
    if let Err(e) = worker_handle.await {
        warn!(error = %e, "Refresh worker did not stop cleanly");
    }
    api_handle.abort();
    info!("Shutting down");

    Ok(())
}
