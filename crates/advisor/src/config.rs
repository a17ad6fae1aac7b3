//! Daemon configuration
//!
//! Loaded from an optional TOML file (`ADVISOR_CONFIG`, default
//! `advisor.toml`) overlaid with `ADVISOR_*` environment variables.

use advisor_lib::collector::{
    CollectorConfig, RefreshConfig, SignalRequest, SnapshotStoreConfig,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// One (region, SKU) pair kept warm by the refresh worker
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefreshTarget {
    pub region: String,
    pub sku: String,
    #[serde(default = "default_instance_count")]
    pub instance_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Instance name used in structured log events
    pub instance_name: String,

    /// API server port for health/metrics
    pub api_port: u16,

    /// JSON catalog snapshot backing the cloud API
    pub catalog_path: Option<String>,

    pub subscription: String,
    pub tenant: Option<String>,

    pub cache_ttl_secs: u64,
    pub max_concurrency: usize,
    pub currency: String,

    pub refresh_interval_secs: u64,
    pub refresh_on_start: bool,
    pub refresh_targets: Vec<RefreshTarget>,

    pub snapshot_retention_hours: u64,
    pub snapshot_max_size: usize,
}

fn default_instance_count() -> u32 {
    1
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "placement-advisor".to_string())
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        let collector = CollectorConfig::default();
        let snapshots = SnapshotStoreConfig::default();
        Self {
            instance_name: default_instance_name(),
            api_port: 8080,
            catalog_path: None,
            subscription: "default".to_string(),
            tenant: None,
            cache_ttl_secs: collector.cache_ttl.as_secs(),
            max_concurrency: collector.max_concurrency,
            currency: collector.currency,
            refresh_interval_secs: RefreshConfig::default().interval.as_secs(),
            refresh_on_start: true,
            refresh_targets: Vec::new(),
            snapshot_retention_hours: snapshots.max_retention.as_secs() / 3600,
            snapshot_max_size: snapshots.max_size,
        }
    }
}

impl AdvisorConfig {
    /// Load configuration from the config file and environment
    pub fn load() -> Result<Self> {
        let path = std::env::var("ADVISOR_CONFIG").unwrap_or_else(|_| "advisor.toml".to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("ADVISOR").try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        config
            .try_deserialize()
            .context("Invalid advisor configuration")
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            max_concurrency: self.max_concurrency.max(1),
            currency: self.currency.clone(),
            ..Default::default()
        }
    }

    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            interval: Duration::from_secs(self.refresh_interval_secs.max(1)),
            refresh_on_start: self.refresh_on_start,
        }
    }

    pub fn snapshot_config(&self) -> SnapshotStoreConfig {
        SnapshotStoreConfig {
            max_retention: Duration::from_secs(self.snapshot_retention_hours * 3600),
            max_size: self.snapshot_max_size,
        }
    }

    pub fn signal_requests(&self) -> Vec<SignalRequest> {
        self.refresh_targets
            .iter()
            .map(|t| {
                let request = SignalRequest::new(&self.subscription, &t.region, &t.sku)
                    .with_instance_count(t.instance_count);
                match &self.tenant {
                    Some(tenant) => request.with_tenant(tenant),
                    None => request,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_follow_library() {
        let config = AdvisorConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.cache_ttl_secs, 20 * 60);
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.refresh_interval_secs, 30 * 60);
        assert_eq!(config.snapshot_retention_hours, 7 * 24);
        assert!(config.signal_requests().is_empty());
    }

    #[test]
    fn test_load_targets_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
subscription = "sub-1"
tenant = "tenant-a"
refresh_interval_secs = 600

[[refresh_targets]]
region = "francecentral"
sku = "Standard_D2s_v5"
instance_count = 4

[[refresh_targets]]
region = "westeurope"
sku = "Standard_D4s_v5"
"#
        )
        .unwrap();

        let config = AdvisorConfig::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.refresh_config().interval, Duration::from_secs(600));

        let requests = config.signal_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].instance_count, 4);
        assert_eq!(requests[0].tenant.as_deref(), Some("tenant-a"));
        assert_eq!(requests[1].instance_count, 1);
        assert_eq!(requests[1].subscription, "sub-1");
    }
}
