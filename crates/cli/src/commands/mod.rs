//! CLI subcommands
//!
//! Every command runs the advisor library in-process against a JSON
//! catalog snapshot.

pub mod confidence;
pub mod configure;
pub mod plan;
pub mod recommend;
pub mod regions;

use advisor_lib::{
    cloud::StaticCatalog,
    collector::{CollectorConfig, SignalCollector},
    workload::{CrossRegionTraffic, LatencySensitivity, Statefulness, Urgency},
    WorkloadProfile,
};
use anyhow::{bail, Context as _, Result};
use clap::Args;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::output::OutputFormat;

/// Resolved global options plus the signal collector every command shares
pub struct Context {
    pub collector: Arc<SignalCollector>,
    pub subscription: String,
    pub tenant: Option<String>,
    pub format: OutputFormat,
}

impl Context {
    pub fn open(
        catalog: Option<&str>,
        subscription: String,
        tenant: Option<String>,
        format: OutputFormat,
    ) -> Result<Self> {
        let Some(path) = catalog else {
            bail!("No catalog configured; pass --catalog, set PA_CATALOG or run `pa config set --catalog <path>`");
        };
        let catalog = StaticCatalog::from_path(path)
            .with_context(|| format!("Failed to load catalog from {}", path))?;
        debug!(catalog = %path, "Loaded catalog snapshot");
        let collector = SignalCollector::new(Arc::new(catalog), CollectorConfig::default());

        Ok(Self {
            collector: Arc::new(collector),
            subscription,
            tenant,
            format,
        })
    }
}

/// Parse a kebab or lowercase choice through the type's serde names
pub fn parse_choice<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_ascii_lowercase()))
        .map_err(|_| format!("unsupported value '{}'", raw))
}

/// Read a JSON request file, filling `subscription` and `tenant` from the
/// global options when the file omits them
pub fn read_request<T: DeserializeOwned>(path: &PathBuf, ctx: &Context) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if let Some(object) = value.as_object_mut() {
        object
            .entry("subscription")
            .or_insert_with(|| ctx.subscription.clone().into());
        if let Some(tenant) = &ctx.tenant {
            object
                .entry("tenant")
                .or_insert_with(|| tenant.clone().into());
        }
    }

    serde_json::from_value(value).with_context(|| format!("Invalid request in {}", path.display()))
}

/// Workload flags shared by `plan` and `recommend`
#[derive(Args, Debug, Clone)]
pub struct WorkloadArgs {
    /// Read the request from a JSON file instead of flags
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Exact SKU name (e.g. Standard_D4s_v5)
    #[arg(long)]
    pub sku: Option<String>,

    /// SKU family (e.g. standardDSv5Family)
    #[arg(long)]
    pub sku_family: Option<String>,

    /// Only consider GPU SKUs
    #[arg(long)]
    pub gpu: bool,

    /// Minimum vCPUs per instance
    #[arg(long)]
    pub vcpus: Option<u32>,

    /// Minimum memory per instance in GB
    #[arg(long)]
    pub memory_gb: Option<f64>,

    /// Number of instances to place
    #[arg(long, short = 'n', default_value_t = 1)]
    pub instances: u32,

    /// Candidate regions (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub allow: Vec<String>,

    /// Excluded regions (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub deny: Vec<String>,

    /// Data residency code (e.g. FR, EU, US)
    #[arg(long)]
    pub residency: Option<String>,

    /// Maximum number of regions to evaluate
    #[arg(long)]
    pub max_regions: Option<usize>,

    /// stateless, soft-state or stateful
    #[arg(long, default_value = "stateless", value_parser = parse_choice::<Statefulness>)]
    pub statefulness: Statefulness,

    /// low, medium or high
    #[arg(long, default_value = "medium", value_parser = parse_choice::<LatencySensitivity>)]
    pub latency: LatencySensitivity,

    /// Maximum acceptable inter-region RTT in milliseconds
    #[arg(long)]
    pub max_rtt_ms: Option<u32>,

    /// Cross-region traffic: low, medium or high
    #[arg(long, default_value = "medium", value_parser = parse_choice::<CrossRegionTraffic>)]
    pub traffic: CrossRegionTraffic,

    /// Require at least three availability zones
    #[arg(long)]
    pub zonal: bool,

    /// Require RDMA-capable SKUs
    #[arg(long)]
    pub rdma: bool,

    /// Require Ultra SSD support
    #[arg(long)]
    pub ultra_ssd: bool,

    /// Monthly budget for the whole deployment
    #[arg(long)]
    pub budget: Option<f64>,

    /// Pricing currency
    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// immediate, normal or flexible
    #[arg(long, default_value = "normal", value_parser = parse_choice::<Urgency>)]
    pub urgency: Urgency,
}

impl WorkloadArgs {
    /// Flat profile built from the flags alone
    pub fn to_profile(&self, ctx: &Context) -> WorkloadProfile {
        let mut profile = WorkloadProfile::new(&ctx.subscription, self.instances);
        profile.tenant = ctx.tenant.clone();
        profile.sku = self.sku.clone();
        profile.sku_family = self.sku_family.clone();
        profile.require_gpu = self.gpu;
        profile.vcpus_per_instance = self.vcpus;
        profile.memory_gb_per_instance = self.memory_gb;
        profile.allow_regions = self.allow.clone();
        profile.deny_regions = self.deny.clone();
        profile.data_residency = self.residency.clone();
        profile.max_regions = self.max_regions;
        profile.statefulness = self.statefulness;
        profile.latency_sensitivity = self.latency;
        profile.max_rtt_ms = self.max_rtt_ms;
        profile.cross_region_traffic = self.traffic;
        profile.zonal_required = self.zonal;
        profile.rdma_required = self.rdma;
        profile.ultra_ssd_required = self.ultra_ssd;
        profile.monthly_budget = self.budget;
        profile.currency = self.currency.clone();
        profile.urgency = self.urgency;
        profile
    }
}
