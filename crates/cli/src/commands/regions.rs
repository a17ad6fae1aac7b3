//! `pa regions`: candidate region resolution

use advisor_lib::evaluator::{CandidateRegionResolver, RegionQuery, ResolvedRegions};
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use std::sync::Arc;
use tabled::Tabled;

use super::Context;
use crate::output::{print_json, print_notes, print_rows, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct RegionsArgs {
    /// Candidate regions (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub allow: Vec<String>,

    /// Excluded regions (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub deny: Vec<String>,

    /// Data residency code (e.g. FR, EU, US)
    #[arg(long)]
    pub residency: Option<String>,

    /// Maximum number of regions
    #[arg(long)]
    pub max_regions: Option<usize>,
}

#[derive(Tabled)]
struct RegionRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Region")]
    region: String,
}

/// Resolve candidate regions for the given constraints
pub async fn run(ctx: &Context, args: &RegionsArgs) -> Result<()> {
    let resolver = CandidateRegionResolver::new(
        Arc::clone(ctx.collector.api()),
        ctx.collector.gate().clone(),
    );
    let query = RegionQuery {
        subscription: &ctx.subscription,
        tenant: ctx.tenant.as_deref(),
        allow: &args.allow,
        deny: &args.deny,
        data_residency: args.residency.as_deref(),
        max_regions: args.max_regions,
    };
    let resolved = resolver.resolve(&query).await;

    match ctx.format {
        OutputFormat::Json => print_json(&resolved)?,
        OutputFormat::Table => print_table(&resolved),
    }

    if resolved.is_empty() {
        bail!("No candidate regions resolved");
    }
    Ok(())
}

fn print_table(resolved: &ResolvedRegions) {
    let source = serde_json::to_value(resolved.source)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    println!("{} ({})", "Candidate Regions".bold(), source.cyan());
    let rows: Vec<RegionRow> = resolved
        .regions
        .iter()
        .enumerate()
        .map(|(i, region)| RegionRow {
            rank: i + 1,
            region: region.clone(),
        })
        .collect();
    print_rows(&rows, "No regions");
    print_notes(&resolved.warnings, &resolved.errors);
}
