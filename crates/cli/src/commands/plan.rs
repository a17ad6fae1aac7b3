//! `pa plan`: multi-region capacity strategy

use advisor_lib::{
    planner::{BusinessView, CapacityPlanner, CapacityStrategyResponse},
    strategy::RegionAllocation,
    WorkloadProfile,
};
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use tabled::Tabled;

use super::{read_request, Context, WorkloadArgs};
use crate::output::{
    color_confidence, color_status, format_opt, format_price, print_heading, print_info,
    print_json, print_notes, print_rows, OutputFormat,
};

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub workload: WorkloadArgs,

    /// Prefer spot capacity
    #[arg(long)]
    pub spot: bool,
}

impl PlanArgs {
    fn profile(&self, ctx: &Context) -> Result<WorkloadProfile> {
        if let Some(path) = &self.workload.file {
            return read_request(path, ctx);
        }
        let mut profile = self.workload.to_profile(ctx);
        profile.spot_preferred = self.spot;
        Ok(profile)
    }
}

/// Row for the allocation table
#[derive(Tabled)]
struct AllocationRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "SKU")]
    sku: String,
    #[tabled(rename = "Instances")]
    instances: u32,
    #[tabled(rename = "Zones")]
    zones: usize,
    #[tabled(rename = "Quota (vCPU)")]
    quota: String,
    #[tabled(rename = "Spot")]
    spot: String,
    #[tabled(rename = "PAYG")]
    paygo: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "RTT (ms)")]
    rtt: String,
}

impl AllocationRow {
    fn from_allocation(a: &RegionAllocation, currency: &str) -> Self {
        Self {
            region: a.region.clone(),
            role: a.role.as_str().to_string(),
            sku: a.sku.clone(),
            instances: a.instance_count,
            zones: a.zones.len(),
            quota: format_opt(a.quota_remaining),
            spot: color_status(&a.spot_label.to_string()),
            paygo: format_price(a.paygo_price, currency),
            confidence: color_confidence(a.confidence, a.confidence_label),
            rtt: format_opt(a.rtt_from_primary_ms),
        }
    }
}

/// Run the capacity planner and print its response
pub async fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let profile = args.profile(ctx)?;
    let currency = profile.currency.clone();

    let planner = CapacityPlanner::new(ctx.collector.clone());
    let response = planner.plan(profile).await;

    match ctx.format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => print_table(&response, &currency),
    }

    if !response.has_recommendation() {
        bail!("No capacity strategy could be produced");
    }
    Ok(())
}

fn print_table(response: &CapacityStrategyResponse, currency: &str) {
    println!("{}", "Capacity Strategy".bold());
    println!("{}", "=".repeat(60));
    println!("{}", response.summary);
    println!();
    println!("Strategy:   {}", response.strategy.to_string().cyan().bold());
    println!("Rationale:  {}", response.rationale);
    println!(
        "Instances:  {} placed of {} requested{}",
        response.instances_placed.to_string().green(),
        response.instances_requested,
        if response.instances_unplaced > 0 {
            format!(" ({} unplaced)", response.instances_unplaced)
                .red()
                .to_string()
        } else {
            String::new()
        }
    );

    print_heading("Allocations");
    let rows: Vec<AllocationRow> = response
        .allocations
        .iter()
        .map(|a| AllocationRow::from_allocation(a, currency))
        .collect();
    print_rows(&rows, "No allocations");

    print_business_view(&response.business_view);

    if !response.missing_inputs.is_empty() {
        print_info(&format!("Missing inputs: {}", response.missing_inputs.join(", ")));
    }
    if !response.missing_signals.is_empty() {
        print_info(&format!("Missing signals: {}", response.missing_signals.join(", ")));
    }
    print_notes(&response.warnings, &response.errors);

    println!();
    println!("{}", response.disclaimer.dimmed());
}

pub(crate) fn print_business_view(view: &BusinessView) {
    if view.risks.is_empty() && view.mitigations.is_empty() {
        return;
    }
    print_heading("Risks");
    for risk in &view.risks {
        println!("  • {}", risk);
    }
    if !view.mitigations.is_empty() {
        print_heading("Mitigations");
        for mitigation in &view.mitigations {
            println!("  • {}", mitigation);
        }
    }
}
