//! `pa confidence`: raw signals and confidence breakdown for one (region, SKU)

use advisor_lib::collector::{SignalRecord, SignalRequest};
use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use tabled::Tabled;

use super::Context;
use crate::output::{
    color_confidence, color_status, format_opt, format_price, print_heading, print_json,
    print_rows, print_warning, OutputFormat,
};

#[derive(Args, Debug, Clone)]
pub struct ConfidenceArgs {
    /// Region name (e.g. francecentral)
    pub region: String,

    /// SKU name (e.g. Standard_D4s_v5)
    pub sku: String,

    /// Instance count used for the spot placement query
    #[arg(long, short = 'n', default_value_t = 1)]
    pub instances: u32,
}

#[derive(Tabled)]
struct BreakdownRow {
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Contribution")]
    contribution: String,
}

/// Collect signals for one (region, SKU) and print the scored result
pub async fn run(ctx: &Context, args: &ConfidenceArgs) -> Result<()> {
    let mut request = SignalRequest::new(&ctx.subscription, &args.region, &args.sku)
        .with_instance_count(args.instances);
    if let Some(tenant) = &ctx.tenant {
        request = request.with_tenant(tenant);
    }

    let record = ctx
        .collector
        .collect(&request)
        .await
        .with_context(|| format!("Failed to collect signals for {} in {}", args.sku, args.region))?;

    match ctx.format {
        OutputFormat::Json => print_json(&record)?,
        OutputFormat::Table => print_table(&record, &ctx.collector.config().currency),
    }
    Ok(())
}

fn print_table(record: &SignalRecord, currency: &str) {
    println!(
        "{} {} in {}",
        "Deployment confidence for".bold(),
        record.sku.cyan(),
        record.region.cyan()
    );
    println!(
        "Score:         {}",
        color_confidence(record.confidence.score, record.confidence.label)
    );

    print_heading("Signals");
    println!("vCPUs:         {}", format_opt(record.vcpus));
    println!("Zones:         {}", format_opt(record.zone_count));
    println!("Restricted:    {}", format_opt(record.restrictions_present));
    println!("Quota (vCPU):  {}", format_opt(record.quota_remaining));
    println!("Spot:          {}", color_status(&record.spot_label.to_string()));
    println!("PAYG price:    {}", format_price(record.paygo_price, currency));
    println!("Spot price:    {}", format_price(record.spot_price, currency));
    println!("Volatility:    {}", format_opt(record.volatility));

    print_heading("Breakdown");
    let rows: Vec<BreakdownRow> = record
        .confidence
        .breakdown
        .iter()
        .map(|b| BreakdownRow {
            signal: b.signal.to_string(),
            score: format!("{:.1}", b.normalized_score),
            weight: format!("{:.3}", b.effective_weight),
            contribution: format!("{:.1}", b.contribution),
        })
        .collect();
    print_rows(&rows, "Not enough signals to score");

    if !record.confidence.missing.is_empty() {
        let missing: Vec<&str> = record.confidence.missing.iter().map(|m| m.as_str()).collect();
        print_warning(&format!("Missing signals: {}", missing.join(", ")));
    }
    for warning in &record.warnings {
        print_warning(warning);
    }
}
