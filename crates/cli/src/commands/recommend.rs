//! `pa recommend`: ranked single-deployment recommendation

use advisor_lib::{
    evaluator::RegionSkuEvaluation,
    planner::{DeploymentAdvisor, DeploymentPlanResponse},
    workload::{ConstraintSpec, PricingPreference, PricingSpec, ScaleSpec, TimingSpec, UsageSpec},
    DeploymentIntent,
};
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use tabled::Tabled;

use super::plan::print_business_view;
use super::{parse_choice, read_request, Context, WorkloadArgs};
use crate::output::{
    color_confidence, color_status, format_currency, print_heading, print_info,
    print_json, print_notes, print_rows, OutputFormat,
};

#[derive(Args, Debug, Clone)]
pub struct RecommendArgs {
    #[command(flatten)]
    pub workload: WorkloadArgs,

    /// paygo-only, balanced or spot-preferred
    #[arg(long, default_value = "balanced", value_parser = parse_choice::<PricingPreference>)]
    pub pricing: PricingPreference,

    /// Also list every evaluated candidate, including rejected ones
    #[arg(long)]
    pub all: bool,
}

impl RecommendArgs {
    fn intent(&self, ctx: &Context) -> Result<DeploymentIntent> {
        if let Some(path) = &self.workload.file {
            return read_request(path, ctx);
        }
        let w = &self.workload;
        Ok(DeploymentIntent {
            subscription: ctx.subscription.clone(),
            tenant: ctx.tenant.clone(),
            scale: ScaleSpec {
                sku: w.sku.clone(),
                sku_family: w.sku_family.clone(),
                instance_count: w.instances,
                vcpus_per_instance: w.vcpus,
                memory_gb_per_instance: w.memory_gb,
                require_gpu: w.gpu,
            },
            constraints: ConstraintSpec {
                allow_regions: w.allow.clone(),
                deny_regions: w.deny.clone(),
                data_residency: w.residency.clone(),
                max_regions: w.max_regions,
                zone_redundancy: w.zonal,
                rdma_required: w.rdma,
                ultra_ssd_required: w.ultra_ssd,
                max_rtt_ms: w.max_rtt_ms,
            },
            usage: UsageSpec {
                statefulness: w.statefulness,
                latency_sensitivity: w.latency,
                cross_region_traffic: w.traffic,
            },
            pricing: PricingSpec {
                preference: self.pricing,
                monthly_budget: w.budget,
                currency: w.currency.clone(),
            },
            timing: TimingSpec { urgency: w.urgency },
        })
    }
}

/// Row for ranked candidates
#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "#")]
    rank: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "SKU")]
    sku: String,
    #[tabled(rename = "Zones")]
    zones: usize,
    #[tabled(rename = "Quota")]
    quota: String,
    #[tabled(rename = "Spot")]
    spot: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Reasons")]
    reasons: String,
}

impl CandidateRow {
    fn new(rank: String, e: &RegionSkuEvaluation) -> Self {
        let reasons: Vec<&str> = e.verdict.reason_codes.iter().map(|r| r.as_str()).collect();
        Self {
            rank,
            region: e.region.clone(),
            sku: e.sku.clone(),
            zones: e.zones.len(),
            quota: color_status(&e.quota_status.to_string()),
            spot: color_status(&e.spot_label.to_string()),
            monthly: e
                .estimated_monthly_cost
                .map(|c| format_currency(c, &e.currency))
                .unwrap_or_else(|| "-".to_string()),
            confidence: color_confidence(e.confidence.score, e.confidence.label),
            reasons: if reasons.is_empty() {
                "-".to_string()
            } else {
                reasons.join(", ")
            },
        }
    }
}

/// Run the deployment advisor and print its response
pub async fn run(ctx: &Context, args: &RecommendArgs) -> Result<()> {
    let intent = args.intent(ctx)?;

    let advisor = DeploymentAdvisor::new(ctx.collector.clone());
    let response = advisor.recommend(intent).await;

    match ctx.format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => print_table(&response, args.all),
    }

    if response.recommendation.is_none() {
        bail!("No deployment recommendation could be produced");
    }
    Ok(())
}

fn print_table(response: &DeploymentPlanResponse, all: bool) {
    println!("{}", "Deployment Recommendation".bold());
    println!("{}", "=".repeat(60));
    println!("{}", response.summary);

    if let Some(best) = &response.recommendation {
        println!();
        println!(
            "Recommended: {} x {} in {}",
            best.instance_count,
            best.evaluation.sku.cyan().bold(),
            best.evaluation.region.cyan().bold()
        );
        println!(
            "Fragmentation risk: {:?} ({:.2})",
            best.evaluation.fragmentation.label, best.evaluation.fragmentation.score
        );
    }

    print_heading("Ranked candidates");
    let rows: Vec<CandidateRow> = response
        .recommendation
        .iter()
        .chain(response.alternatives.iter())
        .map(|r| CandidateRow::new(r.rank.to_string(), &r.evaluation))
        .collect();
    print_rows(&rows, "No eligible candidates");

    if all {
        print_heading("All evaluated candidates");
        let rows: Vec<CandidateRow> = response
            .technical_view
            .evaluations
            .iter()
            .map(|e| {
                let mark = if e.verdict.eligible { "✓" } else { "✗" };
                CandidateRow::new(mark.to_string(), e)
            })
            .collect();
        print_rows(&rows, "Nothing evaluated");
    }

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
