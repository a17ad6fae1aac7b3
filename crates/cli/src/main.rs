//! Placement Advisor CLI
//!
//! A command-line tool for capacity strategy planning, ranked deployment
//! recommendations, region resolution and per-SKU confidence scoring.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{
    confidence::{self, ConfidenceArgs},
    configure::{self, ConfigCommands, GivenOptions},
    plan::{self, PlanArgs},
    recommend::{self, RecommendArgs},
    regions::{self, RegionsArgs},
    Context,
};
use tracing_subscriber::EnvFilter;

/// Placement Advisor CLI
#[derive(Parser)]
#[command(name = "pa")]
#[command(author, version, about = "CLI for the Placement Advisor", long_about = None)]
pub struct Cli {
    /// JSON catalog snapshot (can also be set via PA_CATALOG env var)
    #[arg(long, env = "PA_CATALOG", global = true)]
    pub catalog: Option<String>,

    /// Subscription to plan against
    #[arg(long, env = "PA_SUBSCRIPTION", global = true)]
    pub subscription: Option<String>,

    /// Tenant used to scope cached signals
    #[arg(long, env = "PA_TENANT", global = true)]
    pub tenant: Option<String>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan a multi-region capacity strategy
    Plan(PlanArgs),

    /// Recommend a single region and SKU
    Recommend(RecommendArgs),

    /// Resolve candidate regions
    Regions(RegionsArgs),

    /// Show signals and deployment confidence for one region and SKU
    Confidence(ConfidenceArgs),

    /// Manage stored CLI defaults
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays parseable
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let stored = config::Config::load()?;
    let format = cli
        .format
        .or_else(|| stored.default_format.as_deref().and_then(output::OutputFormat::parse))
        .unwrap_or_default();

    if let Commands::Config(config_cmd) = &cli.command {
        let given = GivenOptions {
            catalog: cli.catalog.clone(),
            subscription: cli.subscription.clone(),
            tenant: cli.tenant.clone(),
            format: cli.format,
        };
        return configure::run(config_cmd, given, format);
    }

    let ctx = Context::open(
        cli.catalog.as_deref().or(stored.catalog.as_deref()),
        cli.subscription
            .or(stored.subscription)
            .unwrap_or_else(|| "default".to_string()),
        cli.tenant.or(stored.tenant),
        format,
    )?;

    // Execute command
    match &cli.command {
        Commands::Plan(args) => plan::run(&ctx, args).await?,
        Commands::Recommend(args) => recommend::run(&ctx, args).await?,
        Commands::Regions(args) => regions::run(&ctx, args).await?,
        Commands::Confidence(args) => confidence::run(&ctx, args).await?,
        Commands::Config(_) => {}
    }

    Ok(())
}
