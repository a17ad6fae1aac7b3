//! `pa config`: persisted CLI defaults

use anyhow::Result;
use clap::{Subcommand, ValueEnum};

use crate::config::Config;
use crate::output::{print_info, print_json, print_success, OutputFormat};

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Show the stored configuration
    Show,

    /// Store the given global options (--catalog, --subscription, --tenant, --format) as defaults
    Set,
}

/// Global options as given on the command line, before stored defaults apply
#[derive(Debug, Clone, Default)]
pub struct GivenOptions {
    pub catalog: Option<String>,
    pub subscription: Option<String>,
    pub tenant: Option<String>,
    pub format: Option<OutputFormat>,
}

pub fn run(command: &ConfigCommands, given: GivenOptions, format: OutputFormat) -> Result<()> {
    let mut config = Config::load()?;
    match command {
        ConfigCommands::Show => match format {
            OutputFormat::Json => print_json(&config)?,
            OutputFormat::Table => {
                print_info(&format!("Config file: {}", Config::config_path()?.display()));
                println!("catalog:        {}", config.catalog.as_deref().unwrap_or("-"));
                println!("subscription:   {}", config.subscription.as_deref().unwrap_or("-"));
                println!("tenant:         {}", config.tenant.as_deref().unwrap_or("-"));
                println!("default_format: {}", config.default_format.as_deref().unwrap_or("-"));
            }
        },
        ConfigCommands::Set => {
            apply(&mut config, given);
            let path = config.save()?;
            print_success(&format!("Saved configuration to {}", path.display()));
        }
    }
    Ok(())
}

/// Overwrite only the options that were given
fn apply(config: &mut Config, given: GivenOptions) {
    if given.catalog.is_some() {
        config.catalog = given.catalog;
    }
    if given.subscription.is_some() {
        config.subscription = given.subscription;
    }
    if given.tenant.is_some() {
        config.tenant = given.tenant;
    }
    if let Some(format) = given.format.and_then(|f| f.to_possible_value()) {
        config.default_format = Some(format.get_name().to_string());
    }
}
