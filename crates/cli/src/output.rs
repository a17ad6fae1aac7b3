//! Output formatting utilities

use advisor_lib::scoring::ConfidenceLabel;
use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        OutputFormat::from_str(raw, true).ok()
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as a rounded table
pub fn print_rows<T: Tabled>(rows: &[T], empty: &str) {
    if rows.is_empty() {
        println!("{}", empty.yellow());
        return;
    }
    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Print a section heading
pub fn print_heading(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "-".repeat(60));
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print plan warnings and errors
pub fn print_notes(warnings: &[String], errors: &[String]) {
    for warning in warnings {
        print_warning(warning);
    }
    for error in errors {
        print_error(error);
    }
}

/// Format currency
pub fn format_currency(amount: f64, currency: &str) -> String {
    match currency {
        "USD" => format!("${:.2}", amount),
        "EUR" => format!("€{:.2}", amount),
        "GBP" => format!("£{:.2}", amount),
        _ => format!("{:.2} {}", amount, currency),
    }
}

/// Format an optional hourly price, `-` when unknown
pub fn format_price(amount: Option<f64>, currency: &str) -> String {
    match amount {
        Some(a) => format!("{}/h", format_currency_precise(a, currency)),
        None => "-".to_string(),
    }
}

fn format_currency_precise(amount: f64, currency: &str) -> String {
    match currency {
        "USD" => format!("${:.4}", amount),
        "EUR" => format!("€{:.4}", amount),
        "GBP" => format!("£{:.4}", amount),
        _ => format!("{:.4} {}", amount, currency),
    }
}

/// Format an optional value, `-` when unknown
pub fn format_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Color a quota status or spot label
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "ok" | "high" | "eligible" => status.green().to_string(),
        "low" | "medium" => status.yellow().to_string(),
        "blocking" | "restricted" | "rejected" => status.red().to_string(),
        _ => status.dimmed().to_string(),
    }
}

/// Color a confidence score by its label
pub fn color_confidence(score: u8, label: ConfidenceLabel) -> String {
    let formatted = format!("{} ({})", score, label);
    match label {
        ConfidenceLabel::High => formatted.green().to_string(),
        ConfidenceLabel::Medium => formatted.yellow().to_string(),
        ConfidenceLabel::Low | ConfidenceLabel::VeryLow => formatted.red().to_string(),
        ConfidenceLabel::Unknown => formatted.dimmed().to_string(),
    }
}
