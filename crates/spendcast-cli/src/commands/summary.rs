//! Spending summary command implementation

use std::path::Path;

use anyhow::{Context, Result};
use spendcast_core::SpendingSummary;

use super::{open_pipeline, read_transactions, truncate};
use crate::cli::OutputFormat;

pub fn cmd_summary(config_path: Option<&Path>, file: &Path, format: OutputFormat) -> Result<()> {
    let pipeline = open_pipeline(config_path)?;
    let transactions = read_transactions(file)?;
    let summary = pipeline.summarize(&transactions);

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)
                .context("Failed to serialize summary to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            print_summary(&summary, pipeline.config().extract.display_currency.as_str())
        }
    }

    Ok(())
}

fn print_summary(summary: &SpendingSummary, currency: &str) {
    println!();
    println!("📊 Spending Summary ({})", currency);
    if let Some(period) = &summary.period {
        println!("   Period: {} to {}", period.from, period.to);
    }
    println!("   ─────────────────────────────────────────────────────────────");

    if summary.categories.is_empty() && summary.uncategorized.transaction_count == 0 {
        println!("   No spending found.");
        return;
    }

    println!("   Total: {:.2}", summary.total);
    println!();
    println!(
        "   {:25} │ {:>10} │ {:>6} │ {:>5}",
        "Category", "Amount", "%", "Count"
    );
    println!("   ──────────────────────────┼────────────┼────────┼───────");

    for cat in &summary.categories {
        println!(
            "   {:25} │ {:>10.2} │ {:>5.1}% │ {:>5}",
            truncate(&cat.category, 25),
            cat.amount,
            cat.percentage,
            cat.transaction_count
        );
    }

    if summary.uncategorized.transaction_count > 0 {
        println!(
            "   {:25} │ {:>10.2} │ {:>5.1}% │ {:>5}",
            "(uncategorized)",
            summary.uncategorized.amount,
            summary.uncategorized.percentage,
            summary.uncategorized.transaction_count
        );
    }

    println!();
    println!("📅 By Month");
    println!();
    for month in &summary.monthly {
        println!(
            "   {:8} {:>10.2}  ({} transactions)",
            month.month, month.amount, month.transaction_count
        );
    }

    if let Some(top) = summary.highest_category() {
        println!();
        println!("   Top category: {} ({:.1}%)", top.category, top.percentage);
    }
}
