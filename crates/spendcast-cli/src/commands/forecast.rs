//! Forecast command implementation

use std::path::Path;

use anyhow::{Context, Result};
use spendcast_core::{ForecastPoint, ForecastResult};

use super::{open_pipeline, read_transactions};
use crate::cli::OutputFormat;

pub fn cmd_forecast(
    config_path: Option<&Path>,
    file: &Path,
    horizon: Option<u32>,
    future_only: bool,
    format: OutputFormat,
) -> Result<()> {
    let pipeline = open_pipeline(config_path)?;
    let transactions = read_transactions(file)?;
    let horizon = horizon.unwrap_or(pipeline.config().model.horizon_days);

    let result = match pipeline.run_with_horizon(&transactions, horizon) {
        Ok(result) => result,
        Err(e) if e.is_client_error() && format == OutputFormat::Text => {
            println!();
            println!("📈 Spending Forecast");
            println!("   {}", e);
            return Ok(());
        }
        Err(e) => return Err(e).context("Forecast failed"),
    };

    let result = if future_only {
        result.future_only()
    } else {
        result
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .context("Failed to serialize forecast to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            print_forecast(&result, pipeline.config().extract.display_currency.as_str())
        }
    }

    Ok(())
}

fn print_forecast(result: &ForecastResult, currency: &str) {
    let observed_total: f64 = result.historical.iter().map(|h| h.y_original).sum();
    let future = result.future();
    let future_total: f64 = future.iter().map(|p| p.yhat).sum();

    println!();
    println!("📈 Spending Forecast ({})", currency);
    if let (Some(first), Some(last)) = (result.historical.first(), result.historical.last()) {
        println!(
            "   History: {} to {} ({} days, {:.2} spent)",
            first.ds,
            last.ds,
            result.historical.len(),
            observed_total
        );
    }
    println!("   ─────────────────────────────────────────────────────────────");

    let fitted = result.fitted();
    if !fitted.is_empty() {
        println!();
        println!(
            "   {:10} │ {:>10} │ {:>10} │ {:>10} │ {:>10}",
            "Date", "Actual", "Fit", "Low", "High"
        );
        println!("   ───────────┼────────────┼────────────┼────────────┼────────────");
        for (point, observed) in fitted.iter().zip(&result.historical) {
            println!(
                "   {:10} │ {:>10.2} │ {:>10.2} │ {:>10.2} │ {:>10.2}",
                point.ds.to_string(),
                observed.y_original,
                point.yhat,
                point.yhat_lower,
                point.yhat_upper
            );
        }
    }

    println!();
    if future.is_empty() {
        println!("   No future days requested.");
        return;
    }

    println!("🔮 Next {} days", future.len());
    println!();
    println!(
        "   {:10} │ {:>10} │ {:>10} │ {:>10}",
        "Date", "Forecast", "Low", "High"
    );
    println!("   ───────────┼────────────┼────────────┼────────────");
    for point in future {
        print_point(point);
    }
    println!();
    println!("   Expected total: {:.2}", future_total);
}

fn print_point(point: &ForecastPoint) {
    println!(
        "   {:10} │ {:>10.2} │ {:>10.2} │ {:>10.2}",
        point.ds.to_string(),
        point.yhat,
        point.yhat_lower,
        point.yhat_upper
    );
}
