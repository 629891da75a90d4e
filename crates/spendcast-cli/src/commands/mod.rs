//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `forecast` - Daily spending forecast
//! - `summary` - Category and monthly spending summary
//! - `config` - Effective configuration display

pub mod config;
pub mod forecast;
pub mod summary;

// Re-export command functions for main.rs
pub use config::*;
pub use forecast::*;
pub use summary::*;

use std::path::Path;

use anyhow::{Context, Result};
use spendcast_core::{load_transactions, ForecastConfig, ForecastPipeline, RawTransaction};

/// Build a pipeline from the layered configuration
pub fn open_pipeline(config_path: Option<&Path>) -> Result<ForecastPipeline> {
    let config = ForecastConfig::load(config_path).context("Failed to load configuration")?;
    ForecastPipeline::new(config).context("Invalid configuration")
}

/// Read a transaction export from disk
pub fn read_transactions(file: &Path) -> Result<Vec<RawTransaction>> {
    let transactions = load_transactions(file)
        .with_context(|| format!("Failed to read transactions from {}", file.display()))?;
    tracing::debug!(
        file = %file.display(),
        count = transactions.len(),
        "Loaded transactions"
    );
    Ok(transactions)
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
