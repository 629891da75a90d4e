//! Spendcast CLI - Expense forecasting
//!
//! Usage:
//!   spendcast forecast --file tx.json     Forecast the next days of spending
//!   spendcast summary --file tx.csv       Spending by category and month
//!   spendcast config                      Show the effective configuration

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Forecast {
            file,
            horizon,
            future_only,
            format,
        } => commands::cmd_forecast(config_path, &file, horizon, future_only, format),
        Commands::Summary { file, format } => commands::cmd_summary(config_path, &file, format),
        Commands::Config { path } => commands::cmd_config(config_path, path),
    }
}
