//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Spendcast - Forecast your daily spending
#[derive(Parser)]
#[command(name = "spendcast")]
#[command(about = "Expense forecasting from bank transaction exports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (TOML) overriding the built-in defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Forecast daily spending from a transaction export
    Forecast {
        /// Transaction export (.json or .csv)
        #[arg(short, long)]
        file: PathBuf,

        /// Days to forecast (defaults to the configured horizon)
        #[arg(long)]
        horizon: Option<u32>,

        /// Only print days after the last observed day
        #[arg(long)]
        future_only: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Summarize spending by category and month
    Summary {
        /// Transaction export (.json or .csv)
        #[arg(short, long)]
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the effective configuration
    Config {
        /// Print the user config override path instead
        #[arg(long)]
        path: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    Text,
    /// Pretty-printed JSON
    Json,
}
