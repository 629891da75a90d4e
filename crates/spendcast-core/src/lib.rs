//! Spendcast Core Library
//!
//! Expense forecasting for already-fetched bank transactions:
//! - Currency normalization to a single display currency
//! - Withdrawal extraction from loosely-typed provider records
//! - Dense daily aggregation, outlier capping and log transform
//! - Trend + seasonality forecast model with uncertainty intervals
//! - Categorized spending summaries
//! - JSON/CSV transaction file loading and layered TOML configuration

pub mod config;
pub mod currency;
pub mod error;
pub mod extract;
pub mod forecast;
pub mod import;
pub mod models;
pub mod pipeline;
pub mod series;
pub mod summary;

pub use config::{ExtractConfig, ForecastConfig, ModelConfig, PreprocessConfig};
pub use currency::CurrencyNormalizer;
pub use error::{Error, Result};
pub use extract::TransactionExtractor;
pub use forecast::{EngineOutput, FittedModel, ForecastEngine, Seasonality};
pub use import::load_transactions;
pub use models::{
    DailySeries, DailyTotal, ExpenseRecord, ForecastPoint, ForecastResult, HistoricalPoint,
    RawAmount, RawTransaction, SpendingSummary, TransformedSeries,
};
pub use pipeline::ForecastPipeline;
pub use series::LogTransform;
