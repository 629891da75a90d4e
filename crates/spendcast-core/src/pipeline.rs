//! Forecast pipeline - wires the stages together
//!
//! raw transactions → expenses → daily totals → capped → log space → model →
//! reconstructed forecast, with the observed (uncapped) totals alongside.

use tracing::info;

use crate::config::ForecastConfig;
use crate::currency::CurrencyNormalizer;
use crate::error::Result;
use crate::extract::TransactionExtractor;
use crate::forecast::ForecastEngine;
use crate::models::{
    ExpenseRecord, ForecastResult, HistoricalPoint, RawTransaction, SpendingSummary,
};
use crate::series::{aggregate_daily, cap_outliers, LogTransform};
use crate::summary::summarize_expenses;

/// Immutable pipeline owning its configuration and currency table
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    config: ForecastConfig,
    normalizer: CurrencyNormalizer,
}

impl Default for ForecastPipeline {
    fn default() -> Self {
        let config = ForecastConfig::default();
        let normalizer = config.normalizer();
        Self { config, normalizer }
    }
}

impl ForecastPipeline {
    /// Create a pipeline, rejecting invalid configuration
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = config.normalizer();
        Ok(Self { config, normalizer })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Qualifying withdrawals in the display currency
    pub fn extract(&self, transactions: &[RawTransaction]) -> Vec<ExpenseRecord> {
        TransactionExtractor::new(&self.normalizer, &self.config.extract).extract(transactions)
    }

    /// Forecast with the configured horizon
    pub fn run(&self, transactions: &[RawTransaction]) -> Result<ForecastResult> {
        self.run_with_horizon(transactions, self.config.model.horizon_days)
    }

    /// Forecast `horizon_days` days past the last observed day
    pub fn run_with_horizon(
        &self,
        transactions: &[RawTransaction],
        horizon_days: u32,
    ) -> Result<ForecastResult> {
        let expenses = self.extract(transactions);
        let daily = aggregate_daily(&expenses)?;

        let historical: Vec<HistoricalPoint> = daily
            .points()
            .iter()
            .map(|p| HistoricalPoint {
                ds: p.date,
                y_original: p.total,
            })
            .collect();

        let capped = cap_outliers(&daily, self.config.preprocess.cap_quantile)?;
        let transformed = LogTransform::forward_series(&capped);

        let output = ForecastEngine::new(self.config.model.clone())
            .fit_and_forecast(&transformed, horizon_days)?;

        let forecast = output
            .into_points()
            .iter()
            .map(LogTransform::inverse_point)
            .collect();

        info!(
            days = historical.len(),
            horizon = horizon_days,
            "Forecast complete"
        );

        Ok(ForecastResult {
            historical,
            forecast,
        })
    }

    /// Category and monthly breakdown of the qualifying withdrawals
    pub fn summarize(&self, transactions: &[RawTransaction]) -> SpendingSummary {
        summarize_expenses(&self.extract(transactions))
    }
}
