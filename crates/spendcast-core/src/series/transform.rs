//! Log transform for heavy-tailed daily totals

use crate::models::{DailySeries, ForecastPoint, TransformedSeries};

/// `forward(x) = ln(1 + x)`, `inverse(y) = exp(y) - 1`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransform;

impl LogTransform {
    pub fn forward(x: f64) -> f64 {
        x.ln_1p()
    }

    pub fn inverse(y: f64) -> f64 {
        y.exp_m1()
    }

    pub fn forward_series(series: &DailySeries) -> TransformedSeries {
        TransformedSeries::from_log_space(series.map_values(Self::forward))
    }

    pub fn inverse_series(series: &TransformedSeries) -> DailySeries {
        series.series().map_values(Self::inverse)
    }

    /// Map a log-space prediction back to amounts
    ///
    /// Expenses cannot be negative, so reconstructed values are clamped at 0
    /// and the interval is widened if needed to contain the point.
    pub fn inverse_point(point: &ForecastPoint) -> ForecastPoint {
        let p = point.map(|y| Self::inverse(y).max(0.0));
        ForecastPoint {
            ds: p.ds,
            yhat: p.yhat,
            yhat_lower: p.yhat_lower.min(p.yhat),
            yhat_upper: p.yhat_upper.max(p.yhat),
        }
    }
}
