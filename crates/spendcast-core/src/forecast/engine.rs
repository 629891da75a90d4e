//! Trend + seasonality forecast engine
//!
//! The model is additive: a piecewise-linear trend with automatically placed
//! changepoints plus optional Fourier seasonalities. It is fit by MAP
//! estimation under Gaussian priors, which reduces to a ridge system solved
//! in closed form, so fitting is deterministic.
//!
//! Uncertainty combines observation noise (residual variance) with the
//! variance of future trend changes, which grows with the distance past the
//! last observation.

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::models::{ForecastPoint, TransformedSeries};

use super::features::{changepoint_indices, Design, Seasonality};
use super::linalg::ridge_regression;
use super::uncertainty::{normal_quantile, trend_change_variance};

/// Floor for the noise variance that scales the priors (scaled units)
const MIN_NOISE_VARIANCE: f64 = 1e-4;

/// Floor for the observation noise behind the intervals (scaled units)
///
/// A near-exact fit (e.g. two days of history) must still report that a
/// single day can move by about a tenth of the largest observation.
const MIN_INTERVAL_VARIANCE: f64 = 1e-2;

/// Engine output, in the same (log) space as the input series
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    /// In-sample fit, one point per observed day
    pub fitted_historical: Vec<ForecastPoint>,
    /// One point per future day
    pub forecast_future: Vec<ForecastPoint>,
}

impl EngineOutput {
    /// Historical fit followed by the future forecast
    pub fn into_points(self) -> Vec<ForecastPoint> {
        let mut points = self.fitted_historical;
        points.extend(self.forecast_future);
        points
    }
}

/// A fitted model able to predict any day
#[derive(Debug, Clone)]
pub struct FittedModel {
    design: Design,
    coefficients: Vec<f64>,
    y_scale: f64,
    residual_variance: f64,
    change_rate: f64,
    change_scale: f64,
    z: f64,
    last_date: NaiveDate,
}

impl FittedModel {
    /// Point estimate (input space) for `date`
    pub fn predict_value(&self, date: NaiveDate) -> f64 {
        let row = self.design.row(date);
        let scaled: f64 = row
            .iter()
            .zip(&self.coefficients)
            .map(|(x, b)| x * b)
            .sum();
        scaled * self.y_scale
    }

    /// Point estimate with its uncertainty interval
    pub fn predict(&self, date: NaiveDate) -> ForecastPoint {
        let yhat = self.predict_value(date);

        let steps = (date - self.last_date).num_days().max(0) as u32;
        let trend_variance = trend_change_variance(
            steps,
            self.change_rate,
            self.change_scale,
            self.design.day_step(),
        );
        let half_width = self.z * (self.residual_variance + trend_variance).sqrt() * self.y_scale;

        ForecastPoint {
            ds: date,
            yhat,
            yhat_lower: yhat - half_width,
            yhat_upper: yhat + half_width,
        }
    }

    /// Trend slope per day after the last changepoint (input space)
    pub fn final_slope(&self) -> f64 {
        let k = self.coefficients[1];
        let deltas: f64 = self.design.deltas(&self.coefficients).iter().sum();
        (k + deltas) * self.y_scale * self.design.day_step()
    }

    /// Residual standard deviation (input space)
    pub fn residual_sigma(&self) -> f64 {
        self.residual_variance.sqrt() * self.y_scale
    }

    pub fn n_changepoints(&self) -> usize {
        self.design.n_changepoints()
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }
}

/// Fits the trend/seasonality model and produces forecasts
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: ModelConfig,
}

impl ForecastEngine {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fit the model to a log-space daily series
    pub fn fit(&self, series: &TransformedSeries) -> Result<FittedModel> {
        self.config.validate()?;

        let series = series.series();
        let required = self.config.min_history_days.max(2);
        if series.len() < required {
            return Err(Error::InsufficientHistory {
                days: series.len(),
                required,
            });
        }

        let values = series.values();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::ModelFit("Series contains non-finite values".into()));
        }

        let dates = series.dates();
        let (start, last_date) = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Err(Error::InsufficientHistory {
                    days: 0,
                    required,
                })
            }
        };
        let span_days = (last_date - start).num_days() as f64;

        let y_scale = match values.iter().fold(0.0_f64, |m, v| m.max(v.abs())) {
            m if m > 0.0 => m,
            _ => 1.0,
        };
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let changepoints = changepoint_indices(dates.len(), &self.config)
            .into_iter()
            .map(|i| (dates[i] - start).num_days() as f64 / span_days)
            .collect();
        let design = Design::new(
            start,
            span_days,
            changepoints,
            Seasonality::enabled(&self.config),
        );

        let rows: Vec<Vec<f64>> = dates.iter().map(|d| design.row(*d)).collect();

        // Priors are relative to the noise level, estimated from a plain line
        let noise_variance = linear_residual_variance(&rows, &y).max(MIN_NOISE_VARIANCE);
        let penalties: Vec<f64> = design
            .prior_precisions(&self.config)
            .into_iter()
            .map(|p| p * noise_variance)
            .collect();

        let coefficients = ridge_regression(&rows, &y, &penalties)?;

        let sse: f64 = rows
            .iter()
            .zip(&y)
            .map(|(row, target)| {
                let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
                (target - fitted).powi(2)
            })
            .sum();
        if !sse.is_finite() {
            return Err(Error::ModelFit("Residual variance is not finite".into()));
        }

        // Offset and slope are always estimated
        let dof = y.len().saturating_sub(2).max(1) as f64;
        let residual_variance = (sse / dof).max(MIN_INTERVAL_VARIANCE);

        let deltas = design.deltas(&coefficients);
        let change_scale = if deltas.is_empty() {
            0.0
        } else {
            deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64 + 1e-8
        };
        let change_rate = (design.n_changepoints() as f64 * design.day_step()).min(1.0);
        let z = normal_quantile((1.0 + self.config.interval_width) / 2.0);

        debug!(
            days = dates.len(),
            changepoints = design.n_changepoints(),
            features = design.n_features(),
            residual_variance,
            "Fitted forecast model"
        );

        Ok(FittedModel {
            design,
            coefficients,
            y_scale,
            residual_variance,
            change_rate,
            change_scale,
            z,
            last_date,
        })
    }

    /// Fit and predict every observed day plus `horizon_days` future days
    pub fn fit_and_forecast(
        &self,
        series: &TransformedSeries,
        horizon_days: u32,
    ) -> Result<EngineOutput> {
        let model = self.fit(series)?;

        let fitted_historical = series
            .series()
            .dates()
            .into_iter()
            .map(|d| model.predict(d))
            .collect();

        let forecast_future = (1..=horizon_days)
            .map(|h| model.predict(model.last_date + Duration::days(h as i64)))
            .collect::<Vec<_>>();

        if forecast_future
            .iter()
            .any(|p| !(p.yhat.is_finite() && p.yhat_lower.is_finite() && p.yhat_upper.is_finite()))
        {
            return Err(Error::ModelFit("Forecast produced non-finite values".into()));
        }

        Ok(EngineOutput {
            fitted_historical,
            forecast_future,
        })
    }
}

/// Residual variance of an ordinary least-squares line through (t, y)
///
/// Uses the offset/slope columns of the design rows.
fn linear_residual_variance(rows: &[Vec<f64>], y: &[f64]) -> f64 {
    let n = y.len() as f64;
    let t: Vec<f64> = rows.iter().map(|r| r[1]).collect();
    let t_mean = t.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let sxx: f64 = t.iter().map(|ti| (ti - t_mean).powi(2)).sum();
    let sxy: f64 = t.iter().zip(y).map(|(ti, yi)| (ti - t_mean) * (yi - y_mean)).sum();
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = y_mean - slope * t_mean;

    t.iter()
        .zip(y)
        .map(|(ti, yi)| (yi - intercept - slope * ti).powi(2))
        .sum::<f64>()
        / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailySeries;
    use chrono::Datelike;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn log_series(values: &[f64]) -> TransformedSeries {
        TransformedSeries::from_log_space(DailySeries::from_values(start(), values))
    }

    fn upward_trend() -> TransformedSeries {
        let values: Vec<f64> = (0..10)
            .map(|i| 2.0 + 0.15 * i as f64 + if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        log_series(&values)
    }

    #[test]
    fn test_insufficient_history() {
        let engine = ForecastEngine::default();
        let err = engine.fit(&log_series(&[1.0])).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientHistory {
                days: 1,
                required: 2
            }
        ));

        let engine = ForecastEngine::new(ModelConfig {
            min_history_days: 14,
            ..Default::default()
        });
        let err = engine.fit(&log_series(&[1.0; 10])).unwrap_err();
        assert!(matches!(err, Error::InsufficientHistory { days: 10, .. }));
    }

    #[test]
    fn test_two_days_is_enough() {
        let output = ForecastEngine::default()
            .fit_and_forecast(&log_series(&[1.0, 2.0]), 3)
            .unwrap();
        assert_eq!(output.fitted_historical.len(), 2);
        assert_eq!(output.forecast_future.len(), 3);
    }

    #[test]
    fn test_exact_fit_keeps_a_real_interval() {
        // Two points are fit exactly and leave no room for changepoints
        let series = log_series(&[1.0, 2.0]);
        let engine = ForecastEngine::default();
        let model = engine.fit(&series).unwrap();
        assert_eq!(model.n_changepoints(), 0);
        // At least a tenth of the largest value (2.0)
        assert!(model.residual_sigma() >= 0.2 - 1e-12);

        let output = engine.fit_and_forecast(&series, 7).unwrap();
        for point in output.forecast_future {
            // 2 * z(0.9) * 0.2 = 0.5126
            assert!(point.interval_width() > 0.5, "{:?}", point);
        }
    }

    #[test]
    fn test_noisy_residuals_use_degrees_of_freedom() {
        let values = [1.0, 3.0, 1.0, 3.0, 1.0, 3.0];
        let engine = ForecastEngine::new(ModelConfig {
            n_changepoints: 0,
            ..Default::default()
        });
        let model = engine.fit(&log_series(&values)).unwrap();
        // Alternating +-1 around the trend line; SSE / (n - 2) exceeds SSE / n
        let naive_sigma = (model_sse(&model, &values) / values.len() as f64).sqrt();
        assert!(model.residual_sigma() > naive_sigma);
    }

    fn model_sse(model: &FittedModel, values: &[f64]) -> f64 {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (v - model.predict_value(start() + Duration::days(i as i64))).powi(2))
            .sum()
    }

    #[test]
    fn test_non_finite_input_is_fit_error() {
        let err = ForecastEngine::default()
            .fit(&log_series(&[1.0, f64::NAN, 2.0]))
            .unwrap_err();
        assert!(matches!(err, Error::ModelFit(_)));
    }

    #[test]
    fn test_output_covers_history_and_horizon() {
        let series = upward_trend();
        let output = ForecastEngine::default()
            .fit_and_forecast(&series, 7)
            .unwrap();

        let fitted_dates: Vec<NaiveDate> = output.fitted_historical.iter().map(|p| p.ds).collect();
        assert_eq!(fitted_dates, series.series().dates());

        let last = series.series().last_date().unwrap();
        for (h, point) in output.forecast_future.iter().enumerate() {
            assert_eq!(point.ds, last + Duration::days(h as i64 + 1));
        }
        assert_eq!(output.into_points().len(), 17);
    }

    #[test]
    fn test_upward_trend_continues_with_widening_interval() {
        let output = ForecastEngine::default()
            .fit_and_forecast(&upward_trend(), 7)
            .unwrap();

        let last_fit = output.fitted_historical.last().unwrap().yhat;
        let mut previous_yhat = last_fit;
        let mut previous_width = 0.0;
        for point in &output.forecast_future {
            assert!(point.yhat > previous_yhat, "forecast should keep rising");
            assert!(
                point.interval_width() > previous_width,
                "interval should widen with the horizon"
            );
            previous_yhat = point.yhat;
            previous_width = point.interval_width();
        }
    }

    #[test]
    fn test_linear_series_is_recovered() {
        let values: Vec<f64> = (0..30).map(|i| 1.0 + 0.05 * i as f64).collect();
        let engine = ForecastEngine::default();
        let model = engine.fit(&log_series(&values)).unwrap();

        assert!((model.final_slope() - 0.05).abs() < 1e-3);
        let next = model.predict_value(start() + Duration::days(30));
        assert!((next - 2.5).abs() < 1e-2);
    }

    #[test]
    fn test_weekly_pattern_is_learned() {
        let values: Vec<f64> = (0..56)
            .map(|i| {
                let day = start() + Duration::days(i);
                if day.weekday().number_from_monday() >= 6 {
                    3.0
                } else {
                    2.0
                }
            })
            .collect();
        let engine = ForecastEngine::new(ModelConfig {
            daily_seasonality: false,
            weekly_seasonality: true,
            ..Default::default()
        });
        let output = engine.fit_and_forecast(&log_series(&values), 7).unwrap();

        for (point, actual) in output.fitted_historical.iter().zip(&values) {
            assert!((point.yhat - actual).abs() < 0.1, "{:?} vs {}", point, actual);
        }
        for point in &output.forecast_future {
            let expected = if point.ds.weekday().number_from_monday() >= 6 {
                3.0
            } else {
                2.0
            };
            assert!((point.yhat - expected).abs() < 0.2);
        }
    }

    #[test]
    fn test_interval_contains_point() {
        let values = [0.0, 3.2, 0.0, 4.1, 2.2, 0.0, 0.0, 5.0, 3.3, 1.0, 0.0, 2.9];
        let output = ForecastEngine::default()
            .fit_and_forecast(&log_series(&values), 7)
            .unwrap();
        for point in output.into_points() {
            assert!(point.yhat_lower <= point.yhat && point.yhat <= point.yhat_upper);
        }
    }

    #[test]
    fn test_constant_zero_series() {
        let output = ForecastEngine::default()
            .fit_and_forecast(&log_series(&[0.0; 5]), 7)
            .unwrap();
        for point in output.into_points() {
            assert!(point.yhat.abs() < 1e-9);
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let engine = ForecastEngine::default();
        let a = engine.fit_and_forecast(&upward_trend(), 7).unwrap();
        let b = engine.fit_and_forecast(&upward_trend(), 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let engine = ForecastEngine::new(ModelConfig {
            interval_width: 1.5,
            ..Default::default()
        });
        assert!(matches!(
            engine.fit(&upward_trend()).unwrap_err(),
            Error::InvalidConfig(_)
        ));
    }
}
