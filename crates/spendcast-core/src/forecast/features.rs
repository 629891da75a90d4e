//! Design matrix for the trend + seasonality model
//!
//! Column layout: `[offset m, slope k, changepoint deltas δ_j..., Fourier β...]`.

use std::f64::consts::PI;

use chrono::NaiveDate;

use crate::config::ModelConfig;

/// Prior scale for the base offset and slope (scaled units)
const BASE_PRIOR_SCALE: f64 = 5.0;

/// A periodic component expressed as a Fourier series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seasonality {
    pub name: &'static str,
    pub period_days: f64,
    pub fourier_order: usize,
}

impl Seasonality {
    pub const DAILY: Seasonality = Seasonality {
        name: "daily",
        period_days: 1.0,
        fourier_order: 4,
    };
    pub const WEEKLY: Seasonality = Seasonality {
        name: "weekly",
        period_days: 7.0,
        fourier_order: 3,
    };
    pub const YEARLY: Seasonality = Seasonality {
        name: "yearly",
        period_days: 365.25,
        fourier_order: 10,
    };

    /// Seasonalities switched on in `config`
    pub fn enabled(config: &ModelConfig) -> Vec<Seasonality> {
        [
            (config.daily_seasonality, Self::DAILY),
            (config.weekly_seasonality, Self::WEEKLY),
            (config.yearly_seasonality, Self::YEARLY),
        ]
        .into_iter()
        .filter_map(|(on, s)| on.then_some(s))
        .collect()
    }

    /// Append `[sin, cos]` pairs for orders 1..=N at `epoch_days`
    fn push_features(&self, epoch_days: f64, row: &mut Vec<f64>) {
        for order in 1..=self.fourier_order {
            let angle = 2.0 * PI * order as f64 * epoch_days / self.period_days;
            row.push(angle.sin());
            row.push(angle.cos());
        }
    }
}

/// Indices of potential changepoints over the first `changepoint_range` of `n` days
///
/// Changepoints are spread uniformly; the first day is never one.
pub fn changepoint_indices(n: usize, config: &ModelConfig) -> Vec<usize> {
    let hist_size = (n as f64 * config.changepoint_range).floor() as usize;
    let count = config.n_changepoints.min(hist_size.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }

    let last = (hist_size - 1) as f64;
    (1..=count)
        .map(|i| (i as f64 * last / count as f64).round() as usize)
        .collect()
}

/// Everything needed to turn a date into a model row
#[derive(Debug, Clone)]
pub struct Design {
    start: NaiveDate,
    span_days: f64,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
}

impl Design {
    /// `span_days` must be positive
    pub fn new(
        start: NaiveDate,
        span_days: f64,
        changepoints: Vec<f64>,
        seasonalities: Vec<Seasonality>,
    ) -> Self {
        Self {
            start,
            span_days,
            changepoints,
            seasonalities,
        }
    }

    pub fn n_changepoints(&self) -> usize {
        self.changepoints.len()
    }

    pub fn n_features(&self) -> usize {
        2 + self.changepoints.len()
            + self
                .seasonalities
                .iter()
                .map(|s| 2 * s.fourier_order)
                .sum::<usize>()
    }

    /// Time scaled so the history spans [0, 1]
    pub fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }

    /// Length of one day in scaled time
    pub fn day_step(&self) -> f64 {
        1.0 / self.span_days
    }

    pub fn row(&self, date: NaiveDate) -> Vec<f64> {
        let t = self.scaled_time(date);
        let mut row = Vec::with_capacity(self.n_features());

        row.push(1.0);
        row.push(t);
        for &s in &self.changepoints {
            row.push((t - s).max(0.0));
        }

        let epoch_days = epoch_days(date);
        for seasonality in &self.seasonalities {
            seasonality.push_features(epoch_days, &mut row);
        }

        row
    }

    /// Prior precision (1 / scale²) of every column
    pub fn prior_precisions(&self, config: &ModelConfig) -> Vec<f64> {
        let mut precisions = Vec::with_capacity(self.n_features());
        let base = 1.0 / (BASE_PRIOR_SCALE * BASE_PRIOR_SCALE);
        precisions.push(base);
        precisions.push(base);

        let cp = 1.0 / (config.changepoint_prior_scale * config.changepoint_prior_scale);
        precisions.extend(std::iter::repeat(cp).take(self.changepoints.len()));

        let seasonal = 1.0 / (config.seasonality_prior_scale * config.seasonality_prior_scale);
        let seasonal_columns = self.n_features() - precisions.len();
        precisions.extend(std::iter::repeat(seasonal).take(seasonal_columns));

        precisions
    }

    /// Slice of a coefficient vector holding the changepoint deltas
    pub fn deltas<'a>(&self, coefficients: &'a [f64]) -> &'a [f64] {
        &coefficients[2..2 + self.changepoints.len()]
    }
}

/// Days since 1970-01-01, the time base for Fourier terms
fn epoch_days(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_changepoint_indices() {
        let config = ModelConfig::default();
        // 10 days -> first 8 eligible -> 7 changepoints at 1..=7
        assert_eq!(changepoint_indices(10, &config), vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(changepoint_indices(2, &config).is_empty());

        let idx = changepoint_indices(365, &config);
        assert_eq!(idx.len(), 25);
        assert!(idx.windows(2).all(|w| w[0] < w[1]));
        assert!(*idx.last().unwrap() < 292);
    }

    #[test]
    fn test_row_layout() {
        let config = ModelConfig {
            weekly_seasonality: true,
            ..Default::default()
        };
        let design = Design::new(
            date(2024, 1, 1),
            10.0,
            vec![0.5],
            Seasonality::enabled(&config),
        );
        // 2 base + 1 changepoint + daily 8 + weekly 6
        assert_eq!(design.n_features(), 17);

        let row = design.row(date(2024, 1, 9));
        assert_eq!(row.len(), 17);
        assert_eq!(row[0], 1.0);
        assert!((row[1] - 0.8).abs() < 1e-12);
        assert!((row[2] - 0.3).abs() < 1e-12);
        // Daily terms on whole days: sin ~ 0, cos ~ 1
        assert!(row[3].abs() < 1e-6);
        assert!((row[4] - 1.0).abs() < 1e-6);

        let before = design.row(date(2024, 1, 3));
        assert_eq!(before[2], 0.0);
    }

    #[test]
    fn test_weekly_terms_repeat_every_week() {
        let config = ModelConfig {
            daily_seasonality: false,
            weekly_seasonality: true,
            ..Default::default()
        };
        let design = Design::new(date(2024, 1, 1), 30.0, vec![], Seasonality::enabled(&config));
        let a = design.row(date(2024, 1, 3));
        let b = design.row(date(2024, 1, 10));
        for i in 2..a.len() {
            assert!((a[i] - b[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_prior_precisions() {
        let config = ModelConfig::default();
        let design = Design::new(date(2024, 1, 1), 9.0, vec![0.1, 0.2], vec![Seasonality::DAILY]);
        let p = design.prior_precisions(&config);
        assert_eq!(p.len(), design.n_features());
        assert!((p[2] - 400.0).abs() < 1e-9);
        assert!((p[4] - 0.01).abs() < 1e-12);
    }
}
