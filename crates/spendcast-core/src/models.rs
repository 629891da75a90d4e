//! Data models for Spendcast

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ========== Raw Provider Records ==========

/// A monetary value as the provider sent it
///
/// Aggregators are not consistent about sending numbers vs strings, so both
/// are accepted and parsing is deferred to extraction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    /// Parse to a finite number, handling currency symbols and commas
    pub fn parse(&self) -> Result<f64> {
        let value = match self {
            RawAmount::Number(n) => *n,
            RawAmount::Text(s) => {
                let cleaned: String = s
                    .trim()
                    .replace(['$', ',', ' '], "")
                    .replace('(', "-")
                    .replace(')', "");
                cleaned
                    .parse::<f64>()
                    .map_err(|_| Error::MalformedRecord(format!("Unable to parse amount: {}", s)))?
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(Error::MalformedRecord(format!(
                "Amount is not finite: {}",
                value
            )))
        }
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

/// Provider-specific extra fields (Salt Edge nests these under `extra`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionExtra {
    #[serde(default, alias = "originalAmount")]
    pub original_amount: Option<RawAmount>,
    #[serde(default, alias = "originalCurrencyCode")]
    pub original_currency_code: Option<String>,
    #[serde(default, alias = "postingDate")]
    pub posting_date: Option<String>,
}

/// A transaction as fetched from the account-aggregation provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub id: Option<String>,
    /// Signed amount in the settlement currency (negative = withdrawal)
    #[serde(default)]
    pub amount: Option<RawAmount>,
    /// Settlement currency of `amount`
    #[serde(default, alias = "currencyCode")]
    pub currency_code: Option<String>,
    #[serde(default, alias = "madeOn")]
    pub made_on: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "postingDate")]
    pub posting_date: Option<String>,
    #[serde(default, alias = "originalAmount")]
    pub original_amount: Option<RawAmount>,
    #[serde(default, alias = "originalCurrencyCode")]
    pub original_currency_code: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extra: TransactionExtra,
}

impl RawTransaction {
    /// Create a record with just an amount and a date (mostly for tests and CSV rows)
    pub fn new(amount: impl Into<RawAmount>, date: impl Into<String>) -> Self {
        Self {
            amount: Some(amount.into()),
            made_on: Some(date.into()),
            ..Default::default()
        }
    }

    /// Attach an original-currency annotation
    pub fn with_original(mut self, amount: impl Into<RawAmount>, currency_code: &str) -> Self {
        self.original_amount = Some(amount.into());
        self.original_currency_code = Some(currency_code.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// First populated date field, in priority order
    pub fn date_field(&self) -> Option<&str> {
        [
            self.made_on.as_deref(),
            self.date.as_deref(),
            self.posting_date.as_deref(),
            self.extra.posting_date.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
    }

    /// Original-currency annotation, top-level fields first, then `extra`
    pub fn original(&self) -> Option<(&RawAmount, &str)> {
        let amount = self
            .original_amount
            .as_ref()
            .or(self.extra.original_amount.as_ref())?;
        let code = self
            .original_currency_code
            .as_deref()
            .or(self.extra.original_currency_code.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        Some((amount, code))
    }
}

// ========== Expenses and Series ==========

/// A single withdrawal, normalized to the display currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    /// Non-negative amount in the display currency
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ExpenseRecord {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self {
            date,
            amount,
            category: None,
        }
    }
}

/// One day of a daily series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
}

/// Dense daily series: one entry per calendar day, ascending, no gaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DailyTotal>", into = "Vec<DailyTotal>")]
pub struct DailySeries {
    points: Vec<DailyTotal>,
}

impl DailySeries {
    /// Build a series of consecutive days starting at `start`
    pub fn from_values(start: NaiveDate, values: &[f64]) -> Self {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &total)| DailyTotal {
                date: start + Duration::days(i as i64),
                total,
            })
            .collect();
        Self { points }
    }

    /// Build from points that already form a dense ascending grid
    pub fn from_points(points: Vec<DailyTotal>) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[1].date != pair[0].date + Duration::days(1) {
                return Err(Error::InvalidData(format!(
                    "Daily series is not a dense ascending grid at {} -> {}",
                    pair[0].date, pair[1].date
                )));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[DailyTotal] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.total).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Apply `f` to every total, keeping dates
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| DailyTotal {
                    date: p.date,
                    total: f(p.total),
                })
                .collect(),
        }
    }
}

impl TryFrom<Vec<DailyTotal>> for DailySeries {
    type Error = Error;

    fn try_from(points: Vec<DailyTotal>) -> Result<Self> {
        Self::from_points(points)
    }
}

impl From<DailySeries> for Vec<DailyTotal> {
    fn from(series: DailySeries) -> Self {
        series.points
    }
}

/// A daily series whose values live in log space
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedSeries(DailySeries);

impl TransformedSeries {
    /// Wrap a series whose values are already log-transformed
    pub fn from_log_space(series: DailySeries) -> Self {
        Self(series)
    }

    pub fn series(&self) -> &DailySeries {
        &self.0
    }
}

// ========== Forecast Output ==========

/// Prediction for one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

impl ForecastPoint {
    /// Apply a monotonic map to all three values
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            ds: self.ds,
            yhat: f(self.yhat),
            yhat_lower: f(self.yhat_lower),
            yhat_upper: f(self.yhat_upper),
        }
    }

    pub fn interval_width(&self) -> f64 {
        self.yhat_upper - self.yhat_lower
    }
}

/// Observed daily total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub ds: NaiveDate,
    pub y_original: f64,
}

/// Historical series plus in-sample fit and future forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub historical: Vec<HistoricalPoint>,
    pub forecast: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Forecast points after the last observed day
    pub fn future(&self) -> &[ForecastPoint] {
        match self.historical.last() {
            Some(last) => {
                let start = self.forecast.partition_point(|p| p.ds <= last.ds);
                &self.forecast[start..]
            }
            None => &self.forecast,
        }
    }

    /// In-sample fit over the observed range
    pub fn fitted(&self) -> &[ForecastPoint] {
        let future_len = self.future().len();
        &self.forecast[..self.forecast.len() - future_len]
    }

    /// Same result with the in-sample fit dropped
    pub fn future_only(&self) -> Self {
        Self {
            historical: self.historical.clone(),
            forecast: self.future().to_vec(),
        }
    }
}

// ========== Spending Summary ==========

/// Report period info
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub from: String,
    pub to: String,
}

/// A spending category in a summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpending {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
    pub transaction_count: i64,
}

/// Spending with no provider category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UncategorizedSummary {
    pub amount: f64,
    pub percentage: f64,
    pub transaction_count: i64,
}

/// Spending total for a calendar month ("YYYY-MM")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySpending {
    pub month: String,
    pub amount: f64,
    pub transaction_count: i64,
}

/// Categorized spending summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<ReportPeriod>,
    pub total: f64,
    pub categories: Vec<CategorySpending>,
    pub uncategorized: UncategorizedSummary,
    pub monthly: Vec<MonthlySpending>,
}

impl SpendingSummary {
    /// Largest category by amount
    pub fn highest_category(&self) -> Option<&CategorySpending> {
        self.categories.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_raw_amount_parse() {
        assert_eq!(RawAmount::Number(-12.5).parse().unwrap(), -12.5);
        assert_eq!(RawAmount::Text("$1,234.56".into()).parse().unwrap(), 1234.56);
        assert_eq!(RawAmount::Text("(100.00)".into()).parse().unwrap(), -100.0);
        assert!(RawAmount::Text("abc".into()).parse().is_err());
        assert!(RawAmount::Number(f64::NAN).parse().is_err());
    }

    #[test]
    fn test_raw_transaction_deserialize_salt_edge_shape() {
        let json = r#"{
            "id": "tx-1",
            "amount": -108.0,
            "currency_code": "USD",
            "made_on": "2024-01-05",
            "category": "shopping",
            "extra": {"original_amount": 100, "original_currency_code": "EUR"}
        }"#;
        let tx: RawTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.date_field(), Some("2024-01-05"));
        let (amount, code) = tx.original().unwrap();
        assert_eq!(amount.parse().unwrap(), 100.0);
        assert_eq!(code, "EUR");
    }

    #[test]
    fn test_raw_transaction_camel_case_aliases() {
        let json = r#"{"amount": "-5.00", "date": "2024-02-01",
            "originalAmount": "4.00", "originalCurrencyCode": "GBP"}"#;
        let tx: RawTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.amount, Some(RawAmount::Text("-5.00".into())));
        assert_eq!(tx.original().unwrap().1, "GBP");
    }

    #[test]
    fn test_date_field_priority() {
        let tx = RawTransaction {
            made_on: Some("  ".into()),
            date: Some("2024-03-02".into()),
            posting_date: Some("2024-03-04".into()),
            ..Default::default()
        };
        assert_eq!(tx.date_field(), Some("2024-03-02"));

        let tx = RawTransaction {
            extra: TransactionExtra {
                posting_date: Some("2024-03-05".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(tx.date_field(), Some("2024-03-05"));
        assert_eq!(RawTransaction::default().date_field(), None);
    }

    #[test]
    fn test_original_requires_code() {
        let tx = RawTransaction {
            original_amount: Some(RawAmount::Number(10.0)),
            original_currency_code: Some("".into()),
            ..Default::default()
        };
        assert!(tx.original().is_none());
    }

    #[test]
    fn test_daily_series_from_points_rejects_gaps() {
        let points = vec![
            DailyTotal {
                date: date(2024, 1, 1),
                total: 1.0,
            },
            DailyTotal {
                date: date(2024, 1, 3),
                total: 1.0,
            },
        ];
        assert!(DailySeries::from_points(points).is_err());
    }

    #[test]
    fn test_daily_series_deserialize_checks_grid() {
        let gapped = r#"[{"date": "2024-01-01", "total": 1.0}, {"date": "2024-01-03", "total": 2.0}]"#;
        assert!(serde_json::from_str::<DailySeries>(gapped).is_err());

        let unordered = r#"[{"date": "2024-01-02", "total": 1.0}, {"date": "2024-01-01", "total": 2.0}]"#;
        assert!(serde_json::from_str::<DailySeries>(unordered).is_err());

        let series = DailySeries::from_values(date(2024, 1, 1), &[1.0, 0.0, 2.5]);
        let json = serde_json::to_string(&series).unwrap();
        let back: DailySeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back, series);
    }

    #[test]
    fn test_forecast_result_future_slice() {
        let historical = vec![
            HistoricalPoint {
                ds: date(2024, 1, 1),
                y_original: 5.0,
            },
            HistoricalPoint {
                ds: date(2024, 1, 2),
                y_original: 7.0,
            },
        ];
        let forecast = (1..=5)
            .map(|d| ForecastPoint {
                ds: date(2024, 1, d),
                yhat: 1.0,
                yhat_lower: 0.5,
                yhat_upper: 1.5,
            })
            .collect();
        let result = ForecastResult {
            historical,
            forecast,
        };

        assert_eq!(result.future().len(), 3);
        assert_eq!(result.future()[0].ds, date(2024, 1, 3));
        assert_eq!(result.fitted().len(), 2);
        assert_eq!(result.future_only().forecast.len(), 3);
    }

    #[test]
    fn test_forecast_result_serializes_external_shape() {
        let result = ForecastResult {
            historical: vec![HistoricalPoint {
                ds: date(2024, 1, 1),
                y_original: 50.0,
            }],
            forecast: vec![ForecastPoint {
                ds: date(2024, 1, 2),
                yhat: 40.0,
                yhat_lower: 30.0,
                yhat_upper: 55.0,
            }],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["historical"][0]["ds"], "2024-01-01");
        assert_eq!(value["historical"][0]["y_original"], 50.0);
        assert_eq!(value["forecast"][0]["yhat_lower"], 30.0);
    }
}
