//! Withdrawal extraction from raw provider transactions
//!
//! Only withdrawals (negative amounts) become expenses. A record that cannot
//! be understood is skipped and counted; it never aborts the batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::config::ExtractConfig;
use crate::currency::{is_base_currency, CurrencyNormalizer};
use crate::error::{Error, Result};
use crate::models::{ExpenseRecord, RawTransaction};

/// Turns raw transactions into display-currency expense records
pub struct TransactionExtractor<'a> {
    normalizer: &'a CurrencyNormalizer,
    config: &'a ExtractConfig,
}

impl<'a> TransactionExtractor<'a> {
    pub fn new(normalizer: &'a CurrencyNormalizer, config: &'a ExtractConfig) -> Self {
        Self { normalizer, config }
    }

    /// Extract every qualifying withdrawal, skipping deposits and malformed records
    pub fn extract(&self, transactions: &[RawTransaction]) -> Vec<ExpenseRecord> {
        let mut expenses = Vec::with_capacity(transactions.len());
        let mut deposits = 0usize;
        let mut malformed = 0usize;

        for (index, tx) in transactions.iter().enumerate() {
            match self.extract_one(tx) {
                Ok(Some(expense)) => expenses.push(expense),
                Ok(None) => deposits += 1,
                Err(e) => {
                    malformed += 1;
                    debug!(
                        index,
                        id = tx.id.as_deref().unwrap_or("-"),
                        error = %e,
                        "Skipping transaction"
                    );
                }
            }
        }

        info!(
            total = transactions.len(),
            expenses = expenses.len(),
            deposits,
            malformed,
            "Extracted expenses"
        );
        expenses
    }

    /// Convert one record
    ///
    /// Returns `Ok(None)` for non-withdrawals.
    pub fn extract_one(&self, tx: &RawTransaction) -> Result<Option<ExpenseRecord>> {
        let amount = tx
            .amount
            .as_ref()
            .ok_or_else(|| Error::MalformedRecord("Missing amount".into()))?
            .parse()?;

        if amount >= 0.0 {
            return Ok(None);
        }

        let date_str = tx
            .date_field()
            .ok_or_else(|| Error::MalformedRecord("No populated date field".into()))?;
        let date = parse_date(date_str)?;

        let usd = self.usd_amount(tx, amount)?;

        Ok(Some(ExpenseRecord {
            date,
            amount: usd * self.config.display_rate,
            category: tx
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        }))
    }

    /// USD value of a withdrawal
    ///
    /// A non-USD original-currency annotation takes precedence over the
    /// settlement amount.
    fn usd_amount(&self, tx: &RawTransaction, amount: f64) -> Result<f64> {
        if let Some((original, code)) = tx.original() {
            if !is_base_currency(code) {
                let original = original.parse()?.abs();
                return Ok(self.normalizer.normalize(original, code));
            }
        }

        match tx.currency_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() && !is_base_currency(code) => {
                Ok(self.normalizer.normalize(amount.abs(), code))
            }
            _ => Ok(amount.abs()),
        }
    }
}

/// Parse a provider date, truncating timestamps to the calendar day
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::MalformedRecord(format!("Unable to parse date: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawAmount;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn extract(txs: &[RawTransaction]) -> Vec<ExpenseRecord> {
        let normalizer = CurrencyNormalizer::new();
        let config = ExtractConfig::default();
        TransactionExtractor::new(&normalizer, &config).extract(txs)
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-15").unwrap(), date(2024, 1, 15));
        assert_eq!(parse_date("01/15/2024").unwrap(), date(2024, 1, 15));
        assert_eq!(
            parse_date("2024-01-15T23:59:00-05:00").unwrap(),
            date(2024, 1, 15)
        );
        assert_eq!(
            parse_date("2024-01-15 08:30:00").unwrap(),
            date(2024, 1, 15)
        );
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_skips_deposits_and_zero() {
        let txs = vec![
            RawTransaction::new(-50.0, "2024-01-01"),
            RawTransaction::new(200.0, "2024-01-01"),
            RawTransaction::new(0.0, "2024-01-02"),
        ];
        let expenses = extract(&txs);
        assert_eq!(expenses, vec![ExpenseRecord::new(date(2024, 1, 1), 50.0)]);
    }

    #[test]
    fn test_malformed_records_do_not_abort_batch() {
        let txs = vec![
            RawTransaction::new(RawAmount::Text("n/a".into()), "2024-01-01"),
            RawTransaction {
                amount: Some(RawAmount::Number(-5.0)),
                ..Default::default()
            },
            RawTransaction::new(-5.0, "not a date"),
            RawTransaction::default(),
            RawTransaction::new(RawAmount::Text("-12.50".into()), "2024-01-02"),
        ];
        let expenses = extract(&txs);
        assert_eq!(expenses, vec![ExpenseRecord::new(date(2024, 1, 2), 12.5)]);
    }

    #[test]
    fn test_original_currency_takes_precedence() {
        // Provider settled 108 USD for a 100 EUR purchase
        let tx = RawTransaction::new(-108.0, "2024-01-05").with_original(100.0, "EUR");
        let expenses = extract(&[tx]);
        assert!((expenses[0].amount - 108.0).abs() < 1e-9);

        // Settlement figure is ignored when it disagrees
        let tx = RawTransaction::new(-110.0, "2024-01-05").with_original(100.0, "EUR");
        let expenses = extract(&[tx]);
        assert!((expenses[0].amount - 108.0).abs() < 1e-9);
    }

    #[test]
    fn test_usd_original_annotation_uses_raw_amount() {
        let tx = RawTransaction::new(-20.0, "2024-01-05").with_original(25.0, "usd");
        let expenses = extract(&[tx]);
        assert_eq!(expenses[0].amount, 20.0);
    }

    #[test]
    fn test_unknown_original_currency_passes_through() {
        let tx = RawTransaction::new(-20.0, "2024-01-05").with_original(30.0, "ZZZ");
        let expenses = extract(&[tx]);
        assert_eq!(expenses[0].amount, 30.0);
    }

    #[test]
    fn test_malformed_original_amount_skips_record() {
        let tx = RawTransaction::new(-20.0, "2024-01-05")
            .with_original(RawAmount::Text("??".into()), "EUR");
        assert!(extract(&[tx]).is_empty());
    }

    #[test]
    fn test_settlement_currency_is_normalized() {
        let mut tx = RawTransaction::new(-10.0, "2024-01-05");
        tx.currency_code = Some("GBP".into());
        let expenses = extract(&[tx]);
        assert!((expenses[0].amount - 12.7).abs() < 1e-9);
    }

    #[test]
    fn test_display_rate_applied() {
        let normalizer = CurrencyNormalizer::new();
        let config = ExtractConfig {
            display_currency: "USD".into(),
            display_rate: 10.0,
        };
        let extractor = TransactionExtractor::new(&normalizer, &config);
        let expense = extractor
            .extract_one(&RawTransaction::new(-3.0, "2024-01-01"))
            .unwrap()
            .unwrap();
        assert_eq!(expense.amount, 30.0);
    }

    #[test]
    fn test_category_carried_through() {
        let tx = RawTransaction::new(-3.0, "2024-01-01").with_category(" groceries ");
        let expenses = extract(&[tx]);
        assert_eq!(expenses[0].category.as_deref(), Some("groceries"));
    }
}
