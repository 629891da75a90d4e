//! Currency normalization to USD
//!
//! Rates are static: live rate fetching is out of scope. Unknown currency
//! codes fail closed by returning the amount unchanged.

use std::collections::HashMap;

/// Built-in USD rates (units of USD per unit of currency)
const DEFAULT_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 1.08),
    ("GBP", 1.27),
    ("CAD", 0.74),
    ("AUD", 0.66),
    ("CHF", 1.13),
    ("JPY", 0.0067),
    ("CNY", 0.14),
    ("INR", 0.012),
    ("MXN", 0.058),
];

/// Currency code the normalizer converts into
pub const BASE_CURRENCY: &str = "USD";

/// Maps a (currency code, amount) pair to a USD amount
#[derive(Debug, Clone)]
pub struct CurrencyNormalizer {
    rates: HashMap<String, f64>,
}

impl CurrencyNormalizer {
    /// Normalizer with the built-in rate table
    pub fn new() -> Self {
        let rates = DEFAULT_RATES
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect();
        Self { rates }
    }

    /// Add or replace a rate (code is case-insensitive)
    pub fn with_rate(mut self, code: &str, rate: f64) -> Self {
        self.rates.insert(code.trim().to_uppercase(), rate);
        self
    }

    /// USD per unit of `code`, if known
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(&code.trim().to_uppercase()).copied()
    }

    /// Convert `amount` in `currency_code` to USD
    pub fn normalize(&self, amount: f64, currency_code: &str) -> f64 {
        match self.rate(currency_code) {
            Some(rate) => amount * rate,
            None => {
                tracing::debug!(
                    currency = currency_code,
                    "Unknown currency code, leaving amount unconverted"
                );
                amount
            }
        }
    }
}

impl Default for CurrencyNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `code` names the base currency
pub fn is_base_currency(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(BASE_CURRENCY)
}
