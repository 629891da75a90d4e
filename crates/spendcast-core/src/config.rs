//! Forecast pipeline configuration
//!
//! Every tunable of the pipeline lives here: currency handling, outlier
//! capping, and the trend/seasonality model.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a layered resolution:
//! 1. An explicit path (e.g. `--config`), if it exists
//! 2. Override in data dir (~/.local/share/spendcast/config/forecast.toml)
//! 3. Embedded defaults (compiled into binary)
//!
//! Keys missing from a file keep their default values.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::currency::CurrencyNormalizer;
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/forecast.toml");

/// How raw transactions become expense records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractConfig {
    /// Currency code of reported amounts
    pub display_currency: String,
    /// Multiplier from USD to the display currency
    pub display_rate: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            display_currency: "USD".to_string(),
            display_rate: 1.0,
        }
    }
}

/// Series denoising before the model is fit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreprocessConfig {
    /// Values strictly above this quantile are clipped (1.0 disables capping)
    pub cap_quantile: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { cap_quantile: 0.75 }
    }
}

/// Trend + seasonality model settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    /// Future days to forecast past the last observation
    pub horizon_days: u32,
    pub daily_seasonality: bool,
    pub weekly_seasonality: bool,
    pub yearly_seasonality: bool,
    /// Trend flexibility (higher = more responsive to recent shifts)
    pub changepoint_prior_scale: f64,
    /// Seasonal amplitude allowed
    pub seasonality_prior_scale: f64,
    /// Upper bound on potential trend changepoints
    pub n_changepoints: usize,
    /// Fraction of history in which changepoints may be placed
    pub changepoint_range: f64,
    /// Probability mass covered by the uncertainty interval
    pub interval_width: f64,
    /// Fewest daily observations the model will fit
    pub min_history_days: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            daily_seasonality: true,
            weekly_seasonality: false,
            yearly_seasonality: false,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            n_changepoints: 25,
            changepoint_range: 0.8,
            interval_width: 0.8,
            min_history_days: 2,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.changepoint_prior_scale > 0.0 && self.changepoint_prior_scale.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "changepoint_prior_scale must be positive, got {}",
                self.changepoint_prior_scale
            )));
        }
        if !(self.seasonality_prior_scale > 0.0 && self.seasonality_prior_scale.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "seasonality_prior_scale must be positive, got {}",
                self.seasonality_prior_scale
            )));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        if self.min_history_days < 2 {
            return Err(Error::InvalidConfig(format!(
                "min_history_days must be at least 2, got {}",
                self.min_history_days
            )));
        }
        Ok(())
    }
}

/// Extra or overriding USD rates
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrencyConfig {
    pub rates: BTreeMap<String, f64>,
}

/// Full pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastConfig {
    pub extract: ExtractConfig,
    pub preprocess: PreprocessConfig,
    pub model: ModelConfig,
    pub currency: CurrencyConfig,
}

impl ForecastConfig {
    /// Load configuration (explicit path, then user override, then defaults)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        load_config(override_path)
    }

    /// Parse configuration from TOML content layered over defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.extract.display_rate > 0.0 && self.extract.display_rate.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "display_rate must be positive, got {}",
                self.extract.display_rate
            )));
        }
        let q = self.preprocess.cap_quantile;
        if !(q > 0.0 && q <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "cap_quantile must be in (0, 1], got {}",
                q
            )));
        }
        for (code, rate) in &self.currency.rates {
            if !(*rate > 0.0 && rate.is_finite()) {
                return Err(Error::InvalidConfig(format!(
                    "Rate for {} must be positive, got {}",
                    code, rate
                )));
            }
        }
        self.model.validate()
    }

    /// Currency normalizer with the built-in table plus configured rates
    pub fn normalizer(&self) -> CurrencyNormalizer {
        self.currency
            .rates
            .iter()
            .fold(CurrencyNormalizer::new(), |n, (code, rate)| {
                n.with_rate(code, *rate)
            })
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("spendcast").join("config").join("forecast.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<ForecastConfig> {
    let candidate = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let content = match candidate {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "Loading config override");
            fs::read_to_string(&path)
                .map_err(|e| Error::InvalidConfig(format!("Failed to read config: {}", e)))?
        }
        _ => DEFAULT_CONFIG.to_string(),
    };

    let config = parse_config(&content)?;
    config.validate()?;
    Ok(config)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    extract: Option<RawExtract>,
    preprocess: Option<RawPreprocess>,
    model: Option<RawModel>,
    currency: Option<RawCurrency>,
}

#[derive(Debug, Deserialize)]
struct RawExtract {
    display_currency: Option<String>,
    display_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPreprocess {
    cap_quantile: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawModel {
    horizon_days: Option<u32>,
    daily_seasonality: Option<bool>,
    weekly_seasonality: Option<bool>,
    yearly_seasonality: Option<bool>,
    changepoint_prior_scale: Option<f64>,
    seasonality_prior_scale: Option<f64>,
    n_changepoints: Option<usize>,
    changepoint_range: Option<f64>,
    interval_width: Option<f64>,
    min_history_days: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawCurrency {
    rates: Option<BTreeMap<String, f64>>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<ForecastConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::InvalidConfig(format!("Invalid config TOML: {}", e)))?;

    let mut config = ForecastConfig::default();

    if let Some(extract) = raw.extract {
        if let Some(currency) = extract.display_currency {
            config.extract.display_currency = currency;
        }
        if let Some(rate) = extract.display_rate {
            config.extract.display_rate = rate;
        }
    }

    if let Some(preprocess) = raw.preprocess {
        if let Some(q) = preprocess.cap_quantile {
            config.preprocess.cap_quantile = q;
        }
    }

    if let Some(model) = raw.model {
        let m = &mut config.model;
        if let Some(v) = model.horizon_days {
            m.horizon_days = v;
        }
        if let Some(v) = model.daily_seasonality {
            m.daily_seasonality = v;
        }
        if let Some(v) = model.weekly_seasonality {
            m.weekly_seasonality = v;
        }
        if let Some(v) = model.yearly_seasonality {
            m.yearly_seasonality = v;
        }
        if let Some(v) = model.changepoint_prior_scale {
            m.changepoint_prior_scale = v;
        }
        if let Some(v) = model.seasonality_prior_scale {
            m.seasonality_prior_scale = v;
        }
        if let Some(v) = model.n_changepoints {
            m.n_changepoints = v;
        }
        if let Some(v) = model.changepoint_range {
            m.changepoint_range = v;
        }
        if let Some(v) = model.interval_width {
            m.interval_width = v;
        }
        if let Some(v) = model.min_history_days {
            m.min_history_days = v;
        }
    }

    if let Some(rates) = raw.currency.and_then(|c| c.rates) {
        config.currency.rates = rates
            .into_iter()
            .map(|(code, rate)| (code.to_uppercase(), rate))
            .collect();
    }

    Ok(config)
}
