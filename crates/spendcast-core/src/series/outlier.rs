//! Quantile capping of daily spikes

use crate::error::{Error, Result};
use crate::models::DailySeries;

/// Nearest-rank quantile: the smallest value with at least `q` of the data at or below it
///
/// The result is always one of the input values, which keeps capping
/// idempotent. Returns `None` for an empty slice.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q * sorted.len() as f64).ceil() as usize;
    let index = rank.clamp(1, sorted.len()) - 1;
    Some(sorted[index])
}

/// Clip every value strictly above the series-wide `q` quantile to that quantile
pub fn cap_outliers(series: &DailySeries, q: f64) -> Result<DailySeries> {
    if !(q > 0.0 && q <= 1.0) {
        return Err(Error::InvalidConfig(format!(
            "Cap quantile must be in (0, 1], got {}",
            q
        )));
    }

    let Some(threshold) = quantile(&series.values(), q) else {
        return Ok(series.clone());
    };

    let capped = series
        .points()
        .iter()
        .filter(|p| p.total > threshold)
        .count();
    if capped > 0 {
        tracing::debug!(capped, threshold, quantile = q, "Capped outlier days");
    }

    Ok(series.map_values(|v| if v > threshold { threshold } else { v }))
}
