//! Daily aggregation of expenses

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::error::{Error, Result};
use crate::models::{DailySeries, DailyTotal, ExpenseRecord};

/// Sum expenses per calendar day over the full observed span
///
/// Days with no expense are filled with 0 so the model sees regular
/// observations.
pub fn aggregate_daily(expenses: &[ExpenseRecord]) -> Result<DailySeries> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for expense in expenses {
        *by_day.entry(expense.date).or_insert(0.0) += expense.amount;
    }

    let (first, last) = match (by_day.keys().next(), by_day.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(Error::InsufficientData(
                "No expense records to aggregate".into(),
            ))
        }
    };

    let span = (last - first).num_days();
    let points = (0..=span)
        .map(|offset| {
            let date = first + Duration::days(offset);
            DailyTotal {
                date,
                total: by_day.get(&date).copied().unwrap_or(0.0),
            }
        })
        .collect();

    DailySeries::from_points(points)
}
