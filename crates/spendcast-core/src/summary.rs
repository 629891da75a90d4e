//! Categorized spending summary
//!
//! Built from the same expense records the forecast uses, so amounts are
//! already withdrawals in the display currency.

use std::collections::{BTreeMap, HashMap};

use crate::models::{
    CategorySpending, ExpenseRecord, MonthlySpending, ReportPeriod, SpendingSummary,
    UncategorizedSummary,
};

fn percentage(amount: f64, total: f64) -> f64 {
    if total > 0.0 {
        amount / total * 100.0
    } else {
        0.0
    }
}

/// Summarize expenses by provider category and by calendar month
pub fn summarize_expenses(expenses: &[ExpenseRecord]) -> SpendingSummary {
    let total: f64 = expenses.iter().map(|e| e.amount).sum();

    let mut by_category: HashMap<&str, (f64, i64)> = HashMap::new();
    let mut uncategorized = UncategorizedSummary::default();
    let mut by_month: BTreeMap<String, (f64, i64)> = BTreeMap::new();

    for expense in expenses {
        match expense.category.as_deref() {
            Some(category) => {
                let entry = by_category.entry(category).or_insert((0.0, 0));
                entry.0 += expense.amount;
                entry.1 += 1;
            }
            None => {
                uncategorized.amount += expense.amount;
                uncategorized.transaction_count += 1;
            }
        }

        let month = by_month
            .entry(expense.date.format("%Y-%m").to_string())
            .or_insert((0.0, 0));
        month.0 += expense.amount;
        month.1 += 1;
    }
    uncategorized.percentage = percentage(uncategorized.amount, total);

    let mut categories: Vec<CategorySpending> = by_category
        .into_iter()
        .map(|(category, (amount, count))| CategorySpending {
            category: category.to_string(),
            amount,
            percentage: percentage(amount, total),
            transaction_count: count,
        })
        .collect();
    categories.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });

    let monthly = by_month
        .into_iter()
        .map(|(month, (amount, count))| MonthlySpending {
            month,
            amount,
            transaction_count: count,
        })
        .collect();

    let period = match (
        expenses.iter().map(|e| e.date).min(),
        expenses.iter().map(|e| e.date).max(),
    ) {
        (Some(from), Some(to)) => Some(ReportPeriod {
            from: from.to_string(),
            to: to.to_string(),
        }),
        _ => None,
    };

    SpendingSummary {
        period,
        total,
        categories,
        uncategorized,
        monthly,
    }
}
