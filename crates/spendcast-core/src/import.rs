//! Transaction export loading
//!
//! Reads already-fetched provider transactions from disk. JSON exports may be
//! a bare array or the provider's `{"data": [...]}` envelope; CSV exports use
//! a header row naming the record fields.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{RawAmount, RawTransaction, TransactionExtra};

/// Load transactions, choosing the format from the file extension
pub fn load_transactions(path: &Path) -> Result<Vec<RawTransaction>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let file = File::open(path)?;
    match extension.as_str() {
        "json" => parse_json(file),
        "csv" => parse_csv(file),
        other => Err(Error::InvalidData(format!(
            "Unsupported transaction file type '{}' (expected .json or .csv)",
            other
        ))),
    }
}

/// Parse a JSON export
///
/// Entries that do not look like transactions are skipped.
pub fn parse_json<R: Read>(reader: R) -> Result<Vec<RawTransaction>> {
    let value: Value = serde_json::from_reader(reader)?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(Error::InvalidData(
                    "JSON object export must contain a \"data\" array".into(),
                ))
            }
        },
        _ => {
            return Err(Error::InvalidData(
                "Expected a JSON array of transactions".into(),
            ))
        }
    };

    let total = entries.len();
    let transactions: Vec<RawTransaction> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(tx) => Some(tx),
            Err(e) => {
                warn!(index, error = %e, "Skipping unreadable transaction entry");
                None
            }
        })
        .collect();

    debug!("Parsed {} of {} JSON transactions", transactions.len(), total);
    Ok(transactions)
}

/// Column positions for the CSV fields we understand
struct CsvColumns {
    id: Option<usize>,
    amount: Option<usize>,
    currency_code: Option<usize>,
    made_on: Option<usize>,
    date: Option<usize>,
    posting_date: Option<usize>,
    original_amount: Option<usize>,
    original_currency_code: Option<usize>,
    category: Option<usize>,
    description: Option<usize>,
}

impl CsvColumns {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |names: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim().to_lowercase();
                names.iter().any(|n| *n == h)
            })
        };

        Self {
            id: find(&["id"]),
            amount: find(&["amount"]),
            currency_code: find(&["currency_code", "currency"]),
            made_on: find(&["made_on"]),
            date: find(&["date"]),
            posting_date: find(&["posting_date"]),
            original_amount: find(&["original_amount"]),
            original_currency_code: find(&["original_currency_code"]),
            category: find(&["category"]),
            description: find(&["description"]),
        }
    }
}

fn field(record: &StringRecord, column: Option<usize>) -> Option<String> {
    column
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a CSV export with a header row
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = CsvColumns::from_headers(&headers);
    if columns.amount.is_none() {
        return Err(Error::InvalidData("CSV export has no amount column".into()));
    }

    let mut transactions = Vec::new();
    for result in rdr.records() {
        let record = result?;

        transactions.push(RawTransaction {
            id: field(&record, columns.id),
            amount: field(&record, columns.amount).map(RawAmount::Text),
            currency_code: field(&record, columns.currency_code),
            made_on: field(&record, columns.made_on),
            date: field(&record, columns.date),
            posting_date: field(&record, columns.posting_date),
            original_amount: field(&record, columns.original_amount).map(RawAmount::Text),
            original_currency_code: field(&record, columns.original_currency_code),
            category: field(&record, columns.category),
            description: field(&record, columns.description),
            extra: TransactionExtra::default(),
        });
    }

    debug!("Parsed {} CSV transactions", transactions.len());
    Ok(transactions)
}
