//! Backend operations the dashboard consumes.

pub mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::FilterTuple;
use crate::error::Result;
use crate::extract::Row;

pub use http::HttpSource;

/// Read-only view of the statistics backend.
///
/// Futures are not `Send`: the dashboard runs on a single-threaded runtime.
#[async_trait(?Send)]
pub trait DataSource {
    async fn provinces(&self) -> Result<Vec<String>>;

    async fn years(&self) -> Result<Vec<String>>;

    async fn levels(&self) -> Result<Vec<String>>;

    /// Total active programs, optionally for one province.
    async fn total_offering(&self, province: Option<&str>) -> Result<f64>;

    /// Distinct program count, optionally for one province.
    async fn total_programs(&self, province: Option<&str>) -> Result<f64>;

    /// Raw merged offering/enrollment/graduation rows for a filter tuple.
    async fn merged_rows(&self, tuple: &FilterTuple) -> Result<Vec<Row>>;
}

/// Accepts either a bare JSON array or an object wrapping it under `key`.
pub fn string_list(value: &Value, key: &str) -> Vec<String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get(key) {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
        .filter(|text| !text.trim().is_empty())
        .collect()
}

/// Extracts the `merged` array; anything else is treated as no rows.
pub fn merged_list(value: Value) -> Vec<Row> {
    let Value::Object(mut map) = value else {
        return Vec::new();
    };
    match map.remove("merged") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub fn as_row(value: Value) -> Row {
    match value {
        Value::Object(row) => row,
        _ => Row::new(),
    }
}

/// Sorts year identifiers numerically, newest first.
pub fn years_descending(mut years: Vec<String>) -> Vec<String> {
    years.sort_by(|a, b| year_number(b).cmp(&year_number(a)).then_with(|| b.cmp(a)));
    years.dedup();
    years
}

pub fn years_ascending(years: &[String]) -> Vec<String> {
    let mut ascending = years.to_vec();
    ascending.sort_by(|a, b| year_number(a).cmp(&year_number(b)).then_with(|| a.cmp(b)));
    ascending
}

fn year_number(year: &str) -> i64 {
    year.trim().parse().unwrap_or(i64::MIN)
}
