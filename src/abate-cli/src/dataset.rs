//! Loading export datasets from JSON.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use abate_export::Row;

/// Read rows from a JSON file.
///
/// Accepts a top-level array of objects, or an object wrapping one under
/// `items` or `data` (the shapes the backend's list endpoints return).
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    rows_from_value(value)
}

pub fn rows_from_value(value: Value) -> Result<Vec<Row>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items").or_else(|| map.remove("data")) {
            Some(Value::Array(items)) => items,
            _ => bail!("expected an array of records, or an object with an `items` array"),
        },
        _ => bail!("expected an array of records"),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(row),
            other => bail!("record {i} is not an object: {other}"),
        })
        .collect()
}
