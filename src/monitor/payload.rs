//! Locating the open-interest list inside a captured API response.

use serde_json::Value;

use crate::error::{CadenceError, Result};

/// Shorter lists are assumed to be unrelated API responses
pub const MIN_ROWS: usize = 5;

const SYMBOL_KEYS: &[&str] = &["symbol", "uSymbol"];
const OI_KEYS: &[&str] = &["openInterest", "oi", "oiAmount"];

/// Parse a raw payload and return its open-interest rows.
pub fn extract_rows(raw: &str) -> Result<Vec<Value>> {
    let json: Value = serde_json::from_str(raw)?;
    find_list(&json)
        .cloned()
        .ok_or_else(|| CadenceError::Payload("no open-interest list found in payload".to_string()))
}

/// Find the first candidate list: top level, `data`, `list`, or `data.list`.
fn find_list(json: &Value) -> Option<&Vec<Value>> {
    let candidate = json
        .as_array()
        .or_else(|| json.get("data").and_then(Value::as_array))
        .or_else(|| json.get("list").and_then(Value::as_array))
        .or_else(|| {
            json.get("data")
                .and_then(|d| d.get("list"))
                .and_then(Value::as_array)
        })?;

    if candidate.len() < MIN_ROWS {
        return None;
    }

    let first = candidate.first()?.as_object()?;
    let has_symbol = SYMBOL_KEYS.iter().any(|k| first.contains_key(*k));
    let has_oi = OI_KEYS.iter().any(|k| first.contains_key(*k));
    (has_symbol && has_oi).then_some(candidate)
}
