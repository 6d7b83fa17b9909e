//! Per-symbol open-interest snapshot built from payload rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One symbol's position data at capture time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotEntry {
    /// Open interest in contracts/coins
    pub oi: f64,
    pub price: f64,
    /// Notional value in USDT
    pub oi_usdt: f64,
    /// Unix timestamp in seconds
    pub time: f64,
}

/// Symbol -> entry, ordered for stable history files
pub type Snapshot = BTreeMap<String, SnapshotEntry>;

/// Python-style truthiness: null, false, 0 and "" count as missing.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn first_present<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| row.get(*k)).find(|v| truthy(v))
}

/// Numbers arrive either as JSON numbers or numeric strings
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|f| f.is_finite())
}

/// `BTC/USDT` and `BTC` both become `BTCUSDT`
pub fn normalize_symbol(raw: &str) -> String {
    let base = raw.replace("/USDT", "");
    if base.ends_with("USDT") {
        base
    } else {
        format!("{}USDT", base)
    }
}

fn entry_from_row(row: &Value, now: f64) -> Option<(String, SnapshotEntry)> {
    let symbol = first_present(row, &["symbol", "uSymbol"])?.as_str()?;
    let oi = as_number(first_present(row, &["openInterest", "oi"])?)?;
    let price = match first_present(row, &["price", "lastPrice", "close"]) {
        Some(v) => as_number(v)?,
        None => 0.0,
    };

    let oi_usdt = match row.get("openInterestAmount") {
        Some(amount) => as_number(amount)?,
        None if price > 0.0 => oi * price,
        None => 0.0,
    };

    Some((
        normalize_symbol(symbol),
        SnapshotEntry {
            oi,
            price,
            oi_usdt,
            time: now,
        },
    ))
}

/// Build a snapshot, skipping unusable rows and rows below `min_oi_usdt`.
pub fn build_snapshot(rows: &[Value], min_oi_usdt: f64, now: DateTime<Utc>) -> Snapshot {
    let now = now.timestamp_millis() as f64 / 1000.0;
    let mut snapshot = Snapshot::new();
    let mut skipped = 0usize;

    for row in rows {
        match entry_from_row(row, now) {
            Some((symbol, entry)) if entry.oi_usdt >= min_oi_usdt => {
                snapshot.insert(symbol, entry);
            }
            Some(_) => {}
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::debug!("build_snapshot: skipped {} unusable rows", skipped);
    }
    snapshot
}
