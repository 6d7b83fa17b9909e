//! Detecting open-interest moves between two snapshots.

use super::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
}

impl Trend {
    pub fn emoji(&self) -> &'static str {
        match self {
            Trend::Rising => "🚀",
            Trend::Falling => "📉",
        }
    }
}

/// A symbol whose OI moved by at least the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub symbol: String,
    pub oi: f64,
    pub prev_oi: f64,
    pub oi_usdt: f64,
    pub price: f64,
    /// Relative change, 0.05 = +5%
    pub change: f64,
}

impl Alert {
    pub fn trend(&self) -> Trend {
        if self.change > 0.0 { Trend::Rising } else { Trend::Falling }
    }

    /// Symbol without the quote currency
    pub fn base_symbol(&self) -> &str {
        self.symbol.strip_suffix("USDT").unwrap_or(&self.symbol)
    }

    /// Signed percentage with two decimals, e.g. `+5.20%`
    pub fn change_label(&self) -> String {
        if self.change > 0.0 {
            format!("+{:.2}%", self.change * 100.0)
        } else {
            format!("{:.2}%", self.change * 100.0)
        }
    }
}

/// Compare `current` against `previous`, largest moves first.
///
/// Symbols new to this snapshot, or with no previous OI, are ignored.
pub fn detect_alerts(current: &Snapshot, previous: &Snapshot, threshold: f64) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = current
        .iter()
        .filter_map(|(symbol, curr)| {
            let prev_oi = previous.get(symbol)?.oi;
            if prev_oi <= 0.0 {
                return None;
            }
            let change = (curr.oi - prev_oi) / prev_oi;
            (change.abs() >= threshold).then(|| Alert {
                symbol: symbol.clone(),
                oi: curr.oi,
                prev_oi,
                oi_usdt: curr.oi_usdt,
                price: curr.price,
                change,
            })
        })
        .collect();

    alerts.sort_by(|a, b| b.change.abs().total_cmp(&a.change.abs()));
    alerts
}
