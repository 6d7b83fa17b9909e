//! Open-interest movement monitor
//!
//! Consumes a captured market payload, compares it against the previous
//! snapshot, persists the new snapshot and pushes alerts:
//! - fetch: pull the raw response from an HTTP endpoint
//! - payload: locate the OI list in the raw response
//! - snapshot: per-symbol OI/price/notional entries
//! - history: previous snapshot on disk
//! - alert: threshold-based move detection
//! - feishu: card rendering and webhook delivery

pub mod alert;
pub mod feishu;
pub mod fetch;
pub mod history;
pub mod payload;
pub mod snapshot;

#[cfg(test)]
mod test_server;

pub use alert::{Alert, Trend, detect_alerts};
pub use feishu::{CardSettings, FeishuNotifier, build_card, console_line, format_notional};
pub use fetch::fetch_payload;
pub use history::HistoryStore;
pub use payload::extract_rows;
pub use snapshot::{Snapshot, SnapshotEntry, build_snapshot, normalize_symbol};

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info, warn};

use crate::config::MonitorConfig;
use crate::error::Result;

/// Alerts printed to the console when no webhook is configured
const CONSOLE_ALERT_LIMIT: usize = 5;

/// What happened to the alerts of one analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Nothing crossed the threshold
    NoAlerts,
    /// Posted to the webhook
    Sent,
    /// No webhook configured, printed instead
    Printed,
    /// Delivery suppressed by dry run
    DryRun,
    /// Webhook request failed (not fatal)
    Failed(String),
}

/// Result of one analysis pass
#[derive(Debug, Clone)]
pub struct Analysis {
    pub tracked: usize,
    pub alerts: Vec<Alert>,
    pub delivery: Delivery,
}

/// Runs one analysis over a captured payload.
pub struct Monitor {
    config: MonitorConfig,
    history: HistoryStore,
    dry_run: bool,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        let history = HistoryStore::new(&config.history_file);
        Self {
            config,
            history,
            dry_run: false,
        }
    }

    /// Skip delivery; history is still updated
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn card_settings(&self) -> CardSettings {
        CardSettings {
            threshold: self.config.oi_change_threshold,
            min_oi_usdt: self.config.min_oi_usdt,
            max_lines: self.config.max_card_lines,
        }
    }

    /// Analyze `raw`, save the new snapshot, then deliver alerts.
    /// A failed save is logged and delivery still goes ahead.
    pub async fn analyze(&self, raw: &str, now: DateTime<Utc>) -> Result<Analysis> {
        let rows = extract_rows(raw)?;
        info!("Parsed {} payload rows", rows.len());

        let current = build_snapshot(&rows, self.config.min_oi_usdt, now);
        let previous = self.history.load();
        let alerts = detect_alerts(&current, &previous, self.config.oi_change_threshold);

        if let Err(e) = self.history.save(&current) {
            error!("Failed to save history {}: {}", self.history.path().display(), e);
        }

        let delivery = if alerts.is_empty() {
            info!(
                "No significant OI moves (threshold: {:.1}%)",
                self.config.oi_change_threshold * 100.0
            );
            Delivery::NoAlerts
        } else {
            self.deliver(&alerts, now).await
        };

        Ok(Analysis {
            tracked: current.len(),
            alerts,
            delivery,
        })
    }

    async fn deliver(&self, alerts: &[Alert], now: DateTime<Utc>) -> Delivery {
        if self.dry_run {
            info!("Dry run: {} alerts not delivered", alerts.len());
            return Delivery::DryRun;
        }

        let Some(webhook) = self.config.webhook() else {
            warn!("No Feishu webhook configured, printing alerts instead");
            for alert in alerts.iter().take(CONSOLE_ALERT_LIMIT) {
                println!("{}", console_line(alert));
            }
            return Delivery::Printed;
        };

        let card = build_card(alerts, self.card_settings(), now);
        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        let sent = match FeishuNotifier::new(webhook, timeout) {
            Ok(notifier) => notifier.send(&card).await,
            Err(e) => Err(e),
        };

        match sent {
            Ok(()) => {
                info!("Pushed {} OI alerts", alerts.len());
                Delivery::Sent
            }
            Err(e) => {
                error!("Failed to push alerts: {}", e);
                Delivery::Failed(e.to_string())
            }
        }
    }
}
