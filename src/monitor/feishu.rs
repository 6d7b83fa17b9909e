//! Feishu interactive card rendering and webhook delivery.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use serde_json::{Value, json};

use super::alert::{Alert, Trend};
use crate::error::{CadenceError, Result};

/// Chart link for a symbol
const CHART_URL: &str = "https://www.coinglass.com/tv/Binance_";

/// Card timestamps are shown in UTC+8
const CARD_UTC_OFFSET_SECS: i64 = 8 * 3600;

/// `$1.23B` from one billion up, `$45.6M` below
pub fn format_notional(value: f64) -> String {
    if value >= 1e9 {
        format!("${:.2}B", value / 1e9)
    } else {
        format!("${:.1}M", value / 1e6)
    }
}

/// Settings echoed in the card footer
#[derive(Debug, Clone, Copy)]
pub struct CardSettings {
    pub threshold: f64,
    pub min_oi_usdt: f64,
    pub max_lines: usize,
}

fn card_line(alert: &Alert) -> String {
    format!(
        "{} **[{}]({}{})** `{}` <font color='grey'>{}</font>",
        alert.trend().emoji(),
        alert.base_symbol(),
        CHART_URL,
        alert.symbol,
        alert.change_label(),
        format_notional(alert.oi_usdt)
    )
}

/// Plain-text summary for the console. Used when no webhook is configured.
pub fn console_line(alert: &Alert) -> String {
    format!(
        "   {} {} OI: {} ({})",
        alert.trend().emoji(),
        alert.symbol,
        alert.change_label(),
        format_notional(alert.oi_usdt)
    )
}

/// Build the interactive card for `alerts` (already sorted, non-empty).
pub fn build_card(alerts: &[Alert], settings: CardSettings, now: DateTime<Utc>) -> Value {
    let mut lines: Vec<String> = alerts.iter().take(settings.max_lines).map(card_line).collect();
    if alerts.len() > settings.max_lines {
        lines.push(format!("... {} more not shown", alerts.len() - settings.max_lines));
    }

    let time_str = (now + TimeDelta::seconds(CARD_UTC_OFFSET_SECS)).format("%H:%M");

    let template = match alerts.first().map(Alert::trend) {
        Some(Trend::Rising) => "orange",
        _ => "indigo",
    };

    json!({
        "msg_type": "interactive",
        "card": {
            "header": {
                "title": {
                    "tag": "plain_text",
                    "content": format!("⚡ OI Movement [{}]", time_str)
                },
                "template": template
            },
            "elements": [
                {
                    "tag": "div",
                    "text": {
                        "tag": "lark_md",
                        "content": lines.join("\n")
                    }
                },
                {
                    "tag": "note",
                    "elements": [{
                        "tag": "plain_text",
                        "content": format!(
                            "Threshold: {:.0}% | Min notional: {}",
                            settings.threshold * 100.0,
                            format_notional(settings.min_oi_usdt)
                        )
                    }]
                }
            ]
        }
    })
}

/// Posts cards to a Feishu bot webhook
pub struct FeishuNotifier {
    client: Client,
    webhook: String,
}

impl FeishuNotifier {
    pub fn new(webhook: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CadenceError::Notify(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            webhook: webhook.into(),
        })
    }

    pub async fn send(&self, card: &Value) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook)
            .json(card)
            .send()
            .await
            .map_err(|e| CadenceError::Notify(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CadenceError::Notify(format!("Webhook returned {}: {}", status, body)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::test_server::serve_once;
    use chrono::TimeZone;

    fn alert(symbol: &str, change: f64, oi_usdt: f64) -> Alert {
        Alert {
            symbol: symbol.to_string(),
            oi: 1.0,
            prev_oi: 1.0,
            oi_usdt,
            price: 1.0,
            change,
        }
    }

    fn settings(max_lines: usize) -> CardSettings {
        CardSettings {
            threshold: 0.05,
            min_oi_usdt: 0.0,
            max_lines,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 1, 30, 0).unwrap()
    }

    fn body(card: &Value) -> &str {
        card["card"]["elements"][0]["text"]["content"].as_str().unwrap()
    }

    #[test]
    fn test_format_notional() {
        assert_eq!(format_notional(2_500_000_000.0), "$2.50B");
        assert_eq!(format_notional(45_600_000.0), "$45.6M");
        assert_eq!(format_notional(0.0), "$0.0M");
    }

    #[test]
    fn test_card_header_uses_utc_plus_eight() {
        let card = build_card(&[alert("BTCUSDT", 0.1, 1e9)], settings(20), now());
        assert_eq!(card["msg_type"], "interactive");
        assert_eq!(card["card"]["header"]["title"]["content"], "⚡ OI Movement [09:30]");
        assert_eq!(card["card"]["header"]["template"], "orange");
    }

    #[test]
    fn test_card_template_follows_top_alert() {
        let card = build_card(&[alert("ETHUSDT", -0.2, 1e6), alert("BTCUSDT", 0.1, 1e6)], settings(20), now());
        assert_eq!(card["card"]["header"]["template"], "indigo");
    }

    #[test]
    fn test_card_line_format() {
        let card = build_card(&[alert("BTCUSDT", 0.052, 1_230_000_000.0)], settings(20), now());
        assert_eq!(
            body(&card),
            "🚀 **[BTC](https://www.coinglass.com/tv/Binance_BTCUSDT)** `+5.20%` <font color='grey'>$1.23B</font>"
        );
    }

    #[test]
    fn test_card_overflow_line() {
        let alerts: Vec<Alert> = (0..25).map(|i| alert(&format!("C{}USDT", i), 0.1, 1e6)).collect();
        let card = build_card(&alerts, settings(20), now());
        let lines: Vec<&str> = body(&card).lines().collect();
        assert_eq!(lines.len(), 21);
        assert_eq!(lines[20], "... 5 more not shown");
    }

    #[test]
    fn test_card_note() {
        let card = build_card(&[alert("BTCUSDT", 0.1, 1e6)], settings(20), now());
        assert_eq!(
            card["card"]["elements"][1]["elements"][0]["content"],
            "Threshold: 5% | Min notional: $0.0M"
        );
    }

    #[test]
    fn test_console_line() {
        assert_eq!(
            console_line(&alert("SOLUSDT", -0.0734, 45_600_000.0)),
            "   📉 SOLUSDT OI: -7.34% ($45.6M)"
        );
    }

    #[tokio::test]
    async fn test_send_posts_card_json() {
        let (url, server) = serve_once(200, r#"{"code": 0}"#).await;
        let card = build_card(&[alert("BTCUSDT", 0.1, 1e9)], settings(20), now());

        let notifier = FeishuNotifier::new(url, Duration::from_secs(5)).unwrap();
        notifier.send(&card).await.unwrap();

        let received = server.await.unwrap();
        assert!(received.request_line.starts_with("POST /hook"));
        let posted: Value = serde_json::from_str(&received.body).unwrap();
        assert_eq!(posted, card);
    }

    #[tokio::test]
    async fn test_send_maps_error_status_to_notify() {
        let (url, server) = serve_once(500, "boom").await;
        let card = build_card(&[alert("BTCUSDT", 0.1, 1e9)], settings(20), now());

        let notifier = FeishuNotifier::new(url, Duration::from_secs(5)).unwrap();
        let err = notifier.send(&card).await.unwrap_err();

        match err {
            CadenceError::Notify(msg) => {
                assert!(msg.contains("500"), "unexpected message: {}", msg);
                assert!(msg.contains("boom"));
            }
            other => panic!("Expected Notify, got {:?}", other),
        }
        server.await.unwrap();
    }
}
