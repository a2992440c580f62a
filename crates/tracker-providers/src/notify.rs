//! Daily summary notifications via a Slack incoming webhook

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracker_core::{DayRecord, Result, TrackerError};

/// A Block Kit webhook payload, with plain-text fallback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlackMessage {
    pub blocks: Vec<Value>,
    /// Fallback text for surfaces that do not render blocks
    pub text: String,
}

/// Webhook sink for formatted messages
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &SlackMessage) -> Result<()>;
}

/// Slack incoming-webhook notifier
pub struct SlackWebhook {
    client: Client,
    webhook_url: String,
}

impl SlackWebhook {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::collaborator("slack", e))?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }
}

#[async_trait]
impl Notifier for SlackWebhook {
    async fn notify(&self, message: &SlackMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(message)
            .send()
            .await
            .map_err(|e| TrackerError::collaborator("slack", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::collaborator(
                "slack",
                format!("HTTP {status}: {body}"),
            ));
        }

        Ok(())
    }
}

/// Format one day's record as the daily summary message
///
/// Sections: header with the display date, benchmark line, one block per
/// material change (with its narrative when research produced one), an
/// explicit no-changes section otherwise, and the dashboard link.
pub fn daily_summary(
    record: &DayRecord,
    benchmark_name: &str,
    threshold_percent: f64,
    dashboard_url: &str,
) -> SlackMessage {
    let date_display = record.date_display();
    let mut blocks = Vec::new();

    blocks.push(json!({
        "type": "header",
        "text": {
            "type": "plain_text",
            "text": format!("📊 Gaming Stock Update - {date_display}"),
            "emoji": true
        }
    }));

    if let Some(benchmark) = &record.benchmark {
        let pct = benchmark.pct_change();
        let emoji = if pct >= 0.0 { "🟢" } else { "🔴" };
        blocks.push(json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("{emoji} *{benchmark_name}:* {pct:+.2}%")
            }
        }));
    }

    blocks.push(json!({ "type": "divider" }));

    if record.material_changes.is_empty() {
        blocks.push(json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "*No material changes today* (all movements < ±{threshold_percent}%)"
                )
            }
        }));
    } else {
        blocks.push(json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "*🚨 Material Changes (±{threshold_percent}%):* {}\n",
                    record.material_changes.len()
                )
            }
        }));
        blocks.push(json!({ "type": "divider" }));

        for change in &record.material_changes {
            let pct = change.pct_change();
            let emoji = if pct > 0.0 { "🟢" } else { "🔴" };

            let mut text = format!(
                "{emoji} *{}* ({})\n`{pct:+.2}%` | ${:.2}\n",
                change.ticker, change.name, change.quote.close
            );
            if let Some(summary) = change.narrative.summary() {
                text.push_str(&format!("\n_{summary}_"));
            }

            blocks.push(json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": text }
            }));
        }
    }

    blocks.push(json!({ "type": "divider" }));
    blocks.push(json!({
        "type": "section",
        "text": {
            "type": "mrkdwn",
            "text": format!("📊 <{dashboard_url}|View Full Dashboard>")
        }
    }));

    SlackMessage {
        blocks,
        text: format!("Gaming Stock Update - {date_display}"),
    }
}
