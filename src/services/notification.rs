//! Result notification
//!
//! At most one notification per single job and one per batch. Delivery
//! failure is reported to the caller and never retried here.

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppResult, NotifyError};
use crate::models::{CostSummary, SuccessEntry};

/// What a notification reports: the successful jobs only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationSummary {
    pub subject: String,
    pub entries: Vec<SuccessEntry>,
}

impl NotificationSummary {
    pub fn for_job(entry: SuccessEntry) -> Self {
        let subject = match &entry.spec_sheet_id {
            Some(id) => format!("Costing Summary for Spec Sheet {}", id),
            None => format!("Costing Summary for row {}", entry.row_index),
        };
        Self {
            subject,
            entries: vec![entry],
        }
    }

    pub fn for_batch(entries: Vec<SuccessEntry>) -> Self {
        Self {
            subject: format!("Costing Summary for {} spec sheet(s)", entries.len()),
            entries,
        }
    }
}

fn write_costs(out: &mut String, summary: &CostSummary) {
    let _ = writeln!(out, "  {:<22}£{:>10.2}", "Cost £/case", summary.cost_per_unit);
    let _ = writeln!(out, "  {:<22}£{:>10.2}", "Total Labour & Sup", summary.total_labour_cost);
    let _ = writeln!(out, "  {:<22}£{:>10.2}", "Overhead Cost/job", summary.overhead_cost_per_job);
}

/// Plain-text cost table, one block per successful job
pub fn render_transcript(summary: &NotificationSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", summary.subject);
    let _ = writeln!(out, "{}", "=".repeat(36));
    for entry in &summary.entries {
        let heading = match (&entry.spec_sheet_id, &entry.tracking_id) {
            (Some(sheet), Some(tracking)) => format!("Spec sheet {} ({})", sheet, tracking),
            (Some(sheet), None) => format!("Spec sheet {}", sheet),
            (None, Some(tracking)) => format!("Row {} ({})", entry.row_index, tracking),
            (None, None) => format!("Row {}", entry.row_index),
        };
        let _ = writeln!(out, "{}", heading);
        write_costs(&mut out, &entry.cost_summary);
        let _ = writeln!(out);
    }
    out
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, recipient: &str, summary: &NotificationSummary, transcript: &str) -> AppResult<()>;
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    to: &'a str,
    subject: &'a str,
    summary: &'a [SuccessEntry],
    transcript: &'a str,
}

/// Posts notifications to a mail relay endpoint
pub struct RelayNotifier {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl RelayNotifier {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token,
        }
    }
}

#[async_trait]
impl NotificationSender for RelayNotifier {
    async fn send(&self, recipient: &str, summary: &NotificationSummary, transcript: &str) -> AppResult<()> {
        let body = RelayRequest {
            to: recipient,
            subject: &summary.subject,
            summary: &summary.entries,
            transcript,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        info!("📧 Notification sent to {}", recipient);
        Ok(())
    }
}

/// Used when no relay is configured: the transcript goes to the log
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send(&self, recipient: &str, summary: &NotificationSummary, transcript: &str) -> AppResult<()> {
        info!("📧 No relay configured; notification for {}: {}", recipient, summary.subject);
        debug!("\n{}", transcript);
        Ok(())
    }
}

/// Relay when `notify_endpoint` is set, log-only otherwise
pub fn sender_from_config(config: &Config) -> Box<dyn NotificationSender> {
    match &config.notify_endpoint {
        Some(endpoint) => Box::new(RelayNotifier::new(endpoint.clone(), config.notify_token.clone())),
        None => Box::new(LogNotifier),
    }
}
