//! Delivery stage
//!
//! Terminal and non-branching. Works out the live-site URL and remaining
//! credit, then sends the internal lead notice and the submitter
//! confirmation concurrently. Neither send can cancel or undo the other, and
//! neither outcome affects the run's status.

pub mod email;
pub mod render;

use crate::context::SessionContext;
use crate::credits::{CreditError, CreditLedger};
use crate::graph::Edge;
use crate::stages::{StageOutput, StageResult};
use email::{EmailMessage, Mailer};
use render::{NotificationData, RenderedEmail};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub use email::{EmailError, ResendConfig, ResendMailer};

/// Result of one notification attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent { id: String },
    Failed { error: String },
    Skipped { reason: String },
}

impl NotificationStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    /// Whether a send was actually tried
    pub fn was_attempted(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }
}

/// Delivery stage slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub site_url: Option<String>,
    pub credits_remaining: Option<u32>,
    pub lead_notice: NotificationStatus,
    pub confirmation: NotificationStatus,
}

/// Outbound email wiring
#[derive(Clone)]
pub struct Notifier {
    mailer: Option<Arc<dyn Mailer>>,
    from: String,
    lead_inbox: Option<String>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("enabled", &self.mailer.is_some())
            .field("from", &self.from)
            .field("lead_inbox", &self.lead_inbox)
            .finish()
    }
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>, lead_inbox: Option<String>) -> Self {
        Self {
            mailer: Some(mailer),
            from: from.into(),
            lead_inbox,
        }
    }

    /// No email service configured; every notification is skipped
    pub fn disabled() -> Self {
        Self {
            mailer: None,
            from: String::new(),
            lead_inbox: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    pub fn lead_inbox(&self) -> Option<&str> {
        self.lead_inbox.as_deref()
    }

    async fn send(&self, to: Option<&str>, rendered: RenderedEmail, kind: &str) -> NotificationStatus {
        let Some(mailer) = &self.mailer else {
            return NotificationStatus::Skipped {
                reason: "email service not configured".to_string(),
            };
        };
        let Some(to) = to else {
            return NotificationStatus::Skipped {
                reason: format!("no recipient for {}", kind),
            };
        };

        let message = EmailMessage {
            from: self.from.clone(),
            to: vec![to.to_string()],
            subject: rendered.subject,
            html: rendered.html,
        };
        match mailer.send(&message).await {
            Ok(id) => {
                info!(kind, id = %id, "Notification sent");
                NotificationStatus::Sent { id }
            }
            Err(e) => {
                warn!(kind, error = %e, "Notification failed");
                NotificationStatus::Failed { error: e.to_string() }
            }
        }
    }
}

/// Remaining credit for this delivery
///
/// Revisions deduct one credit; first submissions only make sure a record
/// exists. Every failure is logged and swallowed. An exhausted balance
/// reports zero, any other failure reports nothing.
pub async fn settle_credits(
    ledger: Option<&CreditLedger>,
    identity: Option<&str>,
    revision: u32,
) -> Option<u32> {
    let (ledger, identity) = (ledger?, identity?);

    let result = if revision > 0 {
        ledger.deduct(identity).await
    } else {
        ledger.get_or_create(identity).await
    };

    match result {
        Ok(record) => Some(record.remaining()),
        Err(e @ CreditError::Exhausted { .. }) => {
            warn!(identity = %identity, revision, error = %e, "Credits exhausted; delivering anyway");
            Some(0)
        }
        Err(e) => {
            warn!(identity = %identity, error = %e, "Credit ledger unavailable");
            None
        }
    }
}

pub async fn run(
    session_id: &str,
    context: &SessionContext,
    ledger: Option<&CreditLedger>,
    notifier: &Notifier,
) -> StageResult {
    let submission = &context.submission;
    let site_url = context.site_url().map(str::to_string);

    // Deduction happens before anything is sent.
    let identity = submission.submitter_identity();
    let credits_remaining = settle_credits(ledger, identity.as_deref(), context.revision).await;

    let data = NotificationData {
        session_id,
        business_name: submission.display_name(),
        contact_name: submission.contact_name.as_deref(),
        contact_email: submission.contact_email(),
        phone: submission.phone.as_deref(),
        industry: submission.industry.as_deref(),
        tagline: context.enhancement.as_ref().map(|e| e.tagline.as_str()),
        quality_score: context.quality_score(),
        site_url: site_url.as_deref(),
        credits_remaining,
        revision: context.revision,
    };

    let (lead_notice, confirmation) = tokio::join!(
        notifier.send(notifier.lead_inbox.as_deref(), render::lead_notice(&data), "lead_notice"),
        notifier.send(data.contact_email, render::confirmation(&data), "confirmation"),
    );

    let report = DeliveryReport {
        site_url,
        credits_remaining,
        lead_notice,
        confirmation,
    };
    StageResult::new(StageOutput::Delivery(report), Edge::Done)
}
