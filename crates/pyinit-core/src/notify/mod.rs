//! Webhook notifications.
//!
//! A message moves through `Idle → Formatted → (Sent | Failed)`:
//! [`format::MessageFormats`] applies the template for its
//! [`format::MessageKind`], [`webhook::build_payload`] adds an optional
//! attachment, and [`webhook::WebhookSender`] posts it with bounded retries.
//! Send failures are reported as values and never abort the caller.

pub mod attachment;
pub mod deploy;
pub mod format;
pub mod report;
pub mod webhook;

use crate::config::{non_empty_var, EnvSource, MENTION_ENV};
use crate::error::Result;
use attachment::Attachment;
use format::{MessageFormats, MessageKind};
use serde::Serialize;
use std::time::Duration;
use webhook::{SendOutcome, WebhookPayload, WebhookSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotifyOutcome {
    /// No webhook configured, or nothing to send.
    Skipped,
    Sent { attempts: u32 },
    Failed { attempts: u32 },
}

impl From<SendOutcome> for NotifyOutcome {
    fn from(outcome: SendOutcome) -> Self {
        match outcome {
            SendOutcome::Sent { attempts, .. } => NotifyOutcome::Sent { attempts },
            SendOutcome::Failed { attempts } => NotifyOutcome::Failed { attempts },
        }
    }
}

/// Formats and sends messages to an optional webhook.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: Option<WebhookSender>,
    formats: MessageFormats,
}

impl Notifier {
    /// A notifier for `url`; `None` or a blank URL disables sending.
    pub fn new(url: Option<String>, formats: MessageFormats, attempt_timeout: Duration) -> Result<Self> {
        let sender = match url.filter(|u| !u.trim().is_empty()) {
            Some(url) => Some(WebhookSender::new(url, attempt_timeout)?),
            None => None,
        };
        Ok(Self { sender, formats })
    }

    /// Build from the webhook URL in `webhook_var` and the mention in
    /// `DISCORD_AT_MENTION`.
    pub fn from_env(env: &impl EnvSource, webhook_var: &str, attempt_timeout: Duration) -> Result<Self> {
        let url = non_empty_var(env, webhook_var);
        if url.is_none() {
            tracing::info!(var = webhook_var, "webhook not configured, notifications disabled");
        }
        let mention = env.var(MENTION_ENV).unwrap_or_default();
        Self::new(url, MessageFormats::new(&mention), attempt_timeout)
    }

    pub fn disabled() -> Self {
        Self {
            sender: None,
            formats: MessageFormats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Format `message` as `kind` and send it with an optional attachment.
    pub async fn notify(
        &self,
        message: &str,
        kind: MessageKind,
        attachment: Option<&Attachment>,
    ) -> NotifyOutcome {
        if self.sender.is_none() {
            return NotifyOutcome::Skipped;
        }
        if message.is_empty() && !attachment.is_some_and(Attachment::has_content) {
            tracing::warn!("message empty and no attachment, not sending");
            return NotifyOutcome::Skipped;
        }
        let formatted = self.formats.format(message, kind);
        tracing::debug!(%kind, len = formatted.chars().count(), "message formatted");
        self.post(&webhook::build_payload(formatted, attachment)).await
    }

    /// Send a prebuilt payload.
    pub async fn post(&self, payload: &WebhookPayload) -> NotifyOutcome {
        match &self.sender {
            Some(sender) => sender.send(payload).await.into(),
            None => NotifyOutcome::Skipped,
        }
    }
}
