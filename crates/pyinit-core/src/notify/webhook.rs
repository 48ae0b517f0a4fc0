use super::attachment::{Attachment, PreparedAttachment};
use super::format::{truncate_message, MAX_MESSAGE_LEN};
use crate::error::{PyinitError, Result};
use serde_json::{json, Value};
use std::time::Duration;

/// Attempts made per send before giving up.
pub const MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-attempt timeout for prebuilt CI payloads (`notify post`).
pub const CI_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);

const ATTACH_FAILED_NOTE: &str = "\n\n⚠️ *Failed to attach error log.*";

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Request body for one webhook post.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookPayload {
    /// Plain JSON body.
    Json(Value),
    /// `payload_json` form field plus a `file` part.
    Multipart {
        payload_json: Value,
        file: PreparedAttachment,
    },
}

impl WebhookPayload {
    pub fn content(&self) -> Option<&str> {
        match self {
            WebhookPayload::Json(v) | WebhookPayload::Multipart { payload_json: v, .. } => {
                v.get("content").and_then(Value::as_str)
            }
        }
    }
}

/// Build the request body for an already formatted message.
///
/// A usable attachment turns the body into multipart. An attachment with
/// content that cannot be prepared is replaced by a note in the message.
pub fn build_payload(formatted: String, attachment: Option<&Attachment>) -> WebhookPayload {
    let Some(attachment) = attachment.filter(|a| a.has_content()) else {
        return WebhookPayload::Json(json!({ "content": formatted }));
    };

    match attachment.prepare() {
        Ok(file) => WebhookPayload::Multipart {
            payload_json: json!({ "content": formatted }),
            file,
        },
        Err(e) => {
            tracing::warn!(error = %e, "attachment preparation failed, inlining note");
            let content = truncate_message(&(formatted + ATTACH_FAILED_NOTE), MAX_MESSAGE_LEN);
            WebhookPayload::Json(json!({ "content": content }))
        }
    }
}

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent { attempts: u32, status: u16 },
    Failed { attempts: u32 },
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent { .. })
    }
}

/// Posts payloads to one webhook URL with a bounded, immediate retry loop.
#[derive(Debug, Clone)]
pub struct WebhookSender {
    client: reqwest::Client,
    url: String,
    max_attempts: u32,
}

impl WebhookSender {
    pub fn new(url: impl Into<String>, attempt_timeout: Duration) -> Result<Self> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(attempt_timeout)
            .build()
            .map_err(|e| PyinitError::Network {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            url,
            max_attempts: MAX_ATTEMPTS,
        })
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Post `payload`, retrying failed attempts without delay.
    ///
    /// Never returns an error: exhaustion is reported as [`SendOutcome::Failed`].
    pub async fn send(&self, payload: &WebhookPayload) -> SendOutcome {
        for attempt in 1..=self.max_attempts {
            match self.attempt(payload).await {
                Ok(status) => {
                    tracing::debug!(attempt, status, "webhook message sent");
                    return SendOutcome::Sent {
                        attempts: attempt,
                        status,
                    };
                }
                Err(reason) => {
                    tracing::warn!(attempt, max = self.max_attempts, %reason, "webhook attempt failed");
                }
            }
        }
        tracing::warn!(attempts = self.max_attempts, "giving up on webhook notification");
        SendOutcome::Failed {
            attempts: self.max_attempts,
        }
    }

    async fn attempt(&self, payload: &WebhookPayload) -> std::result::Result<u16, String> {
        let request = self.client.post(&self.url);
        let request = match payload {
            WebhookPayload::Json(body) => request.json(body),
            WebhookPayload::Multipart { payload_json, file } => {
                let part = reqwest::multipart::Part::bytes(file.bytes().to_vec())
                    .file_name(file.filename().to_string())
                    .mime_str(file.mime())
                    .map_err(|e| e.to_string())?;
                let form = reqwest::multipart::Form::new()
                    .text("payload_json", payload_json.to_string())
                    .part("file", part);
                request.multipart(form)
            }
        };

        let response = request.send().await.map_err(|e| format!("network error: {e}"))?;
        let status = response.status();
        if status.is_success() {
            return Ok(status.as_u16());
        }
        let body = response.text().await.unwrap_or_default();
        Err(format!("HTTP {}: {}", status.as_u16(), body.trim()))
    }
}
