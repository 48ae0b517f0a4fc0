//! Status report for a function invocation, sent as a webhook message.

use super::attachment::Attachment;
use super::format::MessageKind;
use crate::config::EnvSource;
use serde::Serialize;

/// Characters of the error tail shown inline; the full text is attached.
pub const MAX_VISIBLE_ERROR_LEN: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeMetadata {
    pub region: Option<String>,
    pub service: Option<String>,
    pub revision: Option<String>,
    pub target_function: Option<String>,
}

impl RuntimeMetadata {
    pub fn from_env(env: &impl EnvSource) -> Self {
        Self {
            region: env.var("REGION"),
            service: env.var("K_SERVICE"),
            revision: env.var("K_REVISION"),
            target_function: env.var("FUNCTION_TARGET"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub status: Status,
    pub message: String,
    pub region: Option<String>,
    pub service: Option<String>,
    pub revision: Option<String>,
    #[serde(rename = "target-function")]
    pub target_function: Option<String>,
    pub error: String,
}

/// A report plus how it should be sent.
#[derive(Debug, Clone)]
pub struct StatusNotification {
    pub report: StatusReport,
    pub kind: MessageKind,
    pub attachment: Option<Attachment>,
}

impl StatusNotification {
    /// JSON message body for the webhook.
    pub fn body(&self) -> String {
        serde_json::to_string(&self.report).unwrap_or_else(|_| self.report.message.clone())
    }
}

fn visible_error(error: &str) -> String {
    let len = error.chars().count();
    if len > MAX_VISIBLE_ERROR_LEN {
        let tail: String = error.chars().skip(len - MAX_VISIBLE_ERROR_LEN).collect();
        format!("... (Full log attached)\n```\n{tail}\n```")
    } else {
        format!("(Full log attached)\n```\n{error}\n```")
    }
}

/// Build the status notification for an operation that ended with
/// `error` (or succeeded when `None`).
pub fn status_notification(
    message: &str,
    error: Option<&str>,
    meta: &RuntimeMetadata,
) -> StatusNotification {
    let (status, kind, error_field, attachment) = match error {
        Some(error) => {
            let service = meta.service.as_deref().unwrap_or("app");
            (
                Status::Failed,
                MessageKind::Error,
                visible_error(error),
                Some(Attachment::new(error, format!("{service}_error.log"))),
            )
        }
        None => (Status::Ok, MessageKind::Success, String::new(), None),
    };

    StatusNotification {
        report: StatusReport {
            status,
            message: message.to_string(),
            region: meta.region.clone(),
            service: meta.service.clone(),
            revision: meta.revision.clone(),
            target_function: meta.target_function.clone(),
            error: error_field,
        },
        kind,
        attachment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn meta() -> RuntimeMetadata {
        let env: BTreeMap<String, String> = [
            ("REGION", "europe-north1"),
            ("K_SERVICE", "scraper"),
            ("FUNCTION_TARGET", "main"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        RuntimeMetadata::from_env(&env)
    }

    #[test]
    fn success_report_has_no_attachment() {
        let n = status_notification("scraped 10 pages", None, &meta());
        assert_eq!(n.kind, MessageKind::Success);
        assert!(n.attachment.is_none());
        let body: serde_json::Value = serde_json::from_str(&n.body()).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["target-function"], "main");
        assert_eq!(body["revision"], serde_json::Value::Null);
        assert_eq!(body["error"], "");
    }

    #[test]
    fn failure_attaches_full_error_and_shows_tail() {
        let error = format!("{}END", "x".repeat(3000));
        let n = status_notification("scrape", Some(&error), &meta());
        assert_eq!(n.kind, MessageKind::Error);
        assert_eq!(n.report.status, Status::Failed);
        let att = n.attachment.as_ref().unwrap();
        assert_eq!(att.filename, "scraper_error.log");
        assert_eq!(att.content.as_deref(), Some(error.as_str()));
        assert!(n.report.error.starts_with("... (Full log attached)"));
        assert!(n.report.error.contains("END\n```"));
    }

    #[test]
    fn short_error_shown_whole_with_default_service() {
        let n = status_notification("op", Some("boom"), &RuntimeMetadata::default());
        assert_eq!(n.report.error, "(Full log attached)\n```\nboom\n```");
        assert_eq!(n.attachment.unwrap().filename, "app_error.log");
    }
}
