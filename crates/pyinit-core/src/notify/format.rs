use crate::error::{PyinitError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Maximum characters in a webhook message body.
pub const MAX_MESSAGE_LEN: usize = 2000;
/// Appended to messages cut down to [`MAX_MESSAGE_LEN`].
pub const TRUNCATION_MARKER: &str = "... [CUT]";

const MESSAGE_SLOT: &str = "{message}";

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Default,
    Debug,
    Info,
    Success,
    Fail,
    Warning,
    Error,
    Critical,
    Code,
}

impl MessageKind {
    pub const ALL: [MessageKind; 9] = [
        MessageKind::Default,
        MessageKind::Debug,
        MessageKind::Info,
        MessageKind::Success,
        MessageKind::Fail,
        MessageKind::Warning,
        MessageKind::Error,
        MessageKind::Critical,
        MessageKind::Code,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Default => "default",
            MessageKind::Debug => "debug",
            MessageKind::Info => "info",
            MessageKind::Success => "success",
            MessageKind::Fail => "fail",
            MessageKind::Warning => "warning",
            MessageKind::Error => "error",
            MessageKind::Critical => "critical",
            MessageKind::Code => "code",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = PyinitError;

    fn from_str(s: &str) -> Result<Self> {
        MessageKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                PyinitError::Usage(format!(
                    "unknown message kind '{s}' (expected one of: {})",
                    MessageKind::ALL.map(|k| k.as_str()).join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// MessageFormats
// ---------------------------------------------------------------------------

/// One format string per [`MessageKind`], each with a single `{message}` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFormats {
    formats: BTreeMap<MessageKind, String>,
}

fn validate_format(kind: MessageKind, format: &str) -> Result<()> {
    let slots = format.matches(MESSAGE_SLOT).count();
    if slots != 1 {
        return Err(PyinitError::InvalidFormat {
            kind: kind.to_string(),
            reason: format!("expected exactly one {MESSAGE_SLOT} slot, found {slots}"),
        });
    }
    Ok(())
}

impl MessageFormats {
    /// Default templates; `mention` (e.g. `<@&role>`) prefixes failure kinds.
    pub fn new(mention: &str) -> Self {
        let formats = MessageKind::ALL
            .into_iter()
            .map(|kind| {
                let format = match kind {
                    MessageKind::Default => "{message}".to_string(),
                    MessageKind::Debug => "🛠️ **Debug:** {message}".to_string(),
                    MessageKind::Info => "ℹ️ {message}".to_string(),
                    MessageKind::Success => "✅ {message}".to_string(),
                    MessageKind::Fail => format!("❌ {mention} {{message}}"),
                    MessageKind::Warning => "⚠️ **Warning:** {message}".to_string(),
                    MessageKind::Error => format!("🚨 {mention}**Error:** {{message}}"),
                    MessageKind::Critical => format!("💥 {mention} **Critical:** {{message}}"),
                    MessageKind::Code => "```{message}```".to_string(),
                };
                (kind, format)
            })
            .collect();
        Self { formats }
    }

    /// Replace the template for `kind`, validating its `{message}` slot.
    pub fn with_format(mut self, kind: MessageKind, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        validate_format(kind, &format)?;
        self.formats.insert(kind, format);
        Ok(self)
    }

    pub fn get(&self, kind: MessageKind) -> &str {
        self.formats
            .get(&kind)
            .map(String::as_str)
            .unwrap_or(MESSAGE_SLOT)
    }

    /// Apply the `kind` template to `message` and enforce [`MAX_MESSAGE_LEN`].
    pub fn format(&self, message: &str, kind: MessageKind) -> String {
        let formatted = self.get(kind).replacen(MESSAGE_SLOT, message, 1);
        truncate_message(&formatted, MAX_MESSAGE_LEN)
    }
}

impl Default for MessageFormats {
    fn default() -> Self {
        Self::new("")
    }
}

/// Cut `message` to exactly `max` characters ending in [`TRUNCATION_MARKER`]
/// when it is longer than `max`; otherwise return it unchanged.
pub fn truncate_message(message: &str, max: usize) -> String {
    let len = message.chars().count();
    if len <= max {
        return message.to_string();
    }
    tracing::warn!(len, max, "message exceeds maximum length, truncating");
    let keep = max.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut out: String = message.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in MessageKind::ALL {
            assert_eq!(kind.as_str().parse::<MessageKind>().unwrap(), kind);
        }
        assert!("verbose".parse::<MessageKind>().is_err());
    }

    #[test]
    fn default_formats_cover_every_kind() {
        let formats = MessageFormats::new("<@123>");
        for kind in MessageKind::ALL {
            validate_format(kind, formats.get(kind)).unwrap();
        }
        assert_eq!(formats.format("done", MessageKind::Success), "✅ done");
        assert_eq!(formats.format("x", MessageKind::Code), "```x```");
        assert_eq!(formats.format("boom", MessageKind::Fail), "❌ <@123> boom");
    }

    #[test]
    fn with_format_rejects_missing_or_repeated_slot() {
        let formats = MessageFormats::default();
        assert!(formats.clone().with_format(MessageKind::Info, "no slot").is_err());
        assert!(formats
            .clone()
            .with_format(MessageKind::Info, "{message} {message}")
            .is_err());
        let custom = formats.with_format(MessageKind::Info, "[i] {message}").unwrap();
        assert_eq!(custom.format("hi", MessageKind::Info), "[i] hi");
    }

    #[test]
    fn long_messages_truncate_to_exact_limit() {
        let formats = MessageFormats::default();
        for extra in [1, 10, 5000] {
            let message = "é".repeat(MAX_MESSAGE_LEN + extra);
            let out = formats.format(&message, MessageKind::Default);
            assert_eq!(out.chars().count(), MAX_MESSAGE_LEN);
            assert!(out.ends_with(TRUNCATION_MARKER));
        }
    }

    #[test]
    fn template_overhead_counts_toward_limit() {
        let formats = MessageFormats::default();
        let message = "a".repeat(MAX_MESSAGE_LEN - 1);
        let out = formats.format(&message, MessageKind::Success);
        assert_eq!(out.chars().count(), MAX_MESSAGE_LEN);
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn short_messages_untouched() {
        let message = "a".repeat(MAX_MESSAGE_LEN);
        assert_eq!(truncate_message(&message, MAX_MESSAGE_LEN), message);
    }
}
