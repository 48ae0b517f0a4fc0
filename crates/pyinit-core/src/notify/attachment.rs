use thiserror::Error;

pub const DEFAULT_ATTACHMENT_NAME: &str = "details.log";
pub const ATTACHMENT_MIME: &str = "text/plain";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("attachment has no content")]
    Empty,

    #[error("invalid attachment filename '{0}'")]
    InvalidFilename(String),
}

/// Text content to send as a file next to a webhook message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub content: Option<String>,
    pub filename: String,
}

impl Attachment {
    pub fn new(content: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            filename: filename.into(),
        }
    }

    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Encode the content for upload.
    pub fn prepare(&self) -> Result<PreparedAttachment, AttachmentError> {
        let content = self
            .content
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(AttachmentError::Empty)?;
        if self.filename.trim().is_empty() || self.filename.contains(['/', '\\']) {
            return Err(AttachmentError::InvalidFilename(self.filename.clone()));
        }
        Ok(PreparedAttachment {
            filename: self.filename.clone(),
            bytes: content.as_bytes().to_vec(),
        })
    }
}

impl Default for Attachment {
    fn default() -> Self {
        Self {
            content: None,
            filename: DEFAULT_ATTACHMENT_NAME.to_string(),
        }
    }
}

/// Encoded attachment ready to become a multipart `file` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedAttachment {
    filename: String,
    bytes: Vec<u8>,
}

impl PreparedAttachment {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &'static str {
        ATTACHMENT_MIME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_missing_content_fails() {
        assert_eq!(Attachment::default().prepare(), Err(AttachmentError::Empty));
        assert_eq!(
            Attachment::new("", "err.log").prepare(),
            Err(AttachmentError::Empty)
        );
    }

    #[test]
    fn prepared_bytes_decode_to_content() {
        for content in ["x", "Traceback (most recent call last):\n  ...", "åäö 🚨\r\n\0tail"] {
            let prepared = Attachment::new(content, "svc_error.log").prepare().unwrap();
            assert_eq!(std::str::from_utf8(prepared.bytes()).unwrap(), content);
            assert_eq!(prepared.filename(), "svc_error.log");
            assert_eq!(prepared.mime(), "text/plain");
        }
    }

    #[test]
    fn path_like_filenames_rejected() {
        for name in ["", "  ", "../etc/passwd", "dir\\file.log"] {
            assert!(matches!(
                Attachment::new("data", name).prepare(),
                Err(AttachmentError::InvalidFilename(_))
            ));
        }
    }
}
