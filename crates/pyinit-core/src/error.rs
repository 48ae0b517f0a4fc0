use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PyinitError {
    #[error("network error for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("could not locate '{marker}' in extracted archive content")]
    ContentRootNotFound { marker: String },

    #[error("failed processing {}: {reason}", path.display())]
    FileProcessing { path: PathBuf, reason: String },

    #[error("{errors} file(s) failed to process")]
    RenderFailed { errors: usize },

    #[error("failed to parse {}: {reason}", path.display())]
    ConfigParse { path: PathBuf, reason: String },

    #[error("usage: {0}")]
    Usage(String),

    #[error("invalid placeholder name '{0}': must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidPlaceholder(String),

    #[error("invalid message format for '{kind}': {reason}")]
    InvalidFormat { kind: String, reason: String },

    #[error("command failed: {0}")]
    Command(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlSerialize(#[from] toml::ser::Error),
}

impl From<zip::result::ZipError> for PyinitError {
    fn from(e: zip::result::ZipError) -> Self {
        PyinitError::Archive(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PyinitError>;
