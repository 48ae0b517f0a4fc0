//! Render context: the key/value mapping that drives template substitution.

use crate::error::{PyinitError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// Key under which the target directory name is exposed to templates.
pub const NAME_KEY: &str = "NAME";

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

pub fn validate_placeholder(key: &str) -> Result<()> {
    if !placeholder_re().is_match(key) {
        return Err(PyinitError::InvalidPlaceholder(key.to_string()));
    }
    Ok(())
}

/// Flat string-to-string mapping handed to the renderer.
///
/// Built once per run; after construction only shared borrows are handed
/// out, so the renderer cannot mutate it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    values: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from `(key, value)` pairs, rejecting invalid keys.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut ctx = Self::new();
        for (k, v) in pairs {
            ctx.insert(k, v)?;
        }
        Ok(ctx)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        validate_placeholder(&key)?;
        self.values.insert(key, value.into());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Load a context for `project_name` from a dotenv-style config file.
    ///
    /// `NAME` defaults to `project_name` unless the file sets it. A missing
    /// file is not an error; an unreadable or malformed one is logged and
    /// ignored so the run can continue with the name alone. Entries with
    /// keys that are not valid placeholders are skipped with a warning.
    pub fn load(config_path: &Path, project_name: &str) -> Self {
        let mut ctx = Self::new();
        ctx.values
            .insert(NAME_KEY.to_string(), project_name.to_string());

        if !config_path.is_file() {
            tracing::warn!(
                path = %config_path.display(),
                "context file not found, using project name only"
            );
            return ctx;
        }

        tracing::info!(path = %config_path.display(), "loading template context");
        let iter = match dotenvy::from_path_iter(config_path) {
            Ok(iter) => iter,
            Err(e) => {
                tracing::error!(path = %config_path.display(), error = %e, "cannot read context file");
                return ctx;
            }
        };

        let mut loaded = BTreeMap::new();
        for item in iter {
            match item {
                Ok((key, value)) => {
                    if validate_placeholder(&key).is_err() {
                        tracing::warn!(key = %key, "skipping context key that is not a valid placeholder");
                        continue;
                    }
                    loaded.insert(key, value);
                }
                Err(e) => {
                    let err = PyinitError::ConfigParse {
                        path: config_path.to_path_buf(),
                        reason: e.to_string(),
                    };
                    tracing::error!(error = %err, "ignoring context file");
                    return ctx;
                }
            }
        }

        // File entries override the directory-derived NAME.
        ctx.values.extend(loaded);
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn valid_placeholders() {
        for key in ["NAME", "_private", "project_id", "A1"] {
            validate_placeholder(key).unwrap_or_else(|_| panic!("expected valid: {key}"));
        }
    }

    #[test]
    fn invalid_placeholders() {
        for key in ["", "1abc", "has space", "dash-key", "dotted.key"] {
            assert!(validate_placeholder(key).is_err(), "expected invalid: {key}");
        }
    }

    #[test]
    fn from_pairs_rejects_bad_key() {
        let err = RenderContext::from_pairs([("NAME", "demo"), ("bad-key", "x")]).unwrap_err();
        assert!(matches!(err, PyinitError::InvalidPlaceholder(k) if k == "bad-key"));
    }

    #[test]
    fn load_without_file_has_name_only() {
        let dir = TempDir::new().unwrap();
        let ctx = RenderContext::load(&dir.path().join("project.env"), "demo");
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get("NAME"), Some("demo"));
    }

    #[test]
    fn load_reads_dotenv_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("project.env");
        std::fs::write(
            &path,
            "# comment\nPROJECT_ID=my-project\nREGION=\"europe-north1\"\n",
        )
        .unwrap();
        let ctx = RenderContext::load(&path, "demo");
        assert_eq!(ctx.get("NAME"), Some("demo"));
        assert_eq!(ctx.get("PROJECT_ID"), Some("my-project"));
        assert_eq!(ctx.get("REGION"), Some("europe-north1"));
    }
}
