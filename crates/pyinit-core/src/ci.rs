//! GitHub Actions helpers: test summaries and env-file export.

use crate::error::{PyinitError, Result};
use crate::io;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_SUMMARY: &str = "Test summary unavailable";
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";
pub const GITHUB_ENV_ENV: &str = "GITHUB_ENV";

static SUMMARY_RE: OnceLock<Regex> = OnceLock::new();

fn summary_re() -> &'static Regex {
    SUMMARY_RE.get_or_init(|| {
        Regex::new(r"=?\s*(\d+\s+(?:passed|failed|skipped|error|warning)[s,]*.*?in\s+[\d.]+s)\s*=?")
            .unwrap()
    })
}

/// Last pytest summary line in `log` (e.g. `3 passed, 1 skipped in 0.52s`).
pub fn find_pytest_summary(log: &str) -> Option<String> {
    log.lines()
        .rev()
        .find_map(|line| summary_re().captures(line))
        .map(|caps| caps[1].trim().to_string())
}

/// Summary for the log at `path`, falling back to [`DEFAULT_SUMMARY`].
pub fn summarize_log(path: &Path) -> String {
    if !path.is_file() {
        tracing::warn!(path = %path.display(), "log file not found");
        return DEFAULT_SUMMARY.to_string();
    }
    match std::fs::read(path) {
        Ok(bytes) => find_pytest_summary(&String::from_utf8_lossy(&bytes))
            .unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "cannot read log file");
            format!("Error extracting summary: {e}")
        }
    }
}

fn delimiter(prefix: &str) -> String {
    format!("{prefix}_{:08x}", rand::random::<u32>())
}

/// `name<<DELIM\nvalue\nDELIM\n`, the multi-line form GitHub accepts in
/// `GITHUB_OUTPUT` and `GITHUB_ENV`.
pub fn heredoc_entry(name: &str, value: &str, prefix: &str) -> String {
    let delim = delimiter(prefix);
    format!("{name}<<{delim}\n{value}\n{delim}\n")
}

/// Append `summary_line` to a GitHub output file.
pub fn write_summary_output(output_file: &Path, summary: &str) -> Result<()> {
    io::append_text(
        output_file,
        &heredoc_entry("summary_line", summary, "EOF_SUMMARY"),
    )
}

// ---------------------------------------------------------------------------
// Env file export
// ---------------------------------------------------------------------------

/// Parse a dotenv file into ordered `(key, value)` pairs.
pub fn parse_env_file(path: &Path) -> Result<Vec<(String, String)>> {
    if !path.is_file() {
        return Err(PyinitError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("missing {}", path.display()),
        )));
    }
    let iter = dotenvy::from_path_iter(path).map_err(|e| PyinitError::ConfigParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    iter.map(|item| {
        item.map_err(|e| PyinitError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    })
    .collect()
}

/// Lines appended to `GITHUB_ENV` for `vars`.
pub fn github_env_block(vars: &[(String, String)]) -> String {
    vars.iter()
        .map(|(k, v)| {
            if v.contains('\n') {
                heredoc_entry(k, v, &format!("EOF_{k}"))
            } else {
                format!("{k}={v}\n")
            }
        })
        .collect()
}

/// Comma-separated `KEY=VALUE` list for `gcloud --set-env-vars`.
pub fn gcloud_env_string(vars: &[(String, String)]) -> String {
    vars.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Lines appended to `GITHUB_OUTPUT` for `vars`.
pub fn gcloud_output_block(vars: &[(String, String)]) -> String {
    let mut block = heredoc_entry("gcloud_env_string", &gcloud_env_string(vars), "EOF_GCLOUD_ENV");
    block.push_str("gcloud_vars_generated=true\n");
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn finds_last_summary_line() {
        let log = "\
============ test session starts ============
tests/test_a.py ..s
==== 1 failed, 2 passed in 3.10s ====
rerun
======== 2 passed, 1 skipped, 1 warning in 0.06s =========
";
        assert_eq!(
            find_pytest_summary(log).as_deref(),
            Some("2 passed, 1 skipped, 1 warning in 0.06s")
        );
    }

    #[test]
    fn plain_summary_line() {
        assert_eq!(
            find_pytest_summary("10 passed in 1.23s").as_deref(),
            Some("10 passed in 1.23s")
        );
        assert_eq!(find_pytest_summary("no tests ran"), None);
    }

    #[test]
    fn missing_log_uses_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(summarize_log(&dir.path().join("nope.log")), DEFAULT_SUMMARY);
    }

    #[test]
    fn summary_written_as_heredoc() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("output");
        write_summary_output(&out, "4 passed in 0.1s").unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let delim = lines[0].strip_prefix("summary_line<<").unwrap();
        assert!(delim.starts_with("EOF_SUMMARY_"));
        assert_eq!(lines[1], "4 passed in 0.1s");
        assert_eq!(lines[2], delim);
    }

    #[test]
    fn parses_env_file_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("project.env");
        std::fs::write(
            &path,
            "# deploy settings\nSERVICE_NAME=scraper\nREGION='europe-north1'\nTIMEOUT=\"540\"\n",
        )
        .unwrap();

        let vars = parse_env_file(&path).unwrap();

        assert_eq!(vars.len(), 3);
        assert_eq!(vars[0], ("SERVICE_NAME".to_string(), "scraper".to_string()));
        assert_eq!(vars[1].1, "europe-north1");
        assert_eq!(vars[2].1, "540");
        assert_eq!(
            gcloud_env_string(&vars),
            "SERVICE_NAME=scraper,REGION=europe-north1,TIMEOUT=540"
        );
    }

    #[test]
    fn multiline_values_use_heredoc() {
        let vars = vec![
            ("SERVICE_NAME".to_string(), "scraper".to_string()),
            ("NOTE".to_string(), "line1\nline2".to_string()),
        ];
        let block = github_env_block(&vars);
        assert!(block.starts_with("SERVICE_NAME=scraper\nNOTE<<EOF_NOTE_"));
        assert!(block.contains("\nline1\nline2\nEOF_NOTE_"));
        assert!(gcloud_output_block(&vars).ends_with("gcloud_vars_generated=true\n"));
    }

    #[test]
    fn missing_env_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(parse_env_file(&dir.path().join("project.env")).is_err());
    }
}
