//! Embed payloads describing a CI deployment result.

use crate::config::EnvSource;
use crate::error::{PyinitError, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::str::FromStr;

pub const SUCCESS_COLOR: u32 = 3_066_993;
pub const FAILURE_COLOR: u32 = 15_158_332;
/// Characters of the deploy error snippet kept in the embed.
pub const MAX_ERROR_SNIPPET_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStatus {
    Success,
    Failure,
}

impl FromStr for DeployStatus {
    type Err = PyinitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "success" => Ok(DeployStatus::Success),
            "failure" => Ok(DeployStatus::Failure),
            other => Err(PyinitError::Usage(format!(
                "unknown status '{other}' (expected success or failure)"
            ))),
        }
    }
}

/// CI metadata for a deployment, with placeholders for anything unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployContext {
    pub service_name: String,
    pub project_id: String,
    pub commit_sha: String,
    pub commit_msg: String,
    pub test_summary: String,
    pub deploy_duration: String,
    pub actor: String,
    pub repository: String,
    pub ref_name: String,
    pub server_url: String,
    pub run_id: String,
    pub workflow: String,
    pub error_snippet: String,
}

impl DeployContext {
    pub fn from_env(env: &impl EnvSource) -> Self {
        Self {
            service_name: env.var_or("SERVICE_NAME", "Unknown Service"),
            project_id: env.var_or("PROJECT_ID", "Unknown Project"),
            commit_sha: env.var_or("COMMIT_SHA", "Unknown SHA"),
            commit_msg: env.var_or("COMMIT_MSG", "No commit message."),
            test_summary: env.var_or("TEST_SUMMARY", "Test summary unavailable"),
            deploy_duration: env.var_or("DEPLOY_DURATION", "N/A"),
            actor: env.var_or("GITHUB_ACTOR", "Unknown Actor"),
            repository: env.var_or("GITHUB_REPOSITORY", "Unknown Repo"),
            ref_name: env.var_or("GITHUB_REF_NAME", "Unknown Branch"),
            server_url: env.var_or("GITHUB_SERVER_URL", "https://github.com"),
            run_id: env.var_or("GITHUB_RUN_ID", "Unknown Run"),
            workflow: env.var_or("GITHUB_WORKFLOW", "Unknown Workflow"),
            error_snippet: env.var_or(
                "DEPLOY_ERROR_SNIPPET",
                "Error details unavailable. Check logs.",
            ),
        }
    }

    fn short_sha(&self) -> String {
        self.commit_sha.chars().take(7).collect()
    }

    fn commit_title(&self) -> &str {
        self.commit_msg.lines().next().unwrap_or("")
    }

    fn action_url(&self) -> String {
        format!(
            "{}/{}/actions/runs/{}",
            self.server_url, self.repository, self.run_id
        )
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/{}/commit/{}",
            self.server_url, self.repository, self.commit_sha
        )
    }

    fn limited_error(&self) -> String {
        let mut snippet: String = self.error_snippet.chars().take(MAX_ERROR_SNIPPET_LEN).collect();
        if self.error_snippet.chars().count() > MAX_ERROR_SNIPPET_LEN {
            snippet.push_str("\n... (truncated)");
        }
        snippet
    }
}

fn field(name: &str, value: impl Into<String>, inline: bool) -> Value {
    json!({ "name": name, "value": value.into(), "inline": inline })
}

/// Build the `{"content": null, "embeds": [...]}` body for a deploy result.
pub fn build_deploy_payload(status: DeployStatus, ctx: &DeployContext, now: DateTime<Utc>) -> Value {
    let commit = format!(
        "[`{}`]({}) - `{}`",
        ctx.short_sha(),
        ctx.commit_url(),
        ctx.commit_title()
    );
    let footer = format!("{} | {}", ctx.repository, ctx.workflow);

    let (title, description, color, fields) = match status {
        DeployStatus::Success => (
            format!("✅ Deployment Successful: `{}`", ctx.service_name),
            format!("Deployment to project `{}` completed successfully.", ctx.project_id),
            SUCCESS_COLOR,
            vec![
                field("🧪 Tests", ctx.test_summary.clone(), false),
                field("⚙️ Commit", commit, false),
                field("👤 Triggered by", ctx.actor.clone(), true),
                field("🌿 Branch", ctx.ref_name.clone(), true),
                field("⏱️ Deploy Duration", format!("{}s", ctx.deploy_duration), true),
                field("📄 Workflow Run", format!("[View Logs]({})", ctx.action_url()), false),
            ],
        ),
        DeployStatus::Failure => (
            format!("❌ Deployment Failed: `{}`", ctx.service_name),
            format!("Deployment to project `{}` **FAILED**.", ctx.project_id),
            FAILURE_COLOR,
            vec![
                field("⚙️ Commit", commit, false),
                field("👤 Triggered by", ctx.actor.clone(), true),
                field("🌿 Branch", ctx.ref_name.clone(), true),
                field("📄 Workflow Run", format!("[View Full Logs]({})", ctx.action_url()), false),
                field("❗ Error Snippet", format!("```\n{}\n```", ctx.limited_error()), false),
            ],
        ),
    };

    json!({
        "content": null,
        "embeds": [{
            "title": title,
            "description": description,
            "color": color,
            "fields": fields,
            "footer": { "text": footer },
            "timestamp": now.to_rfc3339(),
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn success_embed_fields() {
        let ctx = DeployContext::from_env(&env(&[
            ("SERVICE_NAME", "scraper"),
            ("COMMIT_SHA", "0123456789abcdef"),
            ("COMMIT_MSG", "Fix parser\n\nlong body"),
            ("GITHUB_REPOSITORY", "acme/scraper"),
            ("GITHUB_RUN_ID", "42"),
            ("DEPLOY_DURATION", "93"),
        ]));
        let payload = build_deploy_payload(DeployStatus::Success, &ctx, now());

        assert!(payload["content"].is_null());
        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"], "✅ Deployment Successful: `scraper`");
        assert_eq!(embed["color"], SUCCESS_COLOR);
        assert_eq!(embed["footer"]["text"], "acme/scraper | Unknown Workflow");
        assert_eq!(embed["timestamp"], "2025-03-01T12:00:00+00:00");
        let fields = embed["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 6);
        assert_eq!(
            fields[1]["value"],
            "[`0123456`](https://github.com/acme/scraper/commit/0123456789abcdef) - `Fix parser`"
        );
        assert_eq!(fields[4]["value"], "93s");
        assert_eq!(
            fields[5]["value"],
            "[View Logs](https://github.com/acme/scraper/actions/runs/42)"
        );
    }

    #[test]
    fn failure_embed_truncates_snippet() {
        let long = "e".repeat(1500);
        let ctx = DeployContext::from_env(&env(&[("DEPLOY_ERROR_SNIPPET", &long)]));
        let payload = build_deploy_payload(DeployStatus::Failure, &ctx, now());

        let embed = &payload["embeds"][0];
        assert_eq!(embed["color"], FAILURE_COLOR);
        assert_eq!(embed["title"], "❌ Deployment Failed: `Unknown Service`");
        let snippet = embed["fields"][4]["value"].as_str().unwrap();
        assert!(snippet.contains("\n... (truncated)"));
        assert_eq!(snippet.matches('e').count(), 1000 + 1);
    }

    #[test]
    fn status_parsing() {
        assert_eq!("success".parse::<DeployStatus>().unwrap(), DeployStatus::Success);
        assert!("skipped".parse::<DeployStatus>().is_err());
    }
}
