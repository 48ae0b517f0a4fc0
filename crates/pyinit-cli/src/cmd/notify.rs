use crate::cmd::{block_on, notifier_from_env, report};
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use pyinit_core::config::{ProcessEnv, CI_WEBHOOK_ENV, WEBHOOK_ENV};
use pyinit_core::notify::attachment::{Attachment, DEFAULT_ATTACHMENT_NAME};
use pyinit_core::notify::deploy::{build_deploy_payload, DeployContext, DeployStatus};
use pyinit_core::notify::format::MessageKind;
use pyinit_core::notify::report::{status_notification, RuntimeMetadata};
use pyinit_core::notify::webhook::{WebhookPayload, CI_ATTEMPT_TIMEOUT, DEFAULT_ATTEMPT_TIMEOUT};
use pyinit_core::notify::NotifyOutcome;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum NotifySubcommand {
    /// Format a message by kind and send it
    Send {
        /// Message text
        message: String,
        /// Message kind (default, debug, info, success, fail, warning, error, critical, code)
        #[arg(long, default_value = "default")]
        kind: MessageKind,
        /// Attach this file's contents
        #[arg(long)]
        attach: Option<PathBuf>,
        /// Attachment file name (default: the attached file's name)
        #[arg(long)]
        attach_name: Option<String>,
        /// Env var holding the webhook URL
        #[arg(long, default_value = WEBHOOK_ENV)]
        webhook_env: String,
    },

    /// Send a function status report; `--error` marks the run as failed
    Status {
        /// Summary of what ran
        message: String,
        /// Error text (full text is attached)
        #[arg(long, conflicts_with = "error_file")]
        error: Option<String>,
        /// Read the error text from a file
        #[arg(long)]
        error_file: Option<PathBuf>,
        #[arg(long, default_value = WEBHOOK_ENV)]
        webhook_env: String,
    },

    /// Build the deployment embed payload from CI environment variables
    DeployPayload {
        /// Deployment result: success or failure
        #[arg(long)]
        status: DeployStatus,
        /// Write the payload here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Post a JSON payload file to the webhook as-is
    Post {
        /// Payload file
        payload: PathBuf,
        #[arg(long, default_value = CI_WEBHOOK_ENV)]
        webhook_env: String,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(subcmd: NotifySubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        NotifySubcommand::Send {
            message,
            kind,
            attach,
            attach_name,
            webhook_env,
        } => send(&message, kind, attach.as_deref(), attach_name, &webhook_env, json),
        NotifySubcommand::Status {
            message,
            error,
            error_file,
            webhook_env,
        } => status(&message, error, error_file.as_deref(), &webhook_env, json),
        NotifySubcommand::DeployPayload { status, output } => deploy_payload(status, output.as_deref()),
        NotifySubcommand::Post {
            payload,
            webhook_env,
        } => post(&payload, &webhook_env, json),
    }
}

fn print_outcome(outcome: NotifyOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&outcome);
    }
    match outcome {
        NotifyOutcome::Skipped => println!("Notification skipped"),
        NotifyOutcome::Sent { attempts } => println!("Notification sent ({attempts} attempt(s))"),
        NotifyOutcome::Failed { attempts } => {
            println!("Notification failed after {attempts} attempt(s)")
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// send
// ---------------------------------------------------------------------------

fn read_attachment(path: &Path, name: Option<String>) -> anyhow::Result<Attachment> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let name = name.unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_ATTACHMENT_NAME.to_string())
    });
    Ok(Attachment::new(String::from_utf8_lossy(&bytes), name))
}

fn send(
    message: &str,
    kind: MessageKind,
    attach: Option<&Path>,
    attach_name: Option<String>,
    webhook_env: &str,
    json: bool,
) -> anyhow::Result<()> {
    let attachment = attach.map(|p| read_attachment(p, attach_name)).transpose()?;
    let notifier = notifier_from_env(webhook_env, DEFAULT_ATTEMPT_TIMEOUT);
    let outcome = report(&notifier, message, kind, attachment.as_ref());
    print_outcome(outcome, json)
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

fn status(
    message: &str,
    error: Option<String>,
    error_file: Option<&Path>,
    webhook_env: &str,
    json: bool,
) -> anyhow::Result<()> {
    let error = match error_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?,
        ),
        None => error,
    };
    let notification = status_notification(message, error.as_deref(), &RuntimeMetadata::from_env(&ProcessEnv));
    let notifier = notifier_from_env(webhook_env, DEFAULT_ATTEMPT_TIMEOUT);
    let outcome = report(
        &notifier,
        &notification.body(),
        notification.kind,
        notification.attachment.as_ref(),
    );

    if json {
        print_json(&serde_json::json!({
            "report": notification.report,
            "notification": outcome,
        }))
    } else {
        print_outcome(outcome, false)
    }
}

// ---------------------------------------------------------------------------
// deploy-payload
// ---------------------------------------------------------------------------

fn deploy_payload(status: DeployStatus, output: Option<&Path>) -> anyhow::Result<()> {
    let ctx = DeployContext::from_env(&ProcessEnv);
    let payload = build_deploy_payload(status, &ctx, chrono::Utc::now());
    match output {
        Some(path) => {
            let text = serde_json::to_string_pretty(&payload)?;
            std::fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))?;
            tracing::info!(path = %path.display(), "deploy payload written");
            Ok(())
        }
        None => print_json(&payload),
    }
}

// ---------------------------------------------------------------------------
// post
// ---------------------------------------------------------------------------

fn post(payload: &Path, webhook_env: &str, json: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(payload)
        .with_context(|| format!("cannot read {}", payload.display()))?;
    let body: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", payload.display()))?;

    let notifier = notifier_from_env(webhook_env, CI_ATTEMPT_TIMEOUT);
    let outcome = block_on(notifier.post(&WebhookPayload::Json(body)))?;
    print_outcome(outcome, json)
}
