pub mod ci;
pub mod init;
pub mod notify;
pub mod render;

use anyhow::Context;
use pyinit_core::config::{EnvSource, ProcessEnv};
use pyinit_core::notify::attachment::Attachment;
use pyinit_core::notify::format::MessageKind;
use pyinit_core::notify::{Notifier, NotifyOutcome};
use std::future::Future;
use std::time::Duration;

/// Drive `fut` to completion on the current runtime, or a fresh one when
/// called outside tokio.
pub fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    match tokio::runtime::Handle::try_current() {
        // Already inside a runtime (e.g. an async test harness)
        Ok(handle) => Ok(tokio::task::block_in_place(|| handle.block_on(fut))),
        Err(_) => {
            tracing::debug!("using new tokio runtime");
            let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
            Ok(rt.block_on(fut))
        }
    }
}

/// Notifier for the webhook in `webhook_var`. A client that cannot be
/// built disables notifications instead of failing the command.
pub fn notifier_from_env(webhook_var: &str, attempt_timeout: Duration) -> Notifier {
    notifier_from(&ProcessEnv, webhook_var, attempt_timeout)
}

fn notifier_from(env: &impl EnvSource, webhook_var: &str, attempt_timeout: Duration) -> Notifier {
    match Notifier::from_env(env, webhook_var, attempt_timeout) {
        Ok(notifier) => notifier,
        Err(e) => {
            tracing::warn!(error = %e, "could not build webhook client, notifications disabled");
            Notifier::disabled()
        }
    }
}

/// Send one notification and log the outcome. Never fails.
pub fn report(
    notifier: &Notifier,
    message: &str,
    kind: MessageKind,
    attachment: Option<&Attachment>,
) -> NotifyOutcome {
    let outcome = match block_on(notifier.notify(message, kind, attachment)) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "notification not sent");
            return NotifyOutcome::Skipped;
        }
    };
    match outcome {
        NotifyOutcome::Sent { attempts } => tracing::info!(attempts, %kind, "notification sent"),
        NotifyOutcome::Failed { attempts } => {
            tracing::warn!(attempts, %kind, "notification failed after all attempts")
        }
        NotifyOutcome::Skipped => tracing::debug!(%kind, "notification skipped"),
    }
    outcome
}
