use crate::cmd::{notifier_from_env, report};
use crate::output::{print_fields, print_json};
use anyhow::Context;
use pyinit_core::bootstrap::{self, PipelineSummary};
use pyinit_core::config::InitConfig;
use pyinit_core::notify::attachment::Attachment;
use pyinit_core::notify::format::MessageKind;
use pyinit_core::notify::NotifyOutcome;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct InitOutput<'a> {
    #[serde(flatten)]
    summary: &'a PipelineSummary,
    notification: NotifyOutcome,
}

pub fn run(target: &Path, url: String, marker: Option<String>, json: bool) -> anyhow::Result<()> {
    let cfg = InitConfig {
        template_url: url,
        content_marker: marker,
        ..InitConfig::default()
    };
    let notifier = notifier_from_env(&cfg.webhook_env, cfg.attempt_timeout);

    let result = bootstrap::run_pipeline(&cfg, target)
        .with_context(|| format!("failed to initialize project from {}", cfg.template_url));

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            let log = Attachment::new(format!("{e:?}"), "init_error.log");
            report(
                &notifier,
                &format!("Project initialization failed: {e}"),
                MessageKind::Error,
                Some(&log),
            );
            return Err(e);
        }
    };

    let notification = report(
        &notifier,
        &format!(
            "Project `{}` initialized ({} files processed)",
            summary.apply.project_name, summary.apply.render.processed
        ),
        MessageKind::Success,
        None,
    );

    if json {
        print_json(&InitOutput {
            summary: &summary,
            notification,
        })?;
    } else {
        println!(
            "Initialized project '{}' in {}",
            summary.apply.project_name,
            summary.apply.target.display()
        );
        print_fields(&[
            ("template", summary.template_url.clone()),
            ("archive", format!("{} bytes, {} files", summary.archive_bytes, summary.extracted_files)),
            (
                "files",
                format!(
                    "{} processed ({} rendered, {} skipped)",
                    summary.apply.render.processed,
                    summary.apply.render.rendered,
                    summary.apply.render.skipped
                ),
            ),
            ("manifest", summary.apply.manifest.path.display().to_string()),
        ]);
    }
    Ok(())
}

/// `--clean`: drop the bootstrap helper packages. Failures are logged only.
pub fn clean(target: &Path) -> anyhow::Result<()> {
    let cfg = InitConfig::default();
    match bootstrap::cleanup_packages(&cfg.cleanup_packages, target) {
        Ok(true) => tracing::info!("cleanup finished"),
        Ok(false) => tracing::warn!("cleanup did not complete"),
        Err(e) => tracing::error!(error = %e, "cleanup failed"),
    }
    Ok(())
}
