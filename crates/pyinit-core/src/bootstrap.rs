//! The bootstrap pipeline: fetch → extract → locate → render → manifest.
//!
//! The temporary workspace is a [`tempfile::TempDir`] owned by
//! [`run_pipeline`]; it is removed when that function returns, whether the
//! run succeeded, failed, or panicked.

use crate::config::InitConfig;
use crate::context::RenderContext;
use crate::error::{PyinitError, Result};
use crate::manifest::{update_manifest, ManifestUpdate};
use crate::render::{RenderReport, Renderer};
use crate::{archive, fetch, io, paths};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of applying a template directory to a target.
#[derive(Debug, Clone, Serialize)]
pub struct ApplySummary {
    pub project_name: String,
    pub target: PathBuf,
    pub context_keys: usize,
    pub render: RenderReport,
    pub manifest: ManifestUpdate,
    pub live_template_removed: bool,
}

/// Result of a full bootstrap run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub template_url: String,
    pub archive_bytes: u64,
    pub extracted_files: usize,
    #[serde(flatten)]
    pub apply: ApplySummary,
}

/// Download, extract, and apply the configured template to `target`.
pub fn run_pipeline(cfg: &InitConfig, target: &Path) -> Result<PipelineSummary> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(paths::WORKSPACE_PREFIX);
    let workspace = match &cfg.workspace_parent {
        Some(parent) => builder.tempdir_in(parent)?,
        None => builder.tempdir()?,
    };
    tracing::info!(path = %workspace.path().display(), "created temporary workspace");

    let result = run_in_workspace(cfg, target, workspace.path());

    let workspace_path = workspace.path().to_path_buf();
    match workspace.close() {
        Ok(()) => tracing::debug!(path = %workspace_path.display(), "removed temporary workspace"),
        Err(e) => tracing::warn!(
            path = %workspace_path.display(),
            error = %e,
            "could not remove temporary workspace"
        ),
    }
    result
}

fn run_in_workspace(cfg: &InitConfig, target: &Path, workspace: &Path) -> Result<PipelineSummary> {
    let zip_path = workspace.join(paths::ARCHIVE_FILE);
    let extract_dir = workspace.join(paths::EXTRACT_DIR);
    io::ensure_dir(&extract_dir)?;

    let archive_bytes = fetch::download(&cfg.template_url, &zip_path, cfg.download_timeout)?;
    let extracted_files = archive::extract(&zip_path, &extract_dir)?;
    let content_root = archive::locate_content_root(&extract_dir, cfg.content_marker.as_deref())?;
    let apply = apply_template(cfg, &content_root, target)?;

    Ok(PipelineSummary {
        template_url: cfg.template_url.clone(),
        archive_bytes,
        extracted_files,
        apply,
    })
}

/// Render `content_root` into `target`, merge tool config into the
/// manifest, and drop a leftover `live_template.py`.
///
/// The render context comes from `project.env` in `target` when present,
/// otherwise from `project.env` in `content_root`. Returns
/// [`PyinitError::RenderFailed`] after finishing every step if any file
/// failed to process. A `target` equal to or inside `content_root` is
/// rejected with [`PyinitError::Usage`] before anything is written.
pub fn apply_template(cfg: &InitConfig, content_root: &Path, target: &Path) -> Result<ApplySummary> {
    io::ensure_dir(target)?;
    let target = target.canonicalize()?;
    let source = content_root.canonicalize()?;
    if target.starts_with(&source) {
        return Err(PyinitError::Usage(format!(
            "target {} is inside template source {}",
            target.display(),
            source.display()
        )));
    }
    let project_name = io::dir_name(&target, "project");
    tracing::info!(project = %project_name, "starting project initialization");

    let context_file = [paths::context_path(&target), paths::context_path(content_root)]
        .into_iter()
        .find(|p| p.is_file())
        .unwrap_or_else(|| paths::context_path(&target));
    let ctx = RenderContext::load(&context_file, &project_name);

    let render = Renderer::new(&ctx, cfg.render.clone()).render_tree(content_root, &target);
    let manifest = update_manifest(&target, &cfg.tools)?;

    let live_template = paths::live_template_path(&target);
    let live_template_removed = match io::remove_if_exists(&live_template) {
        Ok(removed) => removed,
        Err(e) => {
            tracing::warn!(path = %live_template.display(), error = %e, "could not remove live template");
            false
        }
    };

    if !render.is_clean() {
        return Err(PyinitError::RenderFailed {
            errors: render.errors,
        });
    }

    Ok(ApplySummary {
        project_name,
        target,
        context_keys: ctx.len(),
        render,
        manifest,
        live_template_removed,
    })
}

/// Remove the helper packages the bootstrap added, via `uv remove`.
///
/// Missing `uv` or a failing command is logged and reported as `Ok(false)`.
pub fn cleanup_packages(packages: &[String], target: &Path) -> Result<bool> {
    if packages.is_empty() {
        return Ok(true);
    }
    let Ok(uv) = which::which("uv") else {
        tracing::warn!("'uv' not found on PATH, skipping package cleanup");
        return Ok(false);
    };

    tracing::info!(packages = %packages.join(" "), "running cleanup");
    let output = std::process::Command::new(uv)
        .arg("remove")
        .args(packages)
        .current_dir(target)
        .output()
        .map_err(|e| PyinitError::Command(format!("uv remove: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
        tracing::info!(output = %stdout.trim(), "uv remove");
    }
    if !stderr.trim().is_empty() {
        tracing::warn!(stderr = %stderr.trim(), "uv remove");
    }
    if !output.status.success() {
        tracing::error!(status = %output.status, "uv remove failed");
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn template_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn config_for(url: String) -> InitConfig {
        InitConfig {
            template_url: url,
            ..InitConfig::default()
        }
    }

    #[test]
    fn archive_scenario_renders_and_copies() {
        let body = template_zip(&[
            ("proj-main/a.txt", "keep {{ NAME }} literal"),
            ("proj-main/b.txt.j2", "project: {{ NAME }}"),
        ]);
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/main.zip")
            .with_status(200)
            .with_body(body)
            .create();
        let parent = TempDir::new().unwrap();
        let target = parent.path().join("demo");

        let summary = run_pipeline(&config_for(format!("{}/main.zip", server.url())), &target).unwrap();

        assert_eq!(summary.extracted_files, 2);
        assert_eq!(summary.apply.project_name, "demo");
        assert_eq!(summary.apply.render.processed, 2);
        assert_eq!(
            std::fs::read_to_string(target.join("a.txt")).unwrap(),
            "keep {{ NAME }} literal"
        );
        assert_eq!(
            std::fs::read_to_string(target.join("b.txt")).unwrap(),
            "project: demo"
        );
        assert!(!target.join("b.txt.j2").exists());
        assert!(target.join("pyproject.toml").is_file());
    }

    #[test]
    fn download_failure_is_network_error() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/main.zip").with_status(503).create();
        let parent = TempDir::new().unwrap();

        let err = run_pipeline(
            &config_for(format!("{}/main.zip", server.url())),
            &parent.path().join("demo"),
        )
        .unwrap_err();

        assert!(matches!(err, PyinitError::Network { .. }));
    }

    #[test]
    fn corrupt_archive_is_archive_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/main.zip")
            .with_status(200)
            .with_body("not a zip")
            .create();
        let parent = TempDir::new().unwrap();

        let err = run_pipeline(
            &config_for(format!("{}/main.zip", server.url())),
            &parent.path().join("demo"),
        )
        .unwrap_err();

        assert!(matches!(err, PyinitError::Archive(_)));
    }

    #[test]
    fn apply_uses_context_file_and_removes_live_template() {
        let source = TempDir::new().unwrap();
        std::fs::write(source.path().join("README.md.j2"), "# {{ NAME }} in {{ REGION }}").unwrap();
        std::fs::write(source.path().join("project.env"), "REGION=eu-north\n").unwrap();
        std::fs::write(source.path().join("setup_main.py"), "print()").unwrap();
        let parent = TempDir::new().unwrap();
        let target = parent.path().join("svc");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("live_template.py"), "old").unwrap();

        let summary = apply_template(&InitConfig::default(), source.path(), &target).unwrap();

        assert_eq!(
            std::fs::read_to_string(target.join("README.md")).unwrap(),
            "# svc in eu-north"
        );
        assert_eq!(summary.render.skipped, 2);
        assert!(summary.live_template_removed);
        assert!(!target.join("live_template.py").exists());
        assert!(!target.join("setup_main.py").exists());
    }

    #[test]
    fn render_errors_fail_the_run() {
        let source = TempDir::new().unwrap();
        std::fs::write(source.path().join("bad.txt.j2"), [0xff, 0xfe]).unwrap();
        let target = TempDir::new().unwrap();

        let err = apply_template(&InitConfig::default(), source.path(), target.path()).unwrap_err();

        assert!(matches!(err, PyinitError::RenderFailed { errors: 1 }));
        assert!(target.path().join("pyproject.toml").exists());
    }

    #[test]
    fn workspace_is_removed_after_success() {
        let body = template_zip(&[("proj-main/README.md.j2", "# {{ NAME }}")]);
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/main.zip")
            .with_status(200)
            .with_body(body)
            .create();
        let scratch = TempDir::new().unwrap();
        let parent = TempDir::new().unwrap();
        let cfg = InitConfig {
            workspace_parent: Some(scratch.path().to_path_buf()),
            ..config_for(format!("{}/main.zip", server.url()))
        };

        run_pipeline(&cfg, &parent.path().join("demo")).unwrap();

        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn workspace_is_removed_after_network_failure() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/main.zip").with_status(404).create();
        let scratch = TempDir::new().unwrap();
        let parent = TempDir::new().unwrap();
        let cfg = InitConfig {
            workspace_parent: Some(scratch.path().to_path_buf()),
            ..config_for(format!("{}/main.zip", server.url()))
        };

        let err = run_pipeline(&cfg, &parent.path().join("demo")).unwrap_err();

        assert!(matches!(err, PyinitError::Network { .. }));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn apply_into_own_source_is_rejected() {
        let source = TempDir::new().unwrap();
        std::fs::write(source.path().join("a.txt"), "alpha").unwrap();

        let err = apply_template(&InitConfig::default(), source.path(), source.path()).unwrap_err();

        assert!(matches!(err, PyinitError::Usage(_)));
        assert_eq!(std::fs::read_to_string(source.path().join("a.txt")).unwrap(), "alpha");
        assert!(!source.path().join("pyproject.toml").exists());
    }

    #[test]
    fn apply_into_nested_target_is_rejected() {
        let source = TempDir::new().unwrap();
        std::fs::write(source.path().join("a.txt"), "alpha").unwrap();
        let nested = source.path().join("out");

        let err = apply_template(&InitConfig::default(), source.path(), &nested).unwrap_err();

        assert!(matches!(err, PyinitError::Usage(_)));
        assert_eq!(std::fs::read_to_string(source.path().join("a.txt")).unwrap(), "alpha");
        assert!(!nested.join("a.txt").exists());
    }

    #[test]
    fn cleanup_with_no_packages_is_noop() {
        let dir = TempDir::new().unwrap();
        assert!(cleanup_packages(&[], dir.path()).unwrap());
    }
}
