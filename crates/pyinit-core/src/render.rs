//! Template renderer: walks a source tree and renders or copies every file
//! into a destination tree.
//!
//! Files whose name ends with the template suffix (`.j2` by default) are
//! rendered against a [`RenderContext`] and written without the suffix.
//! Everything else is copied byte-for-byte. One failing file never stops the
//! walk; failures are counted in the returned [`RenderReport`].

use crate::context::RenderContext;
use crate::error::{PyinitError, Result};
use crate::{io, paths};
use regex::{Captures, Regex};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

static SUBST_RE: OnceLock<Regex> = OnceLock::new();

fn subst_re() -> &'static Regex {
    SUBST_RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap()
    })
}

/// Substitute `{{ KEY }}` and `{KEY}` placeholders found in `ctx`.
///
/// Unknown keys and any other brace text are left as written.
pub fn render_str(template: &str, ctx: &RenderContext) -> String {
    subst_re()
        .replace_all(template, |caps: &Captures<'_>| {
            let key = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match ctx.get(key) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// File-name suffix marking a template.
    pub suffix: String,
    /// File names never rendered or copied (the setup script, the context file).
    pub skip_names: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            suffix: paths::TEMPLATE_SUFFIX.to_string(),
            skip_names: vec![
                paths::SETUP_SCRIPT.to_string(),
                paths::CONTEXT_FILE.to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    pub processed: usize,
    pub rendered: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl RenderReport {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileAction {
    Rendered,
    Copied,
}

pub struct Renderer<'a> {
    ctx: &'a RenderContext,
    opts: RenderOptions,
}

impl<'a> Renderer<'a> {
    pub fn new(ctx: &'a RenderContext, opts: RenderOptions) -> Self {
        Self { ctx, opts }
    }

    /// Render or copy every regular file under `source` into `dest`.
    pub fn render_tree(&self, source: &Path, dest: &Path) -> RenderReport {
        tracing::info!(
            source = %source.display(),
            dest = %dest.display(),
            "processing template files"
        );
        let mut report = RenderReport::default();

        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::error!(error = %e, "cannot read template entry");
                    report.errors += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if self.opts.skip_names.iter().any(|s| *s == name) {
                tracing::debug!(file = %name, "skipping");
                report.skipped += 1;
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(source)
                .unwrap_or(entry.path())
                .to_path_buf();
            match self.process_file(entry.path(), &relative, dest) {
                Ok(action) => {
                    report.processed += 1;
                    if action == FileAction::Rendered {
                        report.rendered += 1;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "file processing failed");
                    report.errors += 1;
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            rendered = report.rendered,
            skipped = report.skipped,
            "processed files"
        );
        if report.errors > 0 {
            tracing::warn!(errors = report.errors, "errors occurred during file processing");
        }
        report
    }

    fn process_file(&self, src: &Path, relative: &Path, dest: &Path) -> Result<FileAction> {
        let fail = |reason: String| PyinitError::FileProcessing {
            path: relative.to_path_buf(),
            reason,
        };
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match paths::strip_template_suffix(&name, &self.opts.suffix) {
            Some(stem) => {
                let target: PathBuf = dest.join(relative).with_file_name(stem);
                tracing::debug!(from = %relative.display(), to = %target.display(), "rendering");
                let template = std::fs::read_to_string(src).map_err(|e| fail(e.to_string()))?;
                let rendered = render_str(&template, self.ctx);
                io::atomic_write(&target, rendered.as_bytes()).map_err(|e| fail(e.to_string()))?;
                Ok(FileAction::Rendered)
            }
            None => {
                let target = dest.join(relative);
                tracing::debug!(from = %relative.display(), to = %target.display(), "copying");
                io::copy_file(src, &target).map_err(|e| fail(e.to_string()))?;
                Ok(FileAction::Copied)
            }
        }
    }
}
