//! Zip extraction and content-root discovery.

use crate::error::{PyinitError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Expand every entry of `zip_path` into `dest`, returning the number of
/// files written. `dest` must already exist.
pub fn extract(zip_path: &Path, dest: &Path) -> Result<usize> {
    tracing::info!(archive = %zip_path.display(), dest = %dest.display(), "extracting archive");
    if !dest.is_dir() {
        return Err(PyinitError::Archive(format!(
            "extraction target {} does not exist",
            dest.display()
        )));
    }

    let file = File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(PyinitError::Archive(format!(
                "entry '{}' escapes the extraction directory",
                entry.name()
            )));
        };
        let out = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out)
                .map_err(|e| PyinitError::Archive(format!("{}: {e}", out.display())))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PyinitError::Archive(format!("{}: {e}", parent.display())))?;
        }
        let mut target = File::create(&out)
            .map_err(|e| PyinitError::Archive(format!("{}: {e}", out.display())))?;
        std::io::copy(&mut entry, &mut target)
            .map_err(|e| PyinitError::Archive(format!("{}: {e}", out.display())))?;
        written += 1;
    }

    tracing::info!(files = written, "extraction complete");
    Ok(written)
}

/// Find the directory holding the template content inside `extract_dir`.
///
/// With a `marker`, the root is `extract_dir` itself when it contains the
/// marker, else the first immediate subdirectory (by name) that does.
/// Without one, a single top-level directory is taken as the root and
/// anything else means the content sits directly in `extract_dir`.
pub fn locate_content_root(extract_dir: &Path, marker: Option<&str>) -> Result<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(extract_dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    if entries.is_empty() {
        return Err(PyinitError::Archive("archive is empty".into()));
    }

    match marker {
        Some(marker) => {
            if extract_dir.join(marker).exists() {
                return Ok(extract_dir.to_path_buf());
            }
            entries
                .into_iter()
                .find(|p| p.is_dir() && p.join(marker).exists())
                .inspect(|root| tracing::info!(root = %root.display(), "found content root"))
                .ok_or_else(|| PyinitError::ContentRootNotFound {
                    marker: marker.to_string(),
                })
        }
        None => {
            if entries.len() == 1 && entries[0].is_dir() {
                let root = entries.remove(0);
                tracing::info!(root = %root.display(), "found content root directory");
                Ok(root)
            } else {
                tracing::warn!("processing content directly from archive root");
                Ok(extract_dir.to_path_buf())
            }
        }
    }
}
