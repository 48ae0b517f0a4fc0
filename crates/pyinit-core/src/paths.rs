use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File name constants
// ---------------------------------------------------------------------------

pub const MANIFEST_FILE: &str = "pyproject.toml";
pub const CONTEXT_FILE: &str = "project.env";
pub const SETUP_SCRIPT: &str = "setup_main.py";
pub const LIVE_TEMPLATE_SCRIPT: &str = "live_template.py";

pub const TEMPLATE_SUFFIX: &str = ".j2";

/// Names used inside the scoped temporary workspace.
pub const WORKSPACE_PREFIX: &str = "init_temp_";
pub const ARCHIVE_FILE: &str = "template.zip";
pub const EXTRACT_DIR: &str = "unzipped";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

pub fn context_path(root: &Path) -> PathBuf {
    root.join(CONTEXT_FILE)
}

pub fn live_template_path(root: &Path) -> PathBuf {
    root.join(LIVE_TEMPLATE_SCRIPT)
}

/// Strip the template suffix from a file name, if present.
pub fn strip_template_suffix<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    name.strip_suffix(suffix).filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_suffix_only_when_present() {
        assert_eq!(strip_template_suffix("b.txt.j2", ".j2"), Some("b.txt"));
        assert_eq!(strip_template_suffix("a.txt", ".j2"), None);
    }

    #[test]
    fn bare_suffix_is_not_a_template() {
        assert_eq!(strip_template_suffix(".j2", ".j2"), None);
    }

    #[test]
    fn manifest_path_joins_root() {
        let root = Path::new("/tmp/proj");
        assert_eq!(manifest_path(root), PathBuf::from("/tmp/proj/pyproject.toml"));
    }
}
