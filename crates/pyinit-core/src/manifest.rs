//! `pyproject.toml` tool-table merging.

use crate::error::{PyinitError, Result};
use crate::{io, paths};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

pub const DEFAULT_PROJECT_VERSION: &str = "0.1.0";

/// Tool name → settings merged into `[tool.<name>]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolConfig {
    tools: BTreeMap<String, Table>,
}

impl ToolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, tool: &str, key: &str, value: impl Into<Value>) -> &mut Self {
        self.tools
            .entry(tool.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
        self
    }

    pub fn tools(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.tools.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// black, mypy and ruff settings for a Python 3.12 project.
    pub fn python_defaults() -> Self {
        let mut cfg = Self::new();
        cfg.set("black", "line-length", 120)
            .set("black", "target-version", vec!["py312"])
            .set("mypy", "python_version", "3.12")
            .set("ruff", "target-version", "py312")
            .set("ruff", "line-length", 120);
        cfg
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestUpdate {
    pub path: PathBuf,
    /// True when no usable manifest existed and a fresh one was written.
    pub created: bool,
    pub keys_set: usize,
}

fn fresh_document(project_name: &str) -> Table {
    let mut project = Table::new();
    project.insert("name".into(), Value::String(project_name.to_string()));
    project.insert(
        "version".into(),
        Value::String(DEFAULT_PROJECT_VERSION.to_string()),
    );
    let mut doc = Table::new();
    doc.insert("project".into(), Value::Table(project));
    doc
}

/// Read the manifest at `path`, or `None` when it is missing or unusable.
fn read_existing(path: &Path) -> Option<Table> {
    if !path.exists() {
        return None;
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| toml::from_str::<Table>(&text).map_err(|e| e.to_string()));
    match parsed {
        Ok(doc) => Some(doc),
        Err(reason) => {
            let err = PyinitError::ConfigParse {
                path: path.to_path_buf(),
                reason,
            };
            tracing::warn!(error = %err, "starting a fresh manifest");
            None
        }
    }
}

/// Take `parent[key]` out as a table; a missing or non-table value
/// yields an empty one.
fn take_table(parent: &mut Table, key: &str) -> Table {
    match parent.remove(key) {
        Some(Value::Table(table)) => table,
        Some(_) => {
            tracing::warn!(key, "replacing non-table entry");
            Table::new()
        }
        None => Table::new(),
    }
}

/// Merge `tools` into `[tool.*]` of `<dir>/pyproject.toml`.
///
/// Only configured keys are written; other keys and tools are preserved.
pub fn update_manifest(dir: &Path, tools: &ToolConfig) -> Result<ManifestUpdate> {
    let path = paths::manifest_path(dir);
    tracing::info!(path = %path.display(), "updating manifest");

    let (mut doc, created) = match read_existing(&path) {
        Some(doc) => (doc, false),
        None => {
            tracing::warn!("manifest not found, creating new document");
            (fresh_document(&io::dir_name(dir, "project")), true)
        }
    };

    let mut tool_section = take_table(&mut doc, "tool");
    let mut keys_set = 0;
    for (name, settings) in tools.tools() {
        let mut table = take_table(&mut tool_section, name);
        tracing::debug!(tool = name, keys = settings.len(), "setting tool config");
        for (key, value) in settings {
            table.insert(key.clone(), value.clone());
            keys_set += 1;
        }
        tool_section.insert(name.to_string(), Value::Table(table));
    }
    doc.insert("tool".to_string(), Value::Table(tool_section));

    let text = toml::to_string(&doc)?;
    io::atomic_write(&path, text.as_bytes())?;
    tracing::info!(path = %path.display(), keys_set, "manifest written");

    Ok(ManifestUpdate {
        path,
        created,
        keys_set,
    })
}
