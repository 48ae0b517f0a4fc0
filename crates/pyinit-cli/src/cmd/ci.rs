use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use pyinit_core::ci::{self, GITHUB_ENV_ENV, GITHUB_OUTPUT_ENV};
use pyinit_core::io::append_text;
use pyinit_core::paths::CONTEXT_FILE;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum CiSubcommand {
    /// Extract the pytest summary line from a log into $GITHUB_OUTPUT
    Summary {
        /// Test log file
        log: PathBuf,
    },

    /// Export a dotenv file to $GITHUB_ENV and a gcloud env string to $GITHUB_OUTPUT
    LoadEnv {
        #[arg(long, default_value = CONTEXT_FILE)]
        file: PathBuf,
    },
}

pub fn run(subcmd: CiSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CiSubcommand::Summary { log } => summary(&log, json),
        CiSubcommand::LoadEnv { file } => load_env(&file, json),
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn summary(log: &Path, json: bool) -> anyhow::Result<()> {
    let output = env_path(GITHUB_OUTPUT_ENV)
        .with_context(|| format!("{GITHUB_OUTPUT_ENV} is not set"))?;

    let line = ci::summarize_log(log);
    tracing::info!(summary = %line, "extracted test summary");
    ci::write_summary_output(&output, &line)
        .with_context(|| format!("cannot write {}", output.display()))?;

    if json {
        print_json(&serde_json::json!({ "summary_line": line }))?;
    } else {
        println!("{line}");
    }
    Ok(())
}

/// A missing or unreadable env file is reported and skipped; it never fails
/// the CI step.
fn load_env(file: &Path, json: bool) -> anyhow::Result<()> {
    let vars = match ci::parse_env_file(file) {
        Ok(vars) => vars,
        Err(e) => {
            tracing::error!(path = %file.display(), error = %e, "cannot load env file");
            if json {
                print_json(&serde_json::json!({ "loaded": false, "error": e.to_string() }))?;
            } else {
                println!("Error: cannot load {}: {e}", file.display());
            }
            return Ok(());
        }
    };
    tracing::info!(count = vars.len(), path = %file.display(), "loaded env file");

    match env_path(GITHUB_ENV_ENV) {
        Some(path) => append_text(&path, &ci::github_env_block(&vars))
            .with_context(|| format!("cannot write {}", path.display()))?,
        None => tracing::warn!("{GITHUB_ENV_ENV} is not set, variables not exported"),
    }
    match env_path(GITHUB_OUTPUT_ENV) {
        Some(path) => append_text(&path, &ci::gcloud_output_block(&vars))
            .with_context(|| format!("cannot write {}", path.display()))?,
        None => tracing::warn!("{GITHUB_OUTPUT_ENV} is not set, gcloud env string not written"),
    }

    if json {
        let keys: Vec<&str> = vars.iter().map(|(k, _)| k.as_str()).collect();
        print_json(&serde_json::json!({
            "variables": keys,
            "gcloud_env_string": ci::gcloud_env_string(&vars),
        }))?;
    } else {
        println!("Exported {} variable(s) from {}", vars.len(), file.display());
    }
    Ok(())
}
