use crate::fetch::{DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_TEMPLATE_URL};
use crate::manifest::ToolConfig;
use crate::notify::webhook::DEFAULT_ATTEMPT_TIMEOUT;
use crate::render::RenderOptions;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Environment variable names
// ---------------------------------------------------------------------------

/// Webhook for bootstrap and function status notifications.
pub const WEBHOOK_ENV: &str = "DISCORD_HOOK_URL";
/// Webhook for CI deploy notifications.
pub const CI_WEBHOOK_ENV: &str = "COMMIT_WEBHOOK";
/// Mention inserted into fail/error/critical messages.
pub const MENTION_ENV: &str = "DISCORD_AT_MENTION";
pub const TEMPLATE_URL_ENV: &str = "PYINIT_TEMPLATE_URL";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
/// Present when running on Cloud Run / Cloud Functions.
pub const CLOUD_SERVICE_ENV: &str = "K_SERVICE";

// ---------------------------------------------------------------------------
// EnvSource
// ---------------------------------------------------------------------------

/// Read access to environment variables, so env-derived values can be
/// built from a fixed map in tests.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;

    fn var_or(&self, name: &str, default: &str) -> String {
        self.var(name).unwrap_or_else(|| default.to_string())
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Non-empty value of `name`, or `None`.
pub fn non_empty_var(env: &impl EnvSource, name: &str) -> Option<String> {
    env.var(name).filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// InitConfig
// ---------------------------------------------------------------------------

/// Settings for one bootstrap run. `Default` gives the stock Python template.
#[derive(Debug, Clone)]
pub struct InitConfig {
    pub template_url: String,
    pub download_timeout: Duration,
    /// File that identifies the content root inside the archive, if any.
    pub content_marker: Option<String>,
    pub render: RenderOptions,
    pub tools: ToolConfig,
    /// Packages `--clean` removes from the Python project.
    pub cleanup_packages: Vec<String>,
    pub webhook_env: String,
    pub attempt_timeout: Duration,
    /// Directory the temporary workspace is created in; the system temp dir when unset.
    pub workspace_parent: Option<PathBuf>,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            template_url: DEFAULT_TEMPLATE_URL.to_string(),
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            content_marker: None,
            render: RenderOptions::default(),
            tools: ToolConfig::python_defaults(),
            cleanup_packages: ["httpx", "jinja2", "markupsafe", "tomlkit", "python-dotenv"]
                .map(String::from)
                .to_vec(),
            webhook_env: WEBHOOK_ENV.to_string(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            workspace_parent: None,
        }
    }
}
