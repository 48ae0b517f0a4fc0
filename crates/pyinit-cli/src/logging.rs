use pyinit_core::config::{CLOUD_SERVICE_ENV, LOG_LEVEL_ENV};
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Map a `LOG_LEVEL` value to a filter directive. Accepts the tracing
/// names plus `warning` and `critical`.
fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        "off" => "off",
        _ => DEFAULT_LEVEL,
    }
}

/// Install the global subscriber. `RUST_LOG` directives win over
/// `LOG_LEVEL`. Output is JSON lines when running as a cloud service.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_default();
        EnvFilter::new(level_directive(&level))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if std::env::var_os(CLOUD_SERVICE_ENV).is_some() {
        builder.json().init();
    } else {
        builder.init();
    }
}
