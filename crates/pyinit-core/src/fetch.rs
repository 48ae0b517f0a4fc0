//! Archive download. A single attempt; any failure is surfaced to the caller.

use crate::error::{PyinitError, Result};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TEMPLATE_URL: &str =
    "https://github.com/defmon3/pycharm_init/archive/refs/heads/main.zip";

pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("pyinit/", env!("CARGO_PKG_VERSION"));

/// Download `url` into `dest`, returning the number of bytes written.
///
/// Connection failures, timeouts, and non-success statuses all map to
/// [`PyinitError::Network`].
pub fn download(url: &str, dest: &Path, timeout: Duration) -> Result<u64> {
    tracing::info!(url, dest = %dest.display(), "downloading archive");
    let network = |reason: String| PyinitError::Network {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| network(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| network(e.to_string()))?
        .error_for_status()
        .map_err(|e| network(e.to_string()))?;

    let mut file = std::fs::File::create(dest)?;
    let bytes = response
        .copy_to(&mut file)
        .map_err(|e| network(e.to_string()))?;

    tracing::info!(bytes, "download complete");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn downloads_body_to_file() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/main.zip")
            .with_status(200)
            .with_body("PK-bytes")
            .create();
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("template.zip");

        let n = download(&format!("{}/main.zip", server.url()), &dest, DEFAULT_DOWNLOAD_TIMEOUT).unwrap();

        mock.assert();
        assert_eq!(n, 8);
        assert_eq!(std::fs::read(&dest).unwrap(), b"PK-bytes");
    }

    #[test]
    fn non_success_status_is_network_error() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/missing.zip").with_status(404).create();
        let dir = TempDir::new().unwrap();

        let err = download(
            &format!("{}/missing.zip", server.url()),
            &dir.path().join("t.zip"),
            DEFAULT_DOWNLOAD_TIMEOUT,
        )
        .unwrap_err();

        assert!(matches!(err, PyinitError::Network { .. }));
    }

    #[test]
    fn unreachable_host_is_network_error() {
        let dir = TempDir::new().unwrap();
        let err = download(
            "http://127.0.0.1:1/template.zip",
            &dir.path().join("t.zip"),
            Duration::from_secs(2),
        )
        .unwrap_err();
        assert!(matches!(err, PyinitError::Network { .. }));
    }
}
