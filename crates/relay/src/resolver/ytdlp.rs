//! yt-dlp metadata tool collaborator.
//!
//! Invokes the yt-dlp executable in JSON-dump mode and parses its output
//! into the [`MediaProbe`] data contract. Download errors reported by the
//! tool (`ERROR:` lines) are surfaced as domain resolution failures with
//! the tool's message; anything else is an unexpected tool failure.

use std::process::Stdio;
use std::sync::LazyLock;

use async_trait::async_trait;
use tracing::debug;

use crate::command;
use crate::error::{RelayError, Result};
use crate::probe::MediaProbe;
use crate::resolver::MetadataSource;

static DEFAULT_YTDLP_PATH: &str = "yt-dlp";

static YTDLP_AVAILABLE: LazyLock<bool> =
    LazyLock::new(|| command::probe_version(DEFAULT_YTDLP_PATH, "--version").is_some());

/// yt-dlp subprocess backed [`MetadataSource`].
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary_path: String,
}

impl YtDlp {
    /// Whether the default yt-dlp binary is on the search path.
    pub fn is_available() -> bool {
        *YTDLP_AVAILABLE
    }

    /// Create a yt-dlp source, honoring the `YTDLP_PATH` override.
    ///
    /// Availability is probed once up front so a missing tool is reported
    /// at startup rather than on the first request.
    pub fn from_env() -> Result<Self> {
        let binary_path =
            std::env::var("YTDLP_PATH").unwrap_or_else(|_| DEFAULT_YTDLP_PATH.to_string());

        let available = if binary_path == DEFAULT_YTDLP_PATH {
            Self::is_available()
        } else {
            command::probe_version(&binary_path, "--version").is_some()
        };
        if !available {
            return Err(RelayError::tool_unavailable("yt-dlp"));
        }

        Ok(Self { binary_path })
    }

    /// Create a source for an explicit binary path without probing.
    pub fn with_binary(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    fn build_args(url: &str, format_selector: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--quiet".to_string(),
            "--no-cache-dir".to_string(),
        ];
        if let Some(selector) = format_selector {
            args.extend(["--format".to_string(), selector.to_string()]);
        }
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    fn map_failure(code: Option<i32>, stderr: &str) -> RelayError {
        let trimmed = stderr.trim();
        if trimmed.contains("ERROR:") {
            let message = trimmed
                .lines()
                .find(|l| l.contains("ERROR:"))
                .map(|l| l.trim_start_matches("ERROR:").trim())
                .filter(|m| !m.is_empty())
                .unwrap_or("Unable to resolve media stream");
            return RelayError::Resolution(message.to_string());
        }
        RelayError::tool_failure(format!(
            "yt-dlp exited with code {}",
            code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
        ))
    }
}

#[async_trait]
impl MetadataSource for YtDlp {
    async fn extract(&self, url: &str, format_selector: Option<&str>) -> Result<MediaProbe> {
        let args = Self::build_args(url, format_selector);
        debug!(url, selector = ?format_selector, "invoking yt-dlp");

        let mut cmd = command::tokio_command(&self.binary_path);
        cmd.args(&args).stdout(Stdio::piped()).stderr(Stdio::piped());

        let out = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RelayError::tool_unavailable("yt-dlp")
            } else {
                RelayError::Io(e)
            }
        })?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(Self::map_failure(out.status.code(), &stderr));
        }

        let probe: MediaProbe = serde_json::from_slice(&out.stdout)?;
        Ok(probe)
    }
}
