//! Engine-wide error types.

use thiserror::Error;

/// Result type used across the engine.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors produced while resolving, fetching or transcoding a stream.
///
/// The boundary layer maps these onto HTTP statuses: scheme and resolution
/// failures are client errors, everything else is server-side. Messages that
/// could leak internals (transport, io, json) are replaced with generic text
/// at the boundary.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The media URL uses a scheme other than http/https.
    #[error("unsupported media URL scheme: {0}")]
    UnsupportedScheme(String),

    /// The metadata tool reported a domain resolution error.
    /// The message is safe to pass through to the client.
    #[error("{0}")]
    Resolution(String),

    /// No usable direct media stream could be identified.
    #[error("unable to identify a direct media stream")]
    StreamUnavailable,

    /// The remote media server answered with an error status.
    #[error("media request failed with status {status}: {reason}")]
    UpstreamStatus { status: u16, reason: String },

    /// Network-level failure while fetching the media stream.
    #[error("unable to retrieve media stream: {0}")]
    Transport(#[from] reqwest::Error),

    /// An external tool (yt-dlp, ffmpeg) could not be located or launched.
    #[error("{tool} is not available")]
    ToolUnavailable { tool: &'static str },

    /// An external tool exited with a non-zero status.
    #[error("{message}")]
    ToolFailure { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse metadata output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl RelayError {
    pub fn tool_unavailable(tool: &'static str) -> Self {
        Self::ToolUnavailable { tool }
    }

    pub fn tool_failure(message: impl Into<String>) -> Self {
        Self::ToolFailure {
            message: message.into(),
        }
    }
}
