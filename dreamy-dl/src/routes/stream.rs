//! The stream relay endpoint.
//!
//! `GET /stream?url=<page url>&format=video|mp3` resolves the URL, prepares
//! the byte stream and relays it as a downloadable attachment. All setup
//! failures map to clean error responses before any body bytes are sent.

use axum::{
    Router,
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, error};

use relay::{OutputKind, sanitize_filename};

use crate::error::ApiResult;
use crate::server::AppState;

/// Query parameters for the stream endpoint. An unsupported `format` value
/// is rejected by deserialization with a 400.
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    /// Source page URL
    pub url: String,
    /// Requested output kind, defaults to native video
    #[serde(default)]
    pub format: OutputKind,
}

/// Create the stream router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(stream))
}

async fn stream(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> ApiResult<Response> {
    let prepared = state.provider.prepare(&params.url, params.format).await?;

    // Title-fetch failure is non-fatal: fall back to a generic filename
    // rather than aborting a stream we already resolved.
    let filename = match state.provider.fetch_title(&params.url).await {
        Ok(title) => sanitize_filename(&title, &prepared.extension),
        Err(error) => {
            debug!(%error, "title fetch failed, using fallback filename");
            format!("download.{}", prepared.extension)
        }
    };

    // Failures discovered mid-stream cannot change the status line anymore;
    // record them and let the body terminate abruptly.
    let body = Body::from_stream(prepared.stream.map(|item| {
        item.map_err(|error| {
            error!(%error, "stream aborted mid-transfer");
            std::io::Error::other(error.to_string())
        })
    }));

    Ok((
        [
            (header::CONTENT_TYPE, prepared.media_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        body,
    )
        .into_response())
}
