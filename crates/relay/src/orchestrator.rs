//! Stream orchestration.
//!
//! Ties the resolver, the HTTP byte source and the transcode pipeline
//! together: given a page URL and an output kind, produces a byte stream
//! plus its content metadata.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{RelayError, Result};
use crate::probe::effective_headers;
use crate::resolver::{
    self, AUDIO_FORMAT_SELECTOR, MetadataSource, VIDEO_FALLBACK_FORMAT, VIDEO_FORMAT_SELECTOR,
};
use crate::source::HttpByteSource;
use crate::stream::ByteStream;
use crate::transcode::TranscodePipeline;

/// Client-facing output modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Video,
    Mp3,
}

/// A ready-to-relay byte stream with its content metadata.
pub struct PreparedStream {
    pub stream: ByteStream,
    pub media_type: String,
    pub extension: String,
}

/// Seam between the HTTP boundary and the engine.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Resolve `url` and return a byte stream in the requested output kind.
    async fn prepare(&self, url: &str, kind: OutputKind) -> Result<PreparedStream>;

    /// Fetch the media title for filename purposes. Failures here must not
    /// abort the primary stream; the caller substitutes a generic name.
    async fn fetch_title(&self, url: &str) -> Result<String>;
}

fn video_media_type(extension: &str) -> String {
    if extension == "mp4" {
        "video/mp4".to_string()
    } else {
        format!("video/{extension}")
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Default [`StreamProvider`] over the external metadata tool and ffmpeg.
pub struct StreamOrchestrator {
    metadata: Arc<dyn MetadataSource>,
    source: HttpByteSource,
    pipeline: TranscodePipeline,
}

impl StreamOrchestrator {
    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        source: HttpByteSource,
        pipeline: TranscodePipeline,
    ) -> Self {
        Self {
            metadata,
            source,
            pipeline,
        }
    }

    async fn prepare_video(&self, url: &str) -> Result<PreparedStream> {
        let (info, descriptor) = resolver::resolve(
            self.metadata.as_ref(),
            url,
            VIDEO_FORMAT_SELECTOR,
            Some(VIDEO_FALLBACK_FORMAT),
        )
        .await?;

        let headers = effective_headers(&descriptor, &info);
        let download_url =
            non_empty(descriptor.url.clone()).ok_or(RelayError::StreamUnavailable)?;

        let stream = self.source.open(&download_url, &headers).await?;

        let extension = non_empty(descriptor.ext.clone())
            .or_else(|| non_empty(info.ext.clone()))
            .unwrap_or_else(|| "mp4".to_string());
        let media_type = video_media_type(&extension);

        debug!(url, %media_type, "prepared video passthrough stream");
        Ok(PreparedStream {
            stream,
            media_type,
            extension,
        })
    }

    async fn prepare_mp3(&self, url: &str) -> Result<PreparedStream> {
        let (info, descriptor) =
            resolver::resolve(self.metadata.as_ref(), url, AUDIO_FORMAT_SELECTOR, None).await?;

        let headers = effective_headers(&descriptor, &info);
        let download_url =
            non_empty(descriptor.url.clone()).ok_or(RelayError::StreamUnavailable)?;

        let source = self.source.open(&download_url, &headers).await?;
        let stream = self.pipeline.transcode(source)?;

        debug!(url, "prepared mp3 transcode stream");
        Ok(PreparedStream {
            stream,
            media_type: "audio/mpeg".to_string(),
            extension: "mp3".to_string(),
        })
    }
}

#[async_trait]
impl StreamProvider for StreamOrchestrator {
    async fn prepare(&self, url: &str, kind: OutputKind) -> Result<PreparedStream> {
        match kind {
            OutputKind::Video => self.prepare_video(url).await,
            OutputKind::Mp3 => self.prepare_mp3(url).await,
        }
    }

    async fn fetch_title(&self, url: &str) -> Result<String> {
        let info = self.metadata.extract(url, None).await?;
        non_empty(info.title)
            .ok_or_else(|| RelayError::Resolution("Video title is unavailable".to_string()))
    }
}
