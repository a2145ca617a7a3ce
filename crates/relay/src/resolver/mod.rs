//! Format resolution against the external metadata tool.

mod ytdlp;

pub use ytdlp::YtDlp;

use async_trait::async_trait;

use crate::error::{RelayError, Result};
use crate::probe::{MediaProbe, StreamDescriptor};

/// Format selector used for the video output kind.
pub const VIDEO_FORMAT_SELECTOR: &str =
    "bestvideo[ext=mp4][height<=1080]+bestaudio[ext=m4a]/best[ext=mp4]/best";
/// Fallback selector when the primary video selection stays ambiguous.
pub const VIDEO_FALLBACK_FORMAT: &str = "best[ext=mp4]/best";
/// Format selector used for the audio output kind.
pub const AUDIO_FORMAT_SELECTOR: &str = "bestaudio/best";

/// Narrow interface over the external metadata tool.
///
/// `extract` performs one metadata query with an optional format selector
/// and returns the parsed info object. Implementations must distinguish
/// domain resolution failures ([`RelayError::Resolution`]) from unexpected
/// tool failures so the boundary layer can map them to different statuses.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn extract(&self, url: &str, format_selector: Option<&str>) -> Result<MediaProbe>;
}

/// Resolve a page URL to a single direct-stream descriptor.
///
/// Invokes the metadata source with `primary`; when the result is ambiguous
/// (more than one physical stream) and a `fallback` selector is supplied,
/// re-invokes exactly once with the fallback. No further retries.
pub async fn resolve(
    source: &dyn MetadataSource,
    url: &str,
    primary: &str,
    fallback: Option<&str>,
) -> Result<(MediaProbe, StreamDescriptor)> {
    let info = source.extract(url, Some(primary)).await?;
    if let Some(descriptor) = info.select_single_stream() {
        return Ok((info, descriptor));
    }

    if let Some(fallback) = fallback {
        let info = source.extract(url, Some(fallback)).await?;
        if let Some(descriptor) = info.select_single_stream() {
            return Ok((info, descriptor));
        }
    }

    Err(RelayError::StreamUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    /// Metadata source stub that replays canned probes per selector.
    struct StubSource {
        responses: Vec<(Option<String>, MediaProbe)>,
        calls: Mutex<Vec<Option<String>>>,
    }

    impl StubSource {
        fn new(responses: Vec<(Option<String>, MediaProbe)>) -> Self {
            Self {
                responses,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Option<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MetadataSource for StubSource {
        async fn extract(&self, _url: &str, selector: Option<&str>) -> Result<MediaProbe> {
            self.calls
                .lock()
                .unwrap()
                .push(selector.map(str::to_owned));
            self.responses
                .iter()
                .find(|(s, _)| s.as_deref() == selector)
                .map(|(_, p)| p.clone())
                .ok_or_else(|| RelayError::Other("unexpected selector".into()))
        }
    }

    fn probe(json: &str) -> MediaProbe {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn single_candidate_needs_no_second_call() {
        let source = StubSource::new(vec![(
            Some(VIDEO_FORMAT_SELECTOR.into()),
            probe(r#"{"requested_downloads": [{"url": "https://m/a.mp4"}]}"#),
        )]);

        let (_, descriptor) = resolve(
            &source,
            "https://example.com/v",
            VIDEO_FORMAT_SELECTOR,
            Some(VIDEO_FALLBACK_FORMAT),
        )
        .await
        .unwrap();

        assert_eq!(descriptor.url.as_deref(), Some("https://m/a.mp4"));
        assert_eq!(source.calls(), vec![Some(VIDEO_FORMAT_SELECTOR.into())]);
    }

    #[tokio::test]
    async fn ambiguous_result_triggers_one_fallback_call() {
        let source = StubSource::new(vec![
            (
                Some(VIDEO_FORMAT_SELECTOR.into()),
                probe(
                    r#"{"requested_downloads": [{"url": "https://s/one"}, {"url": "https://s/two"}]}"#,
                ),
            ),
            (
                Some(VIDEO_FALLBACK_FORMAT.into()),
                probe(r#"{"requested_downloads": [{"url": "https://s/final", "ext": "mp4"}]}"#),
            ),
        ]);

        let (_, descriptor) = resolve(
            &source,
            "https://example.com/v",
            VIDEO_FORMAT_SELECTOR,
            Some(VIDEO_FALLBACK_FORMAT),
        )
        .await
        .unwrap();

        assert_eq!(descriptor.url.as_deref(), Some("https://s/final"));
        assert_eq!(
            source.calls(),
            vec![
                Some(VIDEO_FORMAT_SELECTOR.into()),
                Some(VIDEO_FALLBACK_FORMAT.into())
            ]
        );
    }

    #[tokio::test]
    async fn no_usable_stream_is_unavailable() {
        let source = StubSource::new(vec![(
            Some(AUDIO_FORMAT_SELECTOR.into()),
            probe(r#"{"title": "t"}"#),
        )]);

        let err = resolve(&source, "https://example.com/v", AUDIO_FORMAT_SELECTOR, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::StreamUnavailable));
    }

    #[tokio::test]
    async fn ambiguous_without_fallback_is_unavailable() {
        let source = StubSource::new(vec![(
            Some(AUDIO_FORMAT_SELECTOR.into()),
            probe(r#"{"requested_formats": [{"url": "https://s/a"}, {"url": "https://s/b"}]}"#),
        )]);

        let err = resolve(&source, "https://example.com/v", AUDIO_FORMAT_SELECTOR, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::StreamUnavailable));
        assert_eq!(source.calls().len(), 1);
    }
}
