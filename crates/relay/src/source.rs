//! HTTP byte source.
//!
//! Opens a GET connection against a resolved direct media URL and exposes
//! the response body as a forward-only byte stream. The connection is owned
//! by the stream and closed when it is exhausted or dropped.

use std::collections::HashMap;

use futures::TryStreamExt;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};
use url::Url;

use crate::error::{RelayError, Result};
use crate::stream::ByteStream;

/// Validate that a URL uses http or https before any network call.
///
/// This gate runs on upstream-supplied URLs too: a malicious metadata
/// response must not be able to point the proxy at a local file or another
/// non-HTTP scheme.
pub fn ensure_http_scheme(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|_| RelayError::UnsupportedScheme(url.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(RelayError::UnsupportedScheme(other.to_string())),
    }
}

fn to_header_map(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!(header = %name, "skipping malformed upstream header"),
        }
    }
    map
}

/// HTTP byte source over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpByteSource {
    client: Client,
}

impl HttpByteSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Open a direct media URL with the supplied per-request headers.
    ///
    /// A remote error status is surfaced with its status code; lower-level
    /// transport failures map to a generic server-side error.
    pub async fn open(&self, url: &str, headers: &HashMap<String, String>) -> Result<ByteStream> {
        let url = ensure_http_scheme(url)?;
        debug!(url = %url, "opening media stream");

        let response = self
            .client
            .get(url)
            .headers(to_header_map(headers))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("Media request failed")
                    .to_string(),
            });
        }

        Ok(Box::pin(response.bytes_stream().map_err(RelayError::from)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_and_https_pass_the_gate() {
        assert!(ensure_http_scheme("http://example.com/a").is_ok());
        assert!(ensure_http_scheme("https://example.com/a").is_ok());
    }

    #[test]
    fn file_scheme_is_rejected() {
        let err = ensure_http_scheme("file:///etc/passwd").unwrap_err();
        assert!(matches!(err, RelayError::UnsupportedScheme(_)));
    }

    #[test]
    fn garbage_url_is_rejected() {
        let err = ensure_http_scheme("not a url").unwrap_err();
        assert!(matches!(err, RelayError::UnsupportedScheme(_)));
    }

    #[test]
    fn header_map_conversion_keeps_valid_entries() {
        let headers = HashMap::from([
            ("User-Agent".to_string(), "abc".to_string()),
            ("bad name".to_string(), "x".to_string()),
        ]);
        let map = to_header_map(&headers);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("user-agent").unwrap(), "abc");
    }
}
