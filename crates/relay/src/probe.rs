//! Data contract for the metadata tool's JSON output.
//!
//! The tool's info object is parsed exactly once at the subprocess boundary
//! into [`MediaProbe`]; everything downstream works with typed fields instead
//! of re-probing loose JSON per call site.

use std::collections::HashMap;

use serde::Deserialize;

/// A single direct-stream candidate reported by the metadata tool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamDescriptor {
    pub url: Option<String>,
    pub ext: Option<String>,
    pub http_headers: Option<HashMap<String, String>>,
}

/// Top-level info object returned by the metadata tool.
///
/// Depending on the format selector the tool either reports a list of
/// "requested" candidates or carries a direct URL at the top level.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaProbe {
    pub title: Option<String>,
    pub url: Option<String>,
    pub ext: Option<String>,
    pub http_headers: Option<HashMap<String, String>>,
    pub requested_downloads: Option<Vec<StreamDescriptor>>,
    pub requested_formats: Option<Vec<StreamDescriptor>>,
}

impl MediaProbe {
    /// Select the single physical stream described by this probe.
    ///
    /// Returns `None` when the candidate list holds more than one entry
    /// (separate elementary streams the tool did not mux); the caller is
    /// expected to retry with a fallback selector. An empty or absent list
    /// falls back to the top-level object when it carries a direct URL.
    pub fn select_single_stream(&self) -> Option<StreamDescriptor> {
        let candidates = match (&self.requested_downloads, &self.requested_formats) {
            (Some(list), _) if !list.is_empty() => Some(list),
            (_, Some(list)) if !list.is_empty() => Some(list),
            _ => None,
        };

        if let Some(list) = candidates {
            return if list.len() == 1 {
                Some(list[0].clone())
            } else {
                None
            };
        }

        self.url.is_some().then(|| StreamDescriptor {
            url: self.url.clone(),
            ext: self.ext.clone(),
            http_headers: self.http_headers.clone(),
        })
    }
}

/// Pick request headers with descriptor-level precedence over info-level.
pub fn effective_headers(
    descriptor: &StreamDescriptor,
    info: &MediaProbe,
) -> HashMap<String, String> {
    descriptor
        .http_headers
        .clone()
        .or_else(|| info.http_headers.clone())
        .unwrap_or_default()
}
