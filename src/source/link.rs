//! Source link parsing and validation.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// The only media format accepted from a playback link.
pub const EXPECTED_MIME: &str = "video/mp4";

/// A validated playback link.
///
/// Validation happens entirely before any request is issued.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLink {
    url: Url,
    duration: Option<Duration>,
}

impl SourceLink {
    /// Parse and validate a free-text link.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let url = Url::parse(input).map_err(|e| Error::InvalidLink(format!("{}: {}", input, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::InvalidLink(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let mime = query_param(&url, "mime");
        if mime.as_deref() != Some(EXPECTED_MIME) {
            return Err(Error::FormatMismatch {
                expected: EXPECTED_MIME.to_string(),
                actual: mime.unwrap_or_else(|| "none".to_string()),
            });
        }

        let duration = query_param(&url, "dur")
            .map(|dur| parse_duration(&dur))
            .transpose()?;

        Ok(Self { url, duration })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Media duration advertised by the `dur` parameter.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn parse_duration(value: &str) -> Result<Duration> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidDuration(value.to_string()))?;

    // Rejects negative, non-finite and out-of-range values alike
    Duration::try_from_secs_f64(seconds).map_err(|_| Error::InvalidDuration(value.to_string()))
}
