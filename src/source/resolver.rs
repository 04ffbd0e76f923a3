//! Issues the request for a validated link and opens its byte stream.

use futures::TryStreamExt;
use reqwest::{header, Client};

use crate::error::{Error, Result};
use crate::pipeline::stream::ByteStream;
use crate::source::link::SourceLink;

/// An open response body and its declared size.
pub struct ResolvedSource {
    pub stream: ByteStream,
    pub total_bytes: u64,
}

/// Fetch `link` and read its declared size.
///
/// The `content-length` header is required: without it neither progress nor
/// the upload threshold can be evaluated up front.
pub async fn resolve(client: &Client, link: &SourceLink) -> Result<ResolvedSource> {
    tracing::debug!("GET {}", link.url());

    let response = client
        .get(link.url().clone())
        .send()
        .await
        .map_err(|e| Error::Download(format!("Request failed: {}", e)))?;

    let status = response.status();
    tracing::debug!("Response status: {}", status);

    if !status.is_success() {
        return Err(Error::Download(format!("HTTP {}", status)));
    }

    let total_bytes = declared_length(response.headers())?;

    let stream: ByteStream = Box::pin(
        response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
    );

    Ok(ResolvedSource {
        stream,
        total_bytes,
    })
}

fn declared_length(headers: &header::HeaderMap) -> Result<u64> {
    let value = headers
        .get(header::CONTENT_LENGTH)
        .ok_or_else(|| Error::MissingContentLength("no content-length header".into()))?;

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            Error::MissingContentLength(format!("content-length is not a number: {:?}", value))
        })
}
