//! Telegram Bot API upload sink.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};

use crate::api::types::{ApiResponse, Message};
use crate::config::MediaMode;
use crate::error::{Error, Result};
use crate::pipeline::stream::ByteStream;

/// Which Bot API method carries the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Audio,
    Document,
}

impl PayloadKind {
    pub fn for_mode(mode: MediaMode) -> Self {
        match mode {
            MediaMode::Audio => PayloadKind::Audio,
            MediaMode::Video => PayloadKind::Document,
        }
    }

    /// Bot API method name.
    pub fn method(&self) -> &'static str {
        match self {
            PayloadKind::Audio => "sendAudio",
            PayloadKind::Document => "sendDocument",
        }
    }

    /// Multipart field holding the file.
    pub fn field(&self) -> &'static str {
        match self {
            PayloadKind::Audio => "audio",
            PayloadKind::Document => "document",
        }
    }
}

/// A stream to deliver and how to present it.
pub struct UploadRequest {
    pub stream: ByteStream,
    pub file_name: String,
    pub kind: PayloadKind,
    /// Exact length when known up front; otherwise the body is chunked.
    pub length: Option<u64>,
}

/// Proof of a finished delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub message_id: i64,
}

/// Remote destination for finished media.
///
/// An upload either consumes the whole stream and returns a receipt, or
/// fails; there is no partial success.
#[async_trait]
pub trait UploadSink: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt>;
}

/// Sends files to one chat through a bot.
pub struct TelegramSink {
    client: Client,
    api_base: String,
    token: String,
    chat_id: i64,
}

impl TelegramSink {
    pub fn new(client: Client, api_base: &str, token: String, chat_id: i64) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            chat_id,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }
}

#[async_trait]
impl UploadSink for TelegramSink {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt> {
        let UploadRequest {
            stream,
            file_name,
            kind,
            length,
        } = request;

        let mime = mime_guess::from_path(&file_name).first_or_octet_stream();
        let body = Body::wrap_stream(stream);
        let part = match length {
            Some(length) => Part::stream_with_length(body, length),
            None => Part::stream(body),
        }
        .file_name(file_name.clone())
        .mime_str(mime.essence_str())
        .map_err(|e| Error::Upload(format!("Invalid MIME type {}: {}", mime, e)))?;

        let form = Form::new()
            .text("chat_id", self.chat_id.to_string())
            .part(kind.field(), part);

        tracing::debug!("POST {} ({})", kind.method(), file_name);

        let response = self
            .client
            .post(self.method_url(kind.method()))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upload(format!("Request failed: {}", e.without_url())))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Upload(format!("Failed to read response: {}", e.without_url())))?;

        let parsed: ApiResponse<Message> = serde_json::from_str(&text).map_err(|_| {
            Error::Upload(format!("HTTP {}: unexpected response body", status))
        })?;

        if !parsed.ok {
            let code = parsed
                .error_code
                .unwrap_or_else(|| i64::from(status.as_u16()));
            return Err(Error::Upload(format!(
                "Bot API error {}: {}",
                code,
                parsed
                    .description
                    .unwrap_or_else(|| "request rejected".to_string())
            )));
        }

        let message = parsed
            .result
            .ok_or_else(|| Error::Upload("Response carried no message".into()))?;

        Ok(UploadReceipt {
            message_id: message.message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stream::tests::chunks;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_payload_kind_per_mode() {
        assert_eq!(PayloadKind::for_mode(MediaMode::Audio).method(), "sendAudio");
        assert_eq!(PayloadKind::for_mode(MediaMode::Video).method(), "sendDocument");
        assert_eq!(PayloadKind::Document.field(), "document");
    }

    #[tokio::test]
    async fn test_upload_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendAudio"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"ok":true,"result":{"message_id":7}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sink = TelegramSink::new(Client::new(), &server.uri(), "123:abc".into(), -42);
        let receipt = sink
            .upload(UploadRequest {
                stream: chunks(&["ID3", "payload-bytes"]),
                file_name: "song.mp3".into(),
                kind: PayloadKind::Audio,
                length: None,
            })
            .await
            .unwrap();

        assert_eq!(receipt.message_id, 7);

        let requests = server.received_requests().await.unwrap();
        let body = &requests[0].body;
        assert!(contains(body, b"ID3payload-bytes"));
        assert!(contains(body, b"filename=\"song.mp3\""));
        assert!(contains(body, b"name=\"audio\""));
        assert!(contains(body, b"-42"));
        assert!(contains(body, b"audio/mpeg"));
    }

    #[tokio::test]
    async fn test_upload_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendDocument"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
            ))
            .mount(&server)
            .await;

        let sink = TelegramSink::new(Client::new(), &server.uri(), "123:abc".into(), 1);
        let result = sink
            .upload(UploadRequest {
                stream: chunks(&["data"]),
                file_name: "clip.mp4".into(),
                kind: PayloadKind::Document,
                length: Some(4),
            })
            .await;

        match result {
            Err(Error::Upload(msg)) => {
                assert!(msg.contains("Bot API error 400"));
                assert!(msg.contains("chat not found"));
            }
            other => panic!("expected upload error, got {:?}", other.map(|r| r.message_id)),
        }
    }

    #[tokio::test]
    async fn test_upload_fails_on_stream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"ok":true,"result":{"message_id":1}}"#),
            )
            .mount(&server)
            .await;

        let stream: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(bytes::Bytes::from_static(b"abc")),
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom")),
        ]));

        let sink = TelegramSink::new(Client::new(), &server.uri(), "t".into(), 1);
        let result = sink
            .upload(UploadRequest {
                stream,
                file_name: "clip.mp4".into(),
                kind: PayloadKind::Document,
                length: None,
            })
            .await;

        assert!(matches!(result, Err(Error::Upload(_))));
    }
}
