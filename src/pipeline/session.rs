//! Transfer sessions and the pipeline that runs them.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::api::{PayloadKind, UploadSink};
use crate::config::{DeliveryMode, MediaMode, RetentionIntent, ValidatedConfig};
use crate::error::{Error, Result};
use crate::fs::{local_output_path, output_file_name, remove_local_file};
use crate::output::progress::{observe, ProgressObserver};
use crate::pipeline::deliver::{deliver_concurrent, deliver_sequential, DeliveryOutcome};
use crate::pipeline::retention::{decide, RetentionDecision};
use crate::pipeline::stream::{ready, ByteStream};
use crate::pipeline::transcode::{spawn_transcoder, TranscodeCommand};
use crate::source::SourceLink;

/// Everything one transfer needs, fixed before the first byte moves.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSession {
    pub source_url: Url,
    /// Size announced by the source; a hint, not a contract.
    pub declared_total: Option<u64>,
    /// Sanitized output name with the mode's extension.
    pub file_name: String,
    pub mode: MediaMode,
    pub retention: RetentionIntent,
    pub upload_threshold: u64,
    pub delivery_mode: DeliveryMode,
    pub local_directory: Option<PathBuf>,
}

impl TransferSession {
    /// Build a session from validated configuration and the user's answers.
    pub fn new(
        config: &ValidatedConfig,
        link: &SourceLink,
        declared_total: Option<u64>,
        name: &str,
        mode: MediaMode,
        retention: RetentionIntent,
    ) -> Result<Self> {
        let file_name = output_file_name(name, mode)?;

        if retention == RetentionIntent::Keep && config.local_directory.is_none() {
            return Err(Error::Config(
                "Keeping a local copy requires LOCAL_DIRECTORY".to_string(),
            ));
        }

        Ok(Self {
            source_url: link.url().clone(),
            declared_total,
            file_name,
            mode,
            retention,
            upload_threshold: config.upload_threshold,
            delivery_mode: config.delivery_mode,
            local_directory: config.local_directory.clone(),
        })
    }

    /// Where the local copy goes, if this session writes one.
    pub fn local_path(&self) -> Option<PathBuf> {
        self.local_directory
            .as_deref()
            .map(|dir| local_output_path(dir, &self.file_name))
    }

    pub fn payload_kind(&self) -> PayloadKind {
        PayloadKind::for_mode(self.mode)
    }
}

/// Result of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub outcome: DeliveryOutcome,
    /// `None` when no local copy was written.
    pub decision: Option<RetentionDecision>,
}

impl SessionReport {
    /// The local file, if it survived the session.
    pub fn retained_file(&self) -> Option<&Path> {
        match self.decision {
            Some(RetentionDecision::Keep) => self.outcome.local_path.as_deref(),
            _ => None,
        }
    }
}

/// Runs sessions: progress, optional transcoding, delivery, retention.
pub struct Pipeline<S> {
    sink: S,
    transcoder: TranscodeCommand,
    cancel: CancellationToken,
}

impl<S: UploadSink> Pipeline<S> {
    pub fn new(sink: S, transcoder: TranscodeCommand) -> Self {
        Self {
            sink,
            transcoder,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token to cancel in-flight transfers.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run one session over an already opened source stream.
    ///
    /// Every terminal signal of the stage graph is awaited concurrently and
    /// the first failure aborts the session. The retention policy is applied
    /// only after all of them resolved.
    pub async fn run(
        &self,
        session: &TransferSession,
        source: ByteStream,
        observer: Box<dyn ProgressObserver>,
    ) -> Result<SessionReport> {
        tracing::info!("Downloading {} file {}", session.mode, session.file_name);

        let stream = observe(source, session.declared_total, observer);

        let (stream, upstream) = if session.mode.needs_transcoding() {
            let stage = spawn_transcoder(&self.transcoder, stream)?;
            (stage.output, stage.completion)
        } else {
            (stream, ready())
        };

        let delivery = async {
            match session.delivery_mode {
                DeliveryMode::Sequential => {
                    deliver_sequential(&self.sink, session, stream, upstream).await
                }
                DeliveryMode::Concurrent => {
                    deliver_concurrent(&self.sink, session, stream, upstream).await
                }
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            outcome = delivery => outcome,
        }?;

        let decision = match &outcome.local_path {
            Some(path) => {
                let decision = decide(
                    outcome.bytes_written,
                    session.upload_threshold,
                    outcome.upload,
                    session.retention,
                );
                if decision == RetentionDecision::Delete {
                    remove_local_file(path).await?;
                    tracing::debug!("Removed local copy {}", path.display());
                }
                Some(decision)
            }
            None => None,
        };

        Ok(SessionReport { outcome, decision })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: Option<&Path>) -> ValidatedConfig {
        ValidatedConfig {
            ffmpeg_path: PathBuf::from("/usr/bin/ffmpeg"),
            bot_token: "t".into(),
            chat_id: 1,
            local_directory: dir.map(Path::to_path_buf),
            delivery_mode: DeliveryMode::Concurrent,
            upload_threshold: 100,
        }
    }

    fn link() -> SourceLink {
        SourceLink::parse("https://example.com/videoplayback?mime=video/mp4").unwrap()
    }

    #[test]
    fn test_session_forces_extension() {
        let session = TransferSession::new(
            &config(Some(Path::new("/media"))),
            &link(),
            Some(10),
            "talk: intro",
            MediaMode::Audio,
            RetentionIntent::Discard,
        )
        .unwrap();

        assert_eq!(session.file_name, "talk_ intro.mp3");
        assert_eq!(session.local_path(), Some(PathBuf::from("/media/talk_ intro.mp3")));
        assert_eq!(session.payload_kind(), PayloadKind::Audio);
    }

    #[test]
    fn test_keep_without_directory_rejected() {
        let result = TransferSession::new(
            &config(None),
            &link(),
            None,
            "clip",
            MediaMode::Video,
            RetentionIntent::Keep,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_retained_file() {
        let outcome = DeliveryOutcome {
            bytes_written: 5,
            upload: crate::pipeline::retention::UploadStatus::SkippedOverThreshold,
            local_path: Some(PathBuf::from("/media/a.mp4")),
        };
        let kept = SessionReport {
            outcome: outcome.clone(),
            decision: Some(RetentionDecision::Keep),
        };
        let deleted = SessionReport {
            outcome,
            decision: Some(RetentionDecision::Delete),
        };
        assert_eq!(kept.retained_file(), Some(Path::new("/media/a.mp4")));
        assert_eq!(deleted.retained_file(), None);
    }
}
