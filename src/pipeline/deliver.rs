//! Delivery stage: routes the finished stream to disk and/or the upload sink.

use std::path::PathBuf;

use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::api::{PayloadKind, UploadRequest, UploadSink};
use crate::error::{Error, Result};
use crate::pipeline::retention::UploadStatus;
use crate::pipeline::session::TransferSession;
use crate::pipeline::stream::{tee, write_to_file, ByteStream, Completion, ThresholdGuard, TEE_CAPACITY};

/// What the delivery stage produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Final size of the delivered content.
    pub bytes_written: u64,
    pub upload: UploadStatus,
    /// Local copy, if one was written.
    pub local_path: Option<PathBuf>,
}

/// Write everything to disk, then upload the finished file if it is small
/// enough.
///
/// `upstream` is awaited together with the disk write, so a failing
/// transcoder fails the stage before any upload starts.
pub async fn deliver_sequential(
    sink: &dyn UploadSink,
    session: &TransferSession,
    stream: ByteStream,
    upstream: Completion<()>,
) -> Result<DeliveryOutcome> {
    let path = session
        .local_path()
        .ok_or_else(|| Error::MissingConfig("LOCAL_DIRECTORY".to_string()))?;

    let (_, written) = futures::try_join!(upstream, write_to_file(stream, &path))?;
    let size = tokio::fs::metadata(&path).await?.len();
    tracing::debug!("Local copy {} holds {} bytes ({} streamed)", path.display(), size, written);

    if size >= session.upload_threshold {
        tracing::info!(
            "{} is {} bytes, at or above the upload limit of {}; keeping it on disk",
            session.file_name,
            size,
            session.upload_threshold
        );
        return Ok(DeliveryOutcome {
            bytes_written: size,
            upload: UploadStatus::SkippedOverThreshold,
            local_path: Some(path),
        });
    }

    let file = File::open(&path).await?;
    tracing::info!("Start uploading file {}", session.file_name);
    let receipt = sink
        .upload(UploadRequest {
            stream: Box::pin(ReaderStream::new(file)),
            file_name: session.file_name.clone(),
            kind: session.payload_kind(),
            length: Some(size),
        })
        .await?;
    tracing::info!("Finish uploading file {}", session.file_name);

    Ok(DeliveryOutcome {
        bytes_written: size,
        upload: UploadStatus::Delivered {
            message_id: receipt.message_id,
        },
        local_path: Some(path),
    })
}

/// Upload while the stream is still arriving.
///
/// With a local directory the stream is teed into a file writer and the
/// upload; without one it goes to the upload alone. The upload branch is
/// abandoned once the content reaches the threshold, in which case the
/// local copy is the only result (and its absence is an error).
pub async fn deliver_concurrent(
    sink: &dyn UploadSink,
    session: &TransferSession,
    stream: ByteStream,
    upstream: Completion<()>,
) -> Result<DeliveryOutcome> {
    let threshold = session.upload_threshold;
    let local_path = session.local_path();

    // Untranscoded content is exactly the declared size, so the verdict is
    // known before the first byte.
    let known_oversize = !session.mode.needs_transcoding()
        && session.declared_total.map_or(false, |total| total >= threshold);

    if known_oversize {
        let path = local_path.ok_or(Error::ThresholdExceeded { threshold })?;
        tracing::info!(
            "{} is declared at or above the upload limit of {}; keeping it on disk",
            session.file_name,
            threshold
        );
        let (_, written) = futures::try_join!(upstream, write_to_file(stream, &path))?;
        return Ok(DeliveryOutcome {
            bytes_written: written,
            upload: UploadStatus::SkippedOverThreshold,
            local_path: Some(path),
        });
    }

    match local_path {
        None => {
            let upload = async {
                match guarded_upload(sink, stream, threshold, &session.file_name, session.payload_kind()).await? {
                    (UploadStatus::SkippedOverThreshold, _) => {
                        Err(Error::ThresholdExceeded { threshold })
                    }
                    delivered => Ok(delivered),
                }
            };
            let (_, (status, sent)) = futures::try_join!(upstream, upload)?;
            Ok(DeliveryOutcome {
                bytes_written: sent,
                upload: status,
                local_path: None,
            })
        }
        Some(path) => {
            let branches = tee(stream, TEE_CAPACITY);
            let (_, total, written, (status, _)) = futures::try_join!(
                upstream,
                branches.completion,
                write_to_file(branches.left, &path),
                guarded_upload(
                    sink,
                    branches.right,
                    threshold,
                    &session.file_name,
                    session.payload_kind()
                ),
            )?;
            tracing::debug!("Tee moved {} bytes, {} written locally", total, written);
            Ok(DeliveryOutcome {
                bytes_written: written,
                upload: status,
                local_path: Some(path),
            })
        }
    }
}

/// Upload through a [`ThresholdGuard`], mapping a guard trip to a skip.
///
/// Returns the upload status and the number of bytes the guard saw.
async fn guarded_upload(
    sink: &dyn UploadSink,
    stream: ByteStream,
    threshold: u64,
    file_name: &str,
    kind: PayloadKind,
) -> Result<(UploadStatus, u64)> {
    let (guard, state) = ThresholdGuard::new(stream, threshold);

    tracing::info!("Start uploading file {}", file_name);
    let result = sink
        .upload(UploadRequest {
            stream: Box::pin(guard),
            file_name: file_name.to_string(),
            kind,
            length: None,
        })
        .await;

    match result {
        Ok(receipt) => {
            tracing::info!("Finish uploading file {}", file_name);
            Ok((
                UploadStatus::Delivered {
                    message_id: receipt.message_id,
                },
                state.bytes_seen(),
            ))
        }
        Err(_) if state.tripped() => {
            tracing::info!(
                "{} reached the upload limit of {} bytes; upload abandoned",
                file_name,
                threshold
            );
            Ok((UploadStatus::SkippedOverThreshold, state.bytes_seen()))
        }
        Err(e) => Err(e),
    }
}
