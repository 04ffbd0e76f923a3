//! Byte stream plumbing shared by every pipeline stage.
//!
//! A stage hands its output downstream as an owned [`ByteStream`] and reports
//! its own termination through a [`Completion`]. Streams are consumed exactly
//! once; the only fan-out is [`tee`].

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};

/// Owned, in-order stream of byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Terminal signal of a stage.
pub type Completion<T> = BoxFuture<'static, Result<T>>;

/// Buffered chunks per tee branch.
pub const TEE_CAPACITY: usize = 16;

/// Completion that resolves immediately, for stages that are not active.
pub fn ready() -> Completion<()> {
    Box::pin(async { Ok::<(), Error>(()) })
}

/// Await a spawned stage task, surfacing panics as errors.
pub fn join_task<T: Send + 'static>(handle: JoinHandle<Result<T>>) -> Completion<T> {
    Box::pin(async move {
        handle
            .await
            .map_err(|e| Error::Download(format!("Pipeline task failed: {}", e)))?
    })
}

/// Wrap a pipeline error so it can travel inside a byte stream.
pub fn into_io_error(err: Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

/// Recover a pipeline error from a stream item, if one was wrapped.
pub fn stream_error(err: io::Error) -> Error {
    let kind = err.kind();
    match err.into_inner() {
        Some(inner) => match inner.downcast::<Error>() {
            Ok(err) => *err,
            Err(other) => Error::Download(format!("Stream error: {}", other)),
        },
        None => Error::Download(format!("Stream error: {}", kind)),
    }
}

/// Drain a stream into a new file at `path`, returning the bytes written.
pub async fn write_to_file(mut stream: ByteStream, path: &Path) -> Result<u64> {
    let mut file = File::create(path).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(stream_error)?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    tracing::debug!("Wrote {} bytes to {}", written, path.display());

    Ok(written)
}

/// Two independently consumed copies of one stream.
pub struct Tee {
    pub left: ByteStream,
    pub right: ByteStream,
    /// Resolves with the number of bytes pulled from the source.
    pub completion: Completion<u64>,
}

/// Split `source` into two byte-identical branches.
///
/// Each branch has its own bounded buffer of `capacity` chunks, and the
/// source is only polled once both branches have room, so the slower
/// consumer sets the pace. A branch whose consumer is dropped is detached
/// and the other branch keeps receiving data.
pub fn tee(source: ByteStream, capacity: usize) -> Tee {
    let (left_tx, left_rx) = mpsc::channel(capacity);
    let (right_tx, right_rx) = mpsc::channel(capacity);

    let handle = tokio::spawn(drive_tee(source, left_tx, right_tx));

    Tee {
        left: receiver_stream(left_rx),
        right: receiver_stream(right_rx),
        completion: join_task(handle),
    }
}

type ChunkSender = mpsc::Sender<io::Result<Bytes>>;

async fn drive_tee(
    mut source: ByteStream,
    left_tx: ChunkSender,
    right_tx: ChunkSender,
) -> Result<u64> {
    let mut left = Some(left_tx);
    let mut right = Some(right_tx);
    let mut total: u64 = 0;

    while let Some(item) = source.next().await {
        match item {
            Ok(chunk) => {
                total += chunk.len() as u64;
                let (left_open, right_open) = futures::join!(
                    forward(left.as_ref(), Ok(chunk.clone())),
                    forward(right.as_ref(), Ok(chunk)),
                );
                if !left_open && left.take().is_some() {
                    tracing::debug!("Tee: left branch detached after {} bytes", total);
                }
                if !right_open && right.take().is_some() {
                    tracing::debug!("Tee: right branch detached after {} bytes", total);
                }
                if left.is_none() && right.is_none() {
                    return Ok(total);
                }
            }
            Err(e) => {
                let err = stream_error(e);
                futures::join!(
                    forward(left.as_ref(), Err(into_io_error(err.duplicate()))),
                    forward(right.as_ref(), Err(into_io_error(err.duplicate()))),
                );
                return Err(err);
            }
        }
    }

    Ok(total)
}

/// Send to a branch; returns false if the branch is (or just became) closed.
async fn forward(branch: Option<&ChunkSender>, item: io::Result<Bytes>) -> bool {
    match branch {
        Some(tx) => tx.send(item).await.is_ok(),
        None => false,
    }
}

fn receiver_stream(rx: mpsc::Receiver<io::Result<Bytes>>) -> ByteStream {
    Box::pin(futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    }))
}

/// Shared counters of a [`ThresholdGuard`].
#[derive(Debug, Default)]
pub struct GuardState {
    seen: AtomicU64,
    tripped: AtomicBool,
}

impl GuardState {
    /// Bytes let through (or rejected) so far.
    pub fn bytes_seen(&self) -> u64 {
        self.seen.load(Ordering::SeqCst)
    }

    /// Whether the stream was cut off at the threshold.
    pub fn tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}

/// Cuts a stream off with an error as soon as its size reaches a threshold.
///
/// The chunk that reaches the threshold is never forwarded, so a consumer
/// only ever sees a complete stream when it is strictly below the threshold.
pub struct ThresholdGuard {
    inner: ByteStream,
    threshold: u64,
    state: Arc<GuardState>,
    done: bool,
}

impl ThresholdGuard {
    pub fn new(inner: ByteStream, threshold: u64) -> (Self, Arc<GuardState>) {
        let state = Arc::new(GuardState::default());
        let guard = Self {
            inner,
            threshold,
            state: Arc::clone(&state),
            done: false,
        };
        (guard, state)
    }
}

impl Stream for ThresholdGuard {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                let seen = this.state.seen.fetch_add(chunk.len() as u64, Ordering::SeqCst)
                    + chunk.len() as u64;
                if seen >= this.threshold {
                    this.state.tripped.store(true, Ordering::SeqCst);
                    this.done = true;
                    return Poll::Ready(Some(Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("upload threshold of {} bytes reached", this.threshold),
                    ))));
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}
