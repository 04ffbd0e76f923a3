//! Transcoding stage: an external process spliced into the byte stream.
//!
//! The upstream stream is written to the child's stdin by a feeder task
//! while the child's stdout becomes the downstream stream. The stage's
//! completion resolves once the child has exited and the feeder finished.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;

use crate::error::{Error, Result};
use crate::pipeline::stream::{into_io_error, stream_error, ByteStream, Completion};

/// How to launch the transcoder.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl TranscodeCommand {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Quiet ffmpeg reading from stdin and writing MP3 at `bitrate` to stdout.
    pub fn ffmpeg_mp3(ffmpeg: &Path, bitrate: &str) -> Self {
        Self::new(
            ffmpeg,
            [
                "-v", "quiet", "-i", "pipe:0", "-b:a", bitrate, "-f", "mp3", "pipe:1",
            ],
        )
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

/// A running transcoder spliced into the pipeline.
pub struct TranscodeStage {
    /// Encoded output. Ends with an error item if the process fails, so a
    /// consumer never mistakes truncated output for a finished file.
    pub output: ByteStream,
    /// Resolves when the process has exited and its input has been fed.
    pub completion: Completion<()>,
}

/// Spawn the transcoder and feed it `input`.
pub fn spawn_transcoder(command: &TranscodeCommand, input: ByteStream) -> Result<TranscodeStage> {
    let name = command.program.display().to_string();
    tracing::debug!("Spawning transcoder: {} {:?}", name, command.args);

    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Transcode(format!("{} not found", name))
            } else {
                Error::Transcode(format!("Failed to run {}: {}", name, e))
            }
        })?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| Error::Transcode("Transcoder stdin unavailable".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Transcode("Transcoder stdout unavailable".into()))?;

    let feeder = tokio::spawn(feed(input, stdin));
    let (exit_tx, exit_rx) = oneshot::channel::<Option<Error>>();

    let completion: Completion<()> = Box::pin(async move {
        let result = wait_for_exit(child, feeder, &name).await;
        let _ = exit_tx.send(result.as_ref().err().map(Error::duplicate));
        if result.is_ok() {
            tracing::info!("Conversion finished");
        }
        result
    });

    // Hold back end-of-stream until the exit status is known.
    let tail = futures::stream::once(async move {
        match exit_rx.await {
            Ok(None) => None,
            Ok(Some(err)) => Some(Err(into_io_error(err))),
            Err(_) => Some(Err(into_io_error(Error::Transcode(
                "Transcoder was dropped before exiting".into(),
            )))),
        }
    })
    .filter_map(futures::future::ready);

    let output: ByteStream = Box::pin(ReaderStream::new(stdout).chain(tail));

    Ok(TranscodeStage { output, completion })
}

/// Write the upstream stream into the child's stdin, then close it.
async fn feed(mut input: ByteStream, mut stdin: ChildStdin) -> Result<u64> {
    let mut fed: u64 = 0;

    while let Some(chunk) = input.next().await {
        let chunk = chunk.map_err(stream_error)?;
        stdin
            .write_all(&chunk)
            .await
            .map_err(|e| Error::Transcode(format!("Failed to feed transcoder: {}", e)))?;
        fed += chunk.len() as u64;
    }

    stdin
        .shutdown()
        .await
        .map_err(|e| Error::Transcode(format!("Failed to close transcoder input: {}", e)))?;

    Ok(fed)
}

async fn wait_for_exit(mut child: Child, feeder: JoinHandle<Result<u64>>, name: &str) -> Result<()> {
    let status = child
        .wait()
        .await
        .map_err(|e| Error::Transcode(format!("Failed to wait for {}: {}", name, e)))?;
    let fed = feeder
        .await
        .map_err(|e| Error::Transcode(format!("Transcoder feeder failed: {}", e)))?;

    match fed {
        // An upstream failure explains whatever the process did next.
        Err(e @ Error::Download(_)) | Err(e @ Error::Http(_)) => Err(e),
        _ if !status.success() => Err(Error::Transcode(format!(
            "{} exited with {}",
            name, status
        ))),
        Err(e) => Err(e),
        Ok(bytes) => {
            tracing::debug!("Transcoder consumed {} bytes", bytes);
            Ok(())
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::pipeline::stream::tests::chunks;

    async fn collect(mut stream: ByteStream) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.map_err(stream_error)?);
        }
        Ok(out)
    }

    #[test]
    fn test_ffmpeg_arguments() {
        let command = TranscodeCommand::ffmpeg_mp3(Path::new("/usr/bin/ffmpeg"), "160k");
        let args: Vec<_> = command
            .args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            ["-v", "quiet", "-i", "pipe:0", "-b:a", "160k", "-f", "mp3", "pipe:1"]
        );
        assert_eq!(command.program(), Path::new("/usr/bin/ffmpeg"));
    }

    #[tokio::test]
    async fn test_identity_transcoder_preserves_bytes() {
        let command = TranscodeCommand::new("cat", Vec::<String>::new());
        let stage = spawn_transcoder(&command, chunks(&["first ", "second ", "third"])).unwrap();

        let (_, out) = futures::try_join!(stage.completion, collect(stage.output)).unwrap();
        assert_eq!(out, b"first second third");
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails_stage_and_stream() {
        let command = TranscodeCommand::new("sh", ["-c", "head -c 3 >/dev/null; exit 3"]);
        let stage = spawn_transcoder(&command, chunks(&["abcdef"; 50])).unwrap();

        let (done, out) = futures::join!(stage.completion, collect(stage.output));
        assert!(matches!(done, Err(Error::Transcode(_))));
        assert!(matches!(out, Err(Error::Transcode(_))));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let command = TranscodeCommand::new("/nonexistent/ffmpeg", ["-v", "quiet"]);
        let result = spawn_transcoder(&command, chunks(&["x"]));
        assert!(matches!(result, Err(Error::Transcode(_))));
    }
}
