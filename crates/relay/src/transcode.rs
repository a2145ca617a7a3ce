//! ffmpeg transcode pipeline.
//!
//! Wires an HTTP byte source into an ffmpeg subprocess encoding MP3 on
//! stdout. One feeder task per pipeline drains the source into the child's
//! stdin while the caller-facing stream drains stdout; backpressure comes
//! from the OS pipe buffers plus a capacity-1 channel, so in-flight bytes
//! stay bounded regardless of media size.

use std::process::Stdio;
use std::sync::LazyLock;

use bytes::Bytes;
use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, warn};

use crate::command;
use crate::error::{RelayError, Result};
use crate::stream::{ByteStream, STREAM_CHUNK_SIZE};

static DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

static FFMPEG_AVAILABLE: LazyLock<bool> =
    LazyLock::new(|| command::probe_version(DEFAULT_FFMPEG_PATH, "-version").is_some());

/// Arguments directing ffmpeg to read raw media on stdin and emit MP3 on
/// stdout at minimal log verbosity.
const ENCODER_ARGS: [&str; 10] = [
    "-loglevel", "error", "-i", "pipe:0", "-vn", "-f", "mp3", "-codec:a", "libmp3lame", "pipe:1",
];

/// MP3 transcode pipeline around an external ffmpeg binary.
#[derive(Debug, Clone)]
pub struct TranscodePipeline {
    binary_path: String,
}

impl TranscodePipeline {
    /// Whether the default ffmpeg binary is on the search path.
    pub fn is_available() -> bool {
        *FFMPEG_AVAILABLE
    }

    /// Create a pipeline, honoring the `FFMPEG_PATH` override.
    pub fn from_env() -> Result<Self> {
        let binary_path =
            std::env::var("FFMPEG_PATH").unwrap_or_else(|_| DEFAULT_FFMPEG_PATH.to_string());

        let available = if binary_path == DEFAULT_FFMPEG_PATH {
            Self::is_available()
        } else {
            command::probe_version(&binary_path, "-version").is_some()
        };
        if !available {
            return Err(RelayError::tool_unavailable("ffmpeg"));
        }

        Ok(Self { binary_path })
    }

    /// Create a pipeline for an explicit binary path without probing.
    pub fn with_binary(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Pipe `source` through the encoder and return the MP3 byte stream.
    ///
    /// The returned stream owns the child process: exhausting or dropping it
    /// reaps the process on every path. A non-zero exit surfaces as a final
    /// error item carrying the child's stderr text, after every byte the
    /// child produced has been yielded.
    pub fn transcode(&self, source: ByteStream) -> Result<ByteStream> {
        self.run(&ENCODER_ARGS, source)
    }

    fn run(&self, args: &[&str], source: ByteStream) -> Result<ByteStream> {
        let mut cmd = command::tokio_command(&self.binary_path);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // The source is dropped on spawn failure since nothing will drain it.
        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RelayError::tool_unavailable("ffmpeg")
            } else {
                RelayError::Io(e)
            }
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RelayError::tool_failure("unable to start audio encoder"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| RelayError::tool_failure("unable to start audio encoder"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| RelayError::tool_failure("unable to start audio encoder"))?;

        // Feeder: drain the source into the child's stdin. A write error
        // means the encoder exited early, which is expected when the
        // consumer stops reading; stop silently instead of raising.
        let feeder = tokio::spawn(async move {
            let mut source = source;
            while let Some(chunk) = source.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(error) => {
                        warn!(%error, "media source failed while feeding encoder");
                        break;
                    }
                };
                if stdin.write_all(&chunk).await.is_err() {
                    break;
                }
            }
            let _ = stdin.shutdown().await;
            // stdin and the source are closed here on every exit reason
        });

        // Collect diagnostics concurrently so a chatty child cannot block
        // on a full stderr pipe.
        let diagnostics = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        let binary = self.binary_path.clone();
        let (tx, rx) = mpsc::channel::<Result<Bytes>>(1);

        tokio::spawn(async move {
            let mut buffer = vec![0u8; STREAM_CHUNK_SIZE];
            let mut abandoned = false;

            loop {
                tokio::select! {
                    _ = tx.closed() => {
                        abandoned = true;
                        break;
                    }
                    result = stdout.read(&mut buffer) => match result {
                        Ok(0) => break,
                        Ok(n) => {
                            if tx.send(Ok(Bytes::copy_from_slice(&buffer[..n]))).await.is_err() {
                                abandoned = true;
                                break;
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(RelayError::Io(e))).await;
                            abandoned = true;
                            break;
                        }
                    }
                }
            }
            drop(stdout);

            if abandoned {
                // Consumer went away mid-stream: force-terminate and reap.
                // The feeder may be parked on a network read nobody will
                // drain anymore; aborting it releases the connection.
                debug!("consumer abandoned transcode stream, terminating encoder");
                let _ = child.start_kill();
                let _ = child.wait().await;
                feeder.abort();
                let _ = feeder.await;
                return;
            }

            let _ = feeder.await;

            let status = match child.wait().await {
                Ok(status) => status,
                Err(e) => {
                    error!(error = %e, "failed to reap encoder process");
                    return;
                }
            };

            if !status.success() {
                let diagnostic = diagnostics
                    .await
                    .ok()
                    .map(|buf| String::from_utf8_lossy(&buf).trim().to_string())
                    .filter(|text| !text.is_empty());
                let message = diagnostic.unwrap_or_else(|| {
                    format!(
                        "{binary} exited with code {}",
                        status
                            .code()
                            .map_or_else(|| "unknown".to_string(), |c| c.to_string())
                    )
                });
                let _ = tx.send(Err(RelayError::tool_failure(message))).await;
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::stream;

    fn source_of(chunks: Vec<&'static [u8]>) -> ByteStream {
        Box::pin(stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c))),
        ))
    }

    async fn collect(mut stream: ByteStream) -> (Vec<u8>, Option<RelayError>) {
        let mut bytes = Vec::new();
        let mut error = None;
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => bytes.extend_from_slice(&chunk),
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }
        (bytes, error)
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn pipes_bytes_through_the_subprocess_in_order() {
        let pipeline = TranscodePipeline::with_binary("cat");
        let out = pipeline
            .run(&[], source_of(vec![b"hello ", b"transcoded ", b"world"]))
            .unwrap();
        let (bytes, error) = collect(out).await;
        assert_eq!(bytes, b"hello transcoded world");
        assert!(error.is_none());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn nonzero_exit_yields_produced_bytes_then_diagnostic_error() {
        let pipeline = TranscodePipeline::with_binary("sh");
        let out = pipeline
            .run(
                &["-c", "head -c 4; echo boom >&2; exit 3"],
                source_of(vec![b"hello world"]),
            )
            .unwrap();
        let (bytes, error) = collect(out).await;
        assert_eq!(bytes, b"hell");
        match error {
            Some(RelayError::ToolFailure { message }) => assert_eq!(message, "boom"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn nonzero_exit_without_diagnostics_reports_the_code() {
        let pipeline = TranscodePipeline::with_binary("sh");
        let out = pipeline
            .run(&["-c", "cat >/dev/null; exit 7"], source_of(vec![b"x"]))
            .unwrap();
        let (bytes, error) = collect(out).await;
        assert!(bytes.is_empty());
        match error {
            Some(RelayError::ToolFailure { message }) => {
                assert_eq!(message, "sh exited with code 7")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn missing_binary_is_tool_unavailable() {
        let pipeline = TranscodePipeline::with_binary("/nonexistent/ffmpeg");
        let err = pipeline.run(&[], source_of(vec![b"x"])).err().unwrap();
        assert!(matches!(err, RelayError::ToolUnavailable { tool: "ffmpeg" }));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn dropping_the_stream_kills_and_reaps_the_subprocess() {
        fn live_cat_children() -> usize {
            let out = std::process::Command::new("ps")
                .args(["-o", "comm=", "--ppid", &std::process::id().to_string()])
                .output()
                .unwrap();
            String::from_utf8_lossy(&out.stdout)
                .lines()
                .filter(|line| line.trim() == "cat")
                .count()
        }

        let endless: ByteStream = Box::pin(stream::repeat_with(|| {
            Ok(Bytes::from_static(&[0u8; 1024]))
        }));
        let pipeline = TranscodePipeline::with_binary("cat");
        let mut out = pipeline.run(&[], endless).unwrap();

        assert!(out.next().await.unwrap().is_ok());
        drop(out);

        // A zombie would keep showing up in ps until reaped, so polling to
        // zero covers both the kill and the wait.
        for _ in 0..50 {
            if live_cat_children() == 0 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("subprocess still running after the stream was dropped");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn empty_source_with_clean_exit_produces_empty_stream() {
        let pipeline = TranscodePipeline::with_binary("cat");
        let out = pipeline.run(&[], source_of(vec![])).unwrap();
        let (bytes, error) = collect(out).await;
        assert!(bytes.is_empty());
        assert!(error.is_none());
    }
}
