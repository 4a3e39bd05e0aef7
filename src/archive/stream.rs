//! Producer/consumer plumbing between the encoder and an HTTP body.
//!
//! Each archive gets a bounded in-memory pipe. The encoder runs on a blocking
//! thread and writes into one end through a [`SyncIoBridge`]; the response
//! reads the other end as an [`AsyncRead`]. A full pipe suspends the encoder
//! until the client catches up, and dropping the reading end makes the next
//! write fail with `BrokenPipe`, which unwinds the encoder and closes every
//! handle it holds.
//!
//! A plain tar cut between two entries still parses, so when the encoder
//! fails the end of the pipe is reported as an error instead of an EOF.

use humansize::{DECIMAL, format_size};
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use tokio::io::{AsyncRead, DuplexStream, ReadBuf};
use tokio::task::JoinHandle;
use tokio_util::io::SyncIoBridge;
use tracing::{error, info, warn};

use super::{ArchiveMetrics, ArchiveRequest, encode};
use crate::config::ServeConfig;
use crate::error::Result;

/// Readable end of an archive being generated
pub struct ArchiveStream {
    reader: DuplexStream,
    task: JoinHandle<Result<()>>,
    metrics: Arc<ArchiveMetrics>,
}

impl ArchiveStream {
    /// Start encoding `request` on a blocking thread
    ///
    /// The target directory is checked before anything is spawned, so a
    /// missing directory surfaces here as `NotFound`. Must be called from
    /// within a tokio runtime.
    pub fn spawn(config: &ServeConfig, request: &ArchiveRequest) -> Result<Self> {
        let walker = request.walker(&config.root)?;
        let (reader, writer) = tokio::io::duplex(config.pipe_capacity);
        let writer = SyncIoBridge::new(writer);

        let metrics = ArchiveMetrics::new();
        let task_metrics = Arc::clone(&metrics);
        let format = request.format;
        let gzip_level = config.gzip_level;
        let name = request.file_name();

        let task = tokio::task::spawn_blocking(move || {
            let result = encode(&walker, writer, format, gzip_level, &task_metrics)
                .and_then(|mut writer| writer.shutdown().map_err(Into::into));

            match &result {
                Ok(()) => info!(
                    "Streamed {} ({} entries, {}) in {:.2?}",
                    name,
                    task_metrics.entries(),
                    format_size(task_metrics.wire_bytes(), DECIMAL),
                    task_metrics.elapsed()
                ),
                Err(e) if e.is_disconnect() => warn!(
                    "Client went away while streaming {} after {}",
                    name,
                    format_size(task_metrics.wire_bytes(), DECIMAL)
                ),
                Err(e) => error!("Failed to stream {}: {}", name, e),
            }
            result
        });

        Ok(ArchiveStream {
            reader,
            task,
            metrics,
        })
    }

    /// Counters of the running encoder
    pub fn metrics(&self) -> &Arc<ArchiveMetrics> {
        &self.metrics
    }

    /// Split into the pipe's reading end and the encoder task
    ///
    /// Dropping the reader aborts the encoder; awaiting the task reports how
    /// the encoder ended.
    pub fn into_parts(self) -> (DuplexStream, JoinHandle<Result<()>>) {
        (self.reader, self.task)
    }
}

impl AsyncRead for ArchiveStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let filled = buf.filled().len();
        ready!(Pin::new(&mut self.reader).poll_read(cx, buf))?;

        if buf.filled().len() == filled && buf.remaining() > 0 && self.metrics.is_aborted() {
            return Poll::Ready(Err(io::Error::other("archive aborted before completion")));
        }
        Poll::Ready(Ok(()))
    }
}
