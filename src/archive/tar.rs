//! Tar framing of walked entries.
//!
//! The writer stack, from the outside in, is:
//!
//! ```text
//! tar::Builder -> [GzEncoder] -> WireWriter -> sink (usually the pipe)
//! ```
//!
//! Every file payload goes through an [`ExactReader`] so the number of bytes
//! copied always equals the size declared in its header. When encoding fails
//! the archive is marked aborted and the [`WireWriter`] rejects the trailers
//! that `tar` and `flate2` try to write from their destructors, leaving the
//! consumer with a visibly truncated stream.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::{ArchiveFormat, ArchiveMetrics};
use crate::error::Result;
use crate::fs::{EntryKind, FsEntry, Walker};

/// Encode every entry of `walker` into `writer`
///
/// Returns the writer once the end-of-archive marker (and gzip trailer) has
/// been written and flushed. On error the archive is aborted and the writer
/// dropped without a trailer.
pub fn encode<W: Write>(
    walker: &Walker,
    writer: W,
    format: ArchiveFormat,
    gzip_level: u32,
    metrics: &Arc<ArchiveMetrics>,
) -> Result<W> {
    let mut encoder = TarEncoder::new(writer, format, gzip_level, Arc::clone(metrics));

    for entry in walker.entries() {
        if let Err(e) = entry.and_then(|entry| encoder.append(entry)) {
            metrics.abort();
            return Err(e);
        }
    }

    encoder.finish().inspect_err(|_| metrics.abort())
}

/// Streaming tar writer with optional gzip compression
pub struct TarEncoder<W: Write> {
    builder: tar::Builder<Sink<WireWriter<W>>>,
    metrics: Arc<ArchiveMetrics>,
}

impl<W: Write> TarEncoder<W> {
    pub fn new(writer: W, format: ArchiveFormat, gzip_level: u32, metrics: Arc<ArchiveMetrics>) -> Self {
        let wire = WireWriter {
            inner: writer,
            metrics: Arc::clone(&metrics),
        };
        let sink = match format {
            ArchiveFormat::Tar => Sink::Plain(wire),
            ArchiveFormat::TarGz => Sink::Gzip(GzEncoder::new(wire, Compression::new(gzip_level))),
        };

        TarEncoder {
            builder: tar::Builder::new(sink),
            metrics,
        }
    }

    /// Write one entry: its header, then for files the padded content
    ///
    /// The entry's byte source is closed before this returns.
    pub fn append(&mut self, mut entry: FsEntry) -> Result<()> {
        let path = entry.archive_path();
        let source = entry.take_source();

        let mut header = tar::Header::new_gnu();
        header.set_mode(entry.mode);
        header.set_mtime(entry.mtime);
        header.set_uid(entry.uid);
        header.set_gid(entry.gid);

        match &entry.kind {
            EntryKind::Directory => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                self.builder.append_data(&mut header, &path, io::empty())?;
            }
            EntryKind::Symlink(target) => {
                header.set_entry_type(tar::EntryType::Symlink);
                header.set_size(0);
                self.builder.append_link(&mut header, &path, target)?;
            }
            EntryKind::File => {
                let source = source.ok_or_else(|| {
                    io::Error::other(format!("no content source for {}", entry.display()))
                })?;
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(entry.size);
                let mut reader = ExactReader::new(source, entry.size, &entry.path);
                self.builder.append_data(&mut header, &path, &mut reader)?;
            }
        }

        debug!("Archived {} ({} bytes)", path.display(), entry.size);
        self.metrics.record_entry(entry.size);
        Ok(())
    }

    /// Write the end-of-archive marker, finish compression and flush
    pub fn finish(self) -> Result<W> {
        let sink = self.builder.into_inner()?;
        let mut wire = sink.finish()?;
        wire.flush()?;
        Ok(wire.inner)
    }
}

/// Optional gzip layer between the tar builder and the wire
enum Sink<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Sink<W> {
    fn finish(self) -> io::Result<W> {
        match self {
            Sink::Plain(w) => Ok(w),
            Sink::Gzip(gz) => gz.finish(),
        }
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(gz) => gz.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(gz) => gz.flush(),
        }
    }
}

/// Bottom of the writer stack: counts output and refuses it once aborted
struct WireWriter<W> {
    inner: W,
    metrics: Arc<ArchiveMetrics>,
}

impl<W: Write> Write for WireWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.metrics.is_aborted() {
            return Err(io::Error::other("archive aborted"));
        }
        let n = self.inner.write(buf)?;
        self.metrics.record_wire(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.metrics.is_aborted() {
            return Err(io::Error::other("archive aborted"));
        }
        self.inner.flush()
    }
}

/// Yields exactly `remaining` bytes of `inner`
///
/// A source that ends early is an `UnexpectedEof` error; bytes beyond the
/// declared size are never read.
struct ExactReader<'a, R> {
    inner: R,
    remaining: u64,
    path: &'a Path,
}

impl<'a, R: Read> ExactReader<'a, R> {
    fn new(inner: R, size: u64, path: &'a Path) -> Self {
        ExactReader {
            inner,
            remaining: size,
            path,
        }
    }
}

impl<R: Read> Read for ExactReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let want = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..want])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "{} shrank while archiving ({} bytes missing)",
                    self.path.display(),
                    self.remaining
                ),
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}
