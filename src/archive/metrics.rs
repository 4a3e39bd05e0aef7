//! Per-archive counters.
//!
//! Each download gets its own [`ArchiveMetrics`], shared between the encoder
//! task and whoever holds the [`ArchiveStream`](super::ArchiveStream). The
//! abort flag also lives here: once set, the wire writer refuses further
//! bytes so nothing is emitted while the encoder unwinds.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ArchiveMetrics {
    /// Entries whose header was written
    entries: AtomicU64,
    /// File content bytes copied into the archive
    payload_bytes: AtomicU64,
    /// Bytes handed to the pipe, after compression
    wire_bytes: AtomicU64,
    aborted: AtomicBool,
    started: Instant,
}

impl ArchiveMetrics {
    /// Create a new metrics collector wrapped in Arc for sharing
    pub fn new() -> Arc<Self> {
        Arc::new(ArchiveMetrics {
            entries: AtomicU64::new(0),
            payload_bytes: AtomicU64::new(0),
            wire_bytes: AtomicU64::new(0),
            aborted: AtomicBool::new(false),
            started: Instant::now(),
        })
    }

    /// Record one archived entry and its content length
    pub fn record_entry(&self, payload: u64) {
        self.entries.fetch_add(1, Ordering::Relaxed);
        self.payload_bytes.fetch_add(payload, Ordering::Relaxed);
    }

    pub fn record_wire(&self, bytes: u64) {
        self.wire_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn entries(&self) -> u64 {
        self.entries.load(Ordering::Relaxed)
    }

    pub fn payload_bytes(&self) -> u64 {
        self.payload_bytes.load(Ordering::Relaxed)
    }

    pub fn wire_bytes(&self) -> u64 {
        self.wire_bytes.load(Ordering::Relaxed)
    }

    /// Stop all further output for this archive
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Time since the archive was started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
