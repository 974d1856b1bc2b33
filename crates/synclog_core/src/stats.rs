//! Log statistics.
//!
//! ```rust,ignore
//! let stats = log.stats().snapshot();
//! println!("written: {} records / {} bytes", stats.records_written, stats.bytes_written);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one task's log since it was opened.
///
/// All counters are atomic, so a monitoring thread can read them through a
/// shared reference while the owner writes.
#[derive(Debug, Default)]
pub struct LogStats {
    records_written: AtomicU64,
    bytes_written: AtomicU64,
    records_read: AtomicU64,
    bytes_read: AtomicU64,
    rotations: AtomicU64,
    flushes: AtomicU64,
    segments_swept: AtomicU64,
}

impl LogStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_write(&self, frame_bytes: u64) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(frame_bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self, frame_bytes: u64) {
        self.records_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(frame_bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_swept(&self, segments: u64) {
        self.segments_swept.fetch_add(segments, Ordering::Relaxed);
    }

    /// Records appended.
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    /// Records returned to the consumer.
    pub fn records_read(&self) -> u64 {
        self.records_read.load(Ordering::Relaxed)
    }

    /// Segment rotations.
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Copies every counter into a plain struct.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records_written: self.records_written(),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            records_read: self.records_read(),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            rotations: self.rotations(),
            flushes: self.flushes.load(Ordering::Relaxed),
            segments_swept: self.segments_swept.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`LogStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Records appended.
    pub records_written: u64,
    /// Frame bytes appended, headers included.
    pub bytes_written: u64,
    /// Records returned to the consumer.
    pub records_read: u64,
    /// Frame bytes consumed, headers included.
    pub bytes_read: u64,
    /// Segment rotations.
    pub rotations: u64,
    /// Flushes that persisted a checkpoint.
    pub flushes: u64,
    /// Segments dropped by the startup sweep.
    pub segments_swept: u64,
}
