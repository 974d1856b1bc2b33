//! Append side of the pipeline.

use crate::error::LogResult;
use crate::frame;
use crate::segment::SegmentStore;
use synclog_storage::{FileBackend, StorageBackend};
use tracing::warn;

/// Appends frames to the active segment.
#[derive(Debug)]
pub(crate) struct SegmentWriter {
    segment: String,
    backend: FileBackend,
    offset: u64,
}

impl SegmentWriter {
    /// Opens `segment` and positions the writer after its last intact frame.
    ///
    /// Frames are verified from `verified_from`, which must be a known frame
    /// boundary (the checkpointed write position, or 0). A torn or corrupt
    /// tail beyond that point was never flushed and is cut off.
    pub(crate) fn attach(store: &SegmentStore, segment: &str, verified_from: u64) -> LogResult<Self> {
        let mut backend = FileBackend::open(&store.segment_path(segment))?;
        let size = backend.size()?;

        let start = if verified_from > size {
            warn!(
                segment,
                checkpointed = verified_from,
                size,
                "segment shorter than its checkpoint, rescanning from start"
            );
            0
        } else {
            verified_from
        };

        let intact = frame::scan_intact_end(&backend, segment, start, size)?;
        if intact < size {
            warn!(
                path = %backend.path().display(),
                offset = intact,
                discarded = size - intact,
                "truncating torn tail of active segment"
            );
            backend.truncate(intact)?;
        }

        Ok(Self {
            segment: segment.to_string(),
            backend,
            offset: intact,
        })
    }

    /// Opens a freshly created, empty segment.
    pub(crate) fn create(store: &SegmentStore, segment: &str) -> LogResult<Self> {
        let backend = FileBackend::open(&store.segment_path(segment))?;
        let offset = backend.size()?;
        Ok(Self {
            segment: segment.to_string(),
            backend,
            offset,
        })
    }

    /// Appends one encoded frame and returns the offset it starts at.
    pub(crate) fn append(&mut self, frame: &[u8]) -> LogResult<u64> {
        let offset = self.backend.append(frame)?;
        self.offset = offset + frame.len() as u64;
        Ok(offset)
    }

    /// Pushes written bytes to the OS, fsyncing them when `sync` is set.
    pub(crate) fn flush(&mut self, sync: bool) -> LogResult<()> {
        self.backend.flush()?;
        if sync {
            self.backend.sync()?;
        }
        Ok(())
    }

    pub(crate) fn segment(&self) -> &str {
        &self.segment
    }

    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }
}
