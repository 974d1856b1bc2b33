//! Consume side of the pipeline.

use crate::error::{LogError, LogResult};
use crate::frame::{self, FrameRead};
use crate::segment::{SegmentIndex, SegmentStore};
use synclog_storage::{FileBackend, StorageBackend};
use tracing::{debug, warn};

/// Sequential, forward-only cursor over the indexed segments.
///
/// Holds its own read-only handle, so bytes appended through the writer's
/// handle become visible once the file length is refreshed.
#[derive(Debug)]
pub(crate) struct SegmentReader {
    segment: String,
    backend: FileBackend,
    offset: u64,
}

impl SegmentReader {
    pub(crate) fn attach(store: &SegmentStore, segment: &str, offset: u64) -> LogResult<Self> {
        let backend = FileBackend::open_read_only(&store.segment_path(segment))?;
        let size = backend.size()?;

        let offset = if offset > size {
            warn!(
                segment,
                checkpointed = offset,
                size,
                "read checkpoint beyond end of segment, rereading from start"
            );
            0
        } else {
            offset
        };

        Ok(Self {
            segment: segment.to_string(),
            backend,
            offset,
        })
    }

    /// Returns the next complete frame payload and its on-disk length.
    ///
    /// `Ok(None)` means the reader has caught up with the active segment.
    /// Crossing from the end of a sealed segment into its successor happens
    /// here, transparently.
    pub(crate) fn next(
        &mut self,
        store: &SegmentStore,
        index: &SegmentIndex,
    ) -> LogResult<Option<(Vec<u8>, u64)>> {
        loop {
            let end = self.backend.refresh_size()?;
            match frame::read_frame(&self.backend, &self.segment, self.offset, end)? {
                FrameRead::Complete {
                    payload,
                    next_offset,
                } => {
                    let frame_len = next_offset - self.offset;
                    self.offset = next_offset;
                    return Ok(Some((payload, frame_len)));
                }
                FrameRead::Incomplete => {
                    let Some(next) = index.next_after(&self.segment) else {
                        return Ok(None);
                    };
                    // a sealed segment always ends on a frame boundary
                    if self.offset != end {
                        return Err(LogError::segment_corruption(
                            self.segment.clone(),
                            self.offset,
                            format!("partial frame of {} bytes at end of sealed segment", end - self.offset),
                        ));
                    }
                    debug!(from = %self.segment, to = next, "reader advancing to next segment");
                    *self = Self::attach(store, next, 0)?;
                }
            }
        }
    }

    pub(crate) fn segment(&self) -> &str {
        &self.segment
    }

    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }
}
