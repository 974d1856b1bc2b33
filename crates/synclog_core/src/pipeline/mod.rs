//! The writer/reader cursor over a task's segments.
//!
//! A [`Pipeline`] appends frames to the active segment and hands frames to
//! the consumer in order. Positions live only in memory until
//! [`Pipeline::flush`] returns a [`Checkpoint`] for the caller to persist.
//!
//! ## Segment lifecycle
//!
//! ```text
//! ACTIVE ──(size > max_segment_size)──> SEALED ──(retention sweep)──> EXPIRED
//! ```
//!
//! Rotation happens after the write that crosses the threshold, so a segment
//! may exceed the limit by at most one frame. If that rotation fails it is
//! retried before the next append, and the append is refused while the
//! rotation keeps failing.
//!
//! The pipeline does no locking of its own; calls must be serialized by the
//! owner.

mod reader;
mod writer;

use crate::checkpoint::{Checkpoint, SegmentPosition};
use crate::config::LogConfig;
use crate::error::{LogError, LogResult};
use crate::frame;
use crate::segment::{next_segment_name, parse_sequence, SegmentIndex, SegmentStore};
use crate::stats::LogStats;
use reader::SegmentReader;
use std::sync::Arc;
use tracing::{debug, warn};
use writer::SegmentWriter;

/// Active cursor over one task's log.
#[derive(Debug)]
pub struct Pipeline {
    writer: SegmentWriter,
    reader: SegmentReader,
    max_segment_size: u64,
    sync_on_flush: bool,
    stats: Arc<LogStats>,
}

impl Pipeline {
    /// Attaches to the segments named by `index`, resuming from `checkpoint`.
    ///
    /// The writer continues at the end of the last intact frame of the newest
    /// segment; the reader continues at the checkpoint's read position. The
    /// checkpoint must already be repaired against `index`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::EmptyIndex`] if the index names no segment, or an
    /// error if a segment cannot be opened or its torn tail cannot be cut.
    pub fn attach(
        store: &SegmentStore,
        index: &SegmentIndex,
        checkpoint: &Checkpoint,
        config: &LogConfig,
        stats: Arc<LogStats>,
    ) -> LogResult<Self> {
        let active = index.last().ok_or_else(|| LogError::EmptyIndex {
            path: store.index_path(),
        })?;

        let verified_from = if checkpoint.write.segment == active {
            checkpoint.write.offset
        } else {
            0
        };
        let writer = SegmentWriter::attach(store, active, verified_from)?;
        let reader = SegmentReader::attach(store, &checkpoint.read.segment, checkpoint.read.offset)?;

        debug!(
            write = %SegmentPosition::new(writer.segment(), writer.offset()),
            read = %SegmentPosition::new(reader.segment(), reader.offset()),
            "pipeline attached"
        );

        Ok(Self {
            writer,
            reader,
            max_segment_size: config.max_segment_size,
            sync_on_flush: config.sync_on_flush,
            stats,
        })
    }

    /// Frames and appends `payload` to the active segment.
    ///
    /// Returns the position the frame starts at. If the segment has grown past
    /// the configured maximum, it is sealed and writing continues at offset 0
    /// of a new segment appended to `index`.
    ///
    /// `Err` means the payload was not appended. A rotation that fails after
    /// the append is logged and retried before the next append, which fails
    /// without writing if the rotation fails again.
    ///
    /// Nothing is durable until [`flush`](Self::flush).
    ///
    /// # Errors
    ///
    /// Returns [`LogError::PayloadTooLarge`] for an unframeable payload,
    /// [`LogError::SegmentNameCollision`] if the next segment name is still
    /// indexed, or an I/O error.
    pub fn write(
        &mut self,
        store: &SegmentStore,
        index: &mut SegmentIndex,
        payload: &[u8],
    ) -> LogResult<SegmentPosition> {
        let frame = frame::encode(payload)?;
        if self.writer.offset() > self.max_segment_size {
            self.rotate(store, index)?;
        }

        let offset = self.writer.append(&frame)?;
        self.stats.record_write(frame.len() as u64);
        let position = SegmentPosition::new(self.writer.segment(), offset);

        if self.writer.offset() > self.max_segment_size {
            if let Err(err) = self.rotate(store, index) {
                warn!(
                    segment = self.writer.segment(),
                    size = self.writer.offset(),
                    error = %err,
                    "rotation failed, retrying before the next write"
                );
            }
        }
        Ok(position)
    }

    /// Returns the next unread payload, or `None` once caught up.
    ///
    /// Never blocks. Reaching the end of a sealed segment moves the reader to
    /// the next indexed segment.
    ///
    /// # Errors
    ///
    /// Returns a data error for a corrupt frame (the record is never skipped)
    /// or an I/O error.
    pub fn read(&mut self, store: &SegmentStore, index: &SegmentIndex) -> LogResult<Option<Vec<u8>>> {
        match self.reader.next(store, index)? {
            Some((payload, frame_len)) => {
                self.stats.record_read(frame_len);
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }

    /// Makes appended frames durable and returns the positions to persist.
    ///
    /// The active segment is fsynced when the configuration asks for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment cannot be flushed.
    pub fn flush(&mut self) -> LogResult<Checkpoint> {
        self.writer.flush(self.sync_on_flush)?;
        Ok(Checkpoint {
            write: self.write_position(),
            read: self.read_position(),
        })
    }

    /// Releases the open segment handles.
    ///
    /// Unflushed positions are lost.
    pub fn close(self) {
        debug!(
            write = %self.write_position(),
            read = %self.read_position(),
            "pipeline closed"
        );
    }

    /// Position the next frame will be written at.
    #[must_use]
    pub fn write_position(&self) -> SegmentPosition {
        SegmentPosition::new(self.writer.segment(), self.writer.offset())
    }

    /// Position of the next frame the consumer will read.
    #[must_use]
    pub fn read_position(&self) -> SegmentPosition {
        SegmentPosition::new(self.reader.segment(), self.reader.offset())
    }

    /// Moves the reader back to a position it previously reported.
    pub(crate) fn rewind_read(&mut self, store: &SegmentStore, position: &SegmentPosition) -> LogResult<()> {
        self.reader = SegmentReader::attach(store, &position.segment, position.offset)?;
        Ok(())
    }

    fn rotate(&mut self, store: &SegmentStore, index: &mut SegmentIndex) -> LogResult<()> {
        self.writer.flush(self.sync_on_flush)?;

        let next = next_segment_name(parse_sequence(self.writer.segment())?);
        // creating the file would truncate a retained segment
        if index.contains(&next) {
            return Err(LogError::SegmentNameCollision { name: next });
        }

        // indexed last, so a failure at any step leaves the name free to retry
        store.create_segment(&next)?;
        let writer = SegmentWriter::create(store, &next)?;
        index.append(&next)?;
        let sealed = std::mem::replace(&mut self.writer, writer);

        debug!(
            sealed = sealed.segment(),
            size = sealed.offset(),
            active = %next,
            "rotated segment"
        );
        self.stats.record_rotation();
        Ok(())
    }
}
