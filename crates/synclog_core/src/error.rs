//! Error types for the synclog core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for log operations.
pub type LogResult<T> = Result<T, LogError>;

/// Errors that can occur while operating a task's log.
#[derive(Debug, Error)]
pub enum LogError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] synclog_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The checkpoint file could not be parsed or written.
    #[error("checkpoint encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// A change event could not be encoded or decoded.
    #[error("change event codec error: {message}")]
    Codec {
        /// Description of the codec failure.
        message: String,
    },

    /// The index file is absent after bootstrap. The task cannot start.
    #[error("index file '{}' does not exist", path.display())]
    IndexMissing {
        /// Expected location of the index.
        path: PathBuf,
    },

    /// The index lists no segment to attach to.
    #[error("index file '{}' lists no segments", path.display())]
    EmptyIndex {
        /// Location of the index.
        path: PathBuf,
    },

    /// Another context already owns this task directory.
    #[error("task directory '{}' is locked by another owner", path.display())]
    TaskLocked {
        /// The locked task directory.
        path: PathBuf,
    },

    /// A segment holds bytes that are not a valid frame sequence.
    #[error("segment corruption in {segment} at offset {offset}: {message}")]
    SegmentCorruption {
        /// Segment name.
        segment: String,
        /// Offset of the offending frame.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// A complete frame failed checksum verification.
    #[error("checksum mismatch in {segment} at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Segment name.
        segment: String,
        /// Offset of the frame.
        offset: u64,
        /// Checksum stored in the frame header.
        expected: u32,
        /// Checksum computed over the frame.
        actual: u32,
    },

    /// A payload does not fit the 32-bit frame length.
    #[error("payload of {len} bytes exceeds the frame limit")]
    PayloadTooLarge {
        /// Payload length in bytes.
        len: usize,
    },

    /// A name does not follow the `binlog.NNNNNN` pattern.
    #[error("invalid segment name: {name}")]
    InvalidSegmentName {
        /// The rejected name.
        name: String,
    },

    /// The next sequence number wrapped onto a segment still in the index.
    #[error("segment name {name} is still in use")]
    SegmentNameCollision {
        /// The colliding segment name.
        name: String,
    },

    /// The task identifier cannot be used as a directory name.
    #[error("invalid task id: {task_id:?}")]
    InvalidTaskId {
        /// The rejected task identifier.
        task_id: String,
    },
}

impl LogError {
    /// Creates a segment corruption error.
    pub fn segment_corruption(
        segment: impl Into<String>,
        offset: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::SegmentCorruption {
            segment: segment.into(),
            offset,
            message: message.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Returns `true` for failures of the bytes themselves rather than of the
    /// environment: corrupted frames and undecodable events.
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::Codec { .. }
                | Self::SegmentCorruption { .. }
                | Self::ChecksumMismatch { .. }
                | Self::PayloadTooLarge { .. }
        )
    }
}
