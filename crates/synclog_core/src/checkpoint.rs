//! The durable pointer into a task's log.
//!
//! Persisted as `binlog.config`:
//!
//! ```json
//! {"fileName":"binlog.000001","position":31,"readFileName":"binlog.000001","readPosition":0}
//! ```
//!
//! `fileName`/`position` mark the end of the last flushed frame; the
//! `read*` fields mark how far the consumer got. Files written without the
//! read fields resume the consumer at `fileName`/`position`.

use crate::error::LogResult;
use crate::segment::{write_atomic, SegmentIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A frame boundary inside a named segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentPosition {
    /// Segment name (e.g. `binlog.000001`).
    pub segment: String,
    /// Byte offset of a frame boundary within the segment.
    pub offset: u64,
}

impl SegmentPosition {
    /// Creates a position.
    pub fn new(segment: impl Into<String>, offset: u64) -> Self {
        Self {
            segment: segment.into(),
            offset,
        }
    }
}

impl fmt::Display for SegmentPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segment, self.offset)
    }
}

/// Write and read positions captured by a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// End of the last durably written frame.
    pub write: SegmentPosition,
    /// Next frame the consumer will read.
    pub read: SegmentPosition,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckpointFile {
    file_name: String,
    #[serde(default)]
    position: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    read_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    read_position: Option<u64>,
}

impl Checkpoint {
    /// Both positions at offset 0 of `segment`.
    pub fn at_start(segment: &str) -> Self {
        Self {
            write: SegmentPosition::new(segment, 0),
            read: SegmentPosition::new(segment, 0),
        }
    }

    /// Parses a checkpoint file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a JSON error if it
    /// does not parse.
    pub fn load(path: &Path) -> LogResult<Self> {
        let contents = fs::read_to_string(path)?;
        let file: CheckpointFile = serde_json::from_str(&contents)?;

        let write = SegmentPosition::new(file.file_name, file.position);
        let read = match file.read_file_name {
            Some(segment) => SegmentPosition::new(segment, file.read_position.unwrap_or(0)),
            None => write.clone(),
        };
        Ok(Self { write, read })
    }

    /// Atomically overwrites the checkpoint file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> LogResult<()> {
        let file = CheckpointFile {
            file_name: self.write.segment.clone(),
            position: self.write.offset,
            read_file_name: Some(self.read.segment.clone()),
            read_position: Some(self.read.offset),
        };
        write_atomic(path, &serde_json::to_vec(&file)?)
    }
}

/// Holds the last persisted checkpoint of a task.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    current: Checkpoint,
}

impl CheckpointStore {
    /// Loads the checkpoint without validating it against the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn open(path: &Path) -> LogResult<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            current: Checkpoint::load(path)?,
        })
    }

    /// Loads the checkpoint and repairs it against `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, malformed or cannot be
    /// rewritten after a repair.
    pub fn load(path: &Path, index: &SegmentIndex) -> LogResult<Self> {
        let mut store = Self::open(path)?;
        store.repair(index)?;
        Ok(store)
    }

    /// Rebinds any position whose segment is no longer indexed to offset 0 of
    /// the earliest indexed segment, then persists the result.
    ///
    /// Only the unread tail of deleted segments is lost; nothing still
    /// indexed is skipped. Returns `true` if a repair was made. An empty index
    /// leaves the checkpoint untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the repaired checkpoint cannot be written.
    pub fn repair(&mut self, index: &SegmentIndex) -> LogResult<bool> {
        let Some(earliest) = index.first() else {
            return Ok(false);
        };

        let mut repaired = false;
        for (role, position) in [
            ("write", &mut self.current.write),
            ("read", &mut self.current.read),
        ] {
            if !index.contains(&position.segment) {
                warn!(
                    cursor = role,
                    segment = %position.segment,
                    rebound_to = earliest,
                    "checkpoint references an expired segment"
                );
                *position = SegmentPosition::new(earliest, 0);
                repaired = true;
            }
        }

        if repaired {
            self.current.save(&self.path)?;
        }
        Ok(repaired)
    }

    /// Persists a new checkpoint.
    ///
    /// Call only once the bytes up to `checkpoint.write` are durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written; the in-memory value is
    /// left unchanged in that case.
    pub fn persist(&mut self, checkpoint: Checkpoint) -> LogResult<()> {
        checkpoint.save(&self.path)?;
        self.current = checkpoint;
        Ok(())
    }

    /// Returns the last persisted checkpoint.
    #[must_use]
    pub fn current(&self) -> &Checkpoint {
        &self.current
    }
}
