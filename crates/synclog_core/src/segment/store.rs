//! Task directory management.
//!
//! ```text
//! <task_dir>/
//! ├─ binlog.index      # ordered segment names
//! ├─ binlog.config     # checkpoint
//! ├─ binlog.lock       # advisory lock for the single owner
//! └─ binlog.NNNNNN     # segments
//! ```

use crate::checkpoint::Checkpoint;
use crate::error::{LogError, LogResult};
use crate::segment::{next_segment_name, SegmentIndex, BASE_NAME};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

const INDEX_FILE: &str = "binlog.index";
const CHECKPOINT_FILE: &str = "binlog.config";
const LOCK_FILE: &str = "binlog.lock";

/// Owns one task directory: paths, segment files and the exclusive lock.
///
/// Only one `SegmentStore` can exist per directory at a time; the lock is
/// released when the store is dropped.
#[derive(Debug)]
pub struct SegmentStore {
    dir: PathBuf,
    _lock_file: File,
}

impl SegmentStore {
    /// Opens a task directory, creating it if needed, and takes its lock.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::TaskLocked`] if another owner holds the lock, or
    /// an I/O error.
    pub fn open(dir: &Path) -> LogResult<Self> {
        fs::create_dir_all(dir)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(LogError::TaskLocked {
                path: dir.to_path_buf(),
            });
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the task directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of the index file.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Returns the path of the checkpoint file.
    #[must_use]
    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_FILE)
    }

    /// Returns the path of the segment called `name`.
    #[must_use]
    pub fn segment_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Checks whether the segment file exists on disk.
    #[must_use]
    pub fn segment_exists(&self, name: &str) -> bool {
        self.segment_path(name).is_file()
    }

    /// Brings a fresh task directory to its initial state.
    ///
    /// With no checkpoint on disk this creates `binlog.000001` empty, an index
    /// holding that one name and a checkpoint at its offset 0, in that order.
    /// If an index survived without a checkpoint, only the checkpoint is
    /// rebuilt, pointing at the earliest indexed segment. When a checkpoint
    /// already exists this is a no-op.
    ///
    /// Returns `true` if anything was written.
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be written.
    pub fn bootstrap(&self) -> LogResult<bool> {
        let checkpoint_path = self.checkpoint_path();
        if checkpoint_path.exists() {
            return Ok(false);
        }

        if self.index_path().exists() {
            let index = SegmentIndex::load(&self.index_path())?;
            if let Some(first) = index.first() {
                warn!(
                    dir = %self.dir.display(),
                    segment = first,
                    "checkpoint missing, rebuilding from earliest indexed segment"
                );
                Checkpoint::at_start(first).save(&checkpoint_path)?;
                return Ok(true);
            }
        }

        let first = next_segment_name(0);
        self.create_segment(&first)?;
        SegmentIndex::create(&self.index_path(), vec![first.clone()])?;
        Checkpoint::at_start(&first).save(&checkpoint_path)?;

        info!(dir = %self.dir.display(), segment = %first, "bootstrapped task log");
        Ok(true)
    }

    /// Creates an empty segment file, replacing an unindexed leftover of the
    /// same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create_segment(&self, name: &str) -> LogResult<PathBuf> {
        let path = self.segment_path(name);
        File::create(&path)?;
        sync_dir(&self.dir)?;
        Ok(path)
    }

    /// Deletes a segment file. Returns `false` if it was already gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn delete_segment(&self, name: &str) -> LogResult<bool> {
        let path = self.segment_path(name);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        sync_dir(&self.dir)?;
        Ok(true)
    }

    /// Returns when the segment was created.
    ///
    /// Falls back to the modification time on filesystems that do not record
    /// a birth time.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    pub fn segment_created_at(&self, name: &str) -> LogResult<SystemTime> {
        let metadata = fs::metadata(self.segment_path(name))?;
        Ok(metadata.created().or_else(|_| metadata.modified())?)
    }
}

/// Writes `data` to `path` through a temporary file and a rename, so readers
/// only ever see the old or the new contents.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> LogResult<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| BASE_NAME.to_string());
    let temp_path = path.with_file_name(format!("{file_name}.tmp"));

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        sync_dir(parent)?;
    }
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> LogResult<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> LogResult<()> {
    // NTFS journals directory metadata itself
    Ok(())
}
