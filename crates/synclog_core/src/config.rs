//! Log configuration.

use crate::error::{LogError, LogResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default size after which the active segment is rotated (256 MiB).
pub const DEFAULT_MAX_SEGMENT_SIZE: u64 = 256 * 1024 * 1024;

/// Default age after which a segment is deleted at startup (7 days).
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Configuration for opening a task's log.
///
/// The root directory is always explicit; the log never consults the
/// process working directory or the environment.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base directory. Task logs live under `<root>/data/binlog/<task_id>`.
    pub root: PathBuf,

    /// Size of the active segment above which the next write rotates.
    pub max_segment_size: u64,

    /// Segments created longer ago than this are deleted at startup.
    pub retention: Duration,

    /// Whether `flush` fsyncs the active segment before persisting the
    /// checkpoint (safer but slower).
    pub sync_on_flush: bool,
}

impl LogConfig {
    /// Creates a configuration rooted at `root` with default limits.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            retention: DEFAULT_RETENTION,
            sync_on_flush: true,
        }
    }

    /// Sets the rotation threshold.
    #[must_use]
    pub const fn max_segment_size(mut self, size: u64) -> Self {
        self.max_segment_size = size;
        self
    }

    /// Sets the retention window.
    #[must_use]
    pub const fn retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Sets whether flush fsyncs the active segment.
    #[must_use]
    pub const fn sync_on_flush(mut self, value: bool) -> Self {
        self.sync_on_flush = value;
        self
    }

    /// Returns the directory holding the log of `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidTaskId`] if `task_id` is empty, `.`/`..`,
    /// or contains a path separator.
    pub fn task_dir(&self, task_id: &str) -> LogResult<PathBuf> {
        let invalid = task_id.is_empty()
            || task_id == "."
            || task_id == ".."
            || task_id.contains(['/', '\\'])
            || Path::new(task_id).is_absolute();
        if invalid {
            return Err(LogError::InvalidTaskId {
                task_id: task_id.to_string(),
            });
        }
        Ok(self.root.join("data").join("binlog").join(task_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LogConfig::new("/srv/sync");
        assert_eq!(config.max_segment_size, 256 * 1024 * 1024);
        assert_eq!(config.retention, Duration::from_secs(604_800));
        assert!(config.sync_on_flush);
    }

    #[test]
    fn builder_pattern() {
        let config = LogConfig::new("/srv/sync")
            .max_segment_size(1024)
            .retention(Duration::from_secs(60))
            .sync_on_flush(false);

        assert_eq!(config.max_segment_size, 1024);
        assert_eq!(config.retention, Duration::from_secs(60));
        assert!(!config.sync_on_flush);
    }

    #[test]
    fn task_dir_layout() {
        let config = LogConfig::new("/srv/sync");
        assert_eq!(
            config.task_dir("t1").unwrap(),
            PathBuf::from("/srv/sync/data/binlog/t1")
        );
    }

    #[test]
    fn task_dir_rejects_traversal() {
        let config = LogConfig::new("/srv/sync");
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                config.task_dir(bad),
                Err(LogError::InvalidTaskId { .. })
            ));
        }
    }
}
