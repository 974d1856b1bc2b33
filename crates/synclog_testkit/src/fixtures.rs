//! Test fixtures for task logs.
//!
//! A [`TempTask`] owns a temporary root directory and can open, close and
//! reopen the log of one task under it, which is how restarts are simulated.

use std::path::PathBuf;
use synclog_core::{LogConfig, LogContext};
use tempfile::TempDir;

/// Task identifier used when none is given.
pub const DEFAULT_TASK_ID: &str = "t1";

/// A task root with automatic cleanup.
pub struct TempTask {
    root: TempDir,
    task_id: String,
    config: LogConfig,
}

impl TempTask {
    /// Creates a temporary root for task [`DEFAULT_TASK_ID`] with default
    /// limits.
    pub fn new() -> Self {
        Self::named(DEFAULT_TASK_ID)
    }

    /// Creates a temporary root for `task_id`.
    pub fn named(task_id: &str) -> Self {
        let root = TempDir::new().expect("Failed to create temp directory");
        let config = LogConfig::new(root.path()).sync_on_flush(false);
        Self {
            root,
            task_id: task_id.to_string(),
            config,
        }
    }

    /// Adjusts the configuration used by subsequent opens.
    pub fn configure(mut self, f: impl FnOnce(LogConfig) -> LogConfig) -> Self {
        self.config = f(self.config);
        self
    }

    /// Opens the task's log.
    pub fn open(&self) -> LogContext {
        LogContext::open(self.config.clone(), &self.task_id).expect("Failed to open task log")
    }

    /// Returns the configuration handed to [`open`](Self::open).
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Returns the task identifier.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Returns `<root>/data/binlog/<task_id>`.
    pub fn task_dir(&self) -> PathBuf {
        self.config
            .task_dir(&self.task_id)
            .expect("Task id should be valid")
    }

    /// Returns the path of a segment file.
    pub fn segment_path(&self, name: &str) -> PathBuf {
        self.task_dir().join(name)
    }

    /// Returns the path of the index file.
    pub fn index_path(&self) -> PathBuf {
        self.task_dir().join("binlog.index")
    }

    /// Returns the path of the checkpoint file.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.task_dir().join("binlog.config")
    }

    /// Reads the index file as a list of names.
    pub fn index_on_disk(&self) -> Vec<String> {
        std::fs::read_to_string(self.index_path())
            .expect("Failed to read index")
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Returns the root directory.
    pub fn root(&self) -> &std::path::Path {
        self.root.path()
    }
}

impl Default for TempTask {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a test against a freshly opened task log.
///
/// # Example
///
/// ```rust,ignore
/// use synclog_testkit::with_temp_task;
///
/// #[test]
/// fn my_test() {
///     with_temp_task(|log| {
///         log.write_payload(b"row").unwrap();
///     });
/// }
/// ```
pub fn with_temp_task<F, R>(f: F) -> R
where
    F: FnOnce(&mut LogContext) -> R,
{
    let task = TempTask::new();
    let mut log = task.open();
    f(&mut log)
}

/// Drains every payload currently readable.
pub fn drain(log: &mut LogContext) -> Vec<Vec<u8>> {
    let mut payloads = Vec::new();
    while let Some(payload) = log.read_payload().expect("Failed to read payload") {
        payloads.push(payload);
    }
    payloads
}
