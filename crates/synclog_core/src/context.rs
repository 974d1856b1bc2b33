//! Per-task façade over the log.
//!
//! A [`LogContext`] owns the task directory lock, the index, the checkpoint
//! and the pipeline of one task. Opening runs the startup sequence:
//!
//! 1. Lock and bootstrap the task directory
//! 2. Load the index (a missing index is fatal)
//! 3. Sweep expired and missing segments
//! 4. Repair the checkpoint against the remaining index
//! 5. Attach the pipeline
//!
//! Dropping the context releases the segment handles and the lock on every
//! path, including a failed open.

use crate::checkpoint::{Checkpoint, CheckpointStore, SegmentPosition};
use crate::config::LogConfig;
use crate::error::LogResult;
use crate::event::ChangeEvent;
use crate::pipeline::Pipeline;
use crate::segment::{next_segment_name, parse_sequence, SegmentIndex, SegmentStore};
use crate::stats::LogStats;
use crate::sweeper::ExpirySweeper;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// The durable change log of one sync task.
///
/// Single producer, single consumer: calls must be serialized by the owning
/// worker.
///
/// # Example
///
/// ```rust,no_run
/// use synclog_core::{ChangeEvent, LogConfig, LogContext, Row};
///
/// let mut log = LogContext::open(LogConfig::new("/var/lib/sync"), "orders")?;
/// log.write(&ChangeEvent::insert("group-1", "orders", Row::new()))?;
/// log.flush()?;
/// # Ok::<(), synclog_core::LogError>(())
/// ```
#[derive(Debug)]
pub struct LogContext {
    task_id: String,
    store: SegmentStore,
    index: SegmentIndex,
    checkpoints: CheckpointStore,
    pipeline: Pipeline,
    stats: Arc<LogStats>,
}

impl LogContext {
    /// Opens (creating if needed) the log of `task_id` under `config.root`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::TaskLocked`](crate::LogError::TaskLocked) if the
    /// task is already open, [`LogError::IndexMissing`](crate::LogError::IndexMissing)
    /// if the index vanished, or any I/O and data error met during startup.
    pub fn open(config: LogConfig, task_id: &str) -> LogResult<Self> {
        Self::open_at(config, task_id, SystemTime::now())
    }

    /// Opens the log, sweeping retention as of `now`.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn open_at(config: LogConfig, task_id: &str, now: SystemTime) -> LogResult<Self> {
        let store = SegmentStore::open(&config.task_dir(task_id)?)?;
        store.bootstrap()?;

        let mut index = SegmentIndex::load(&store.index_path())?;
        let previous = Checkpoint::load(&store.checkpoint_path())?;
        let stats = Arc::new(LogStats::new());

        let report =
            ExpirySweeper::new(config.retention).sweep(&store, &mut index, Some(&previous), now)?;
        stats.record_swept(report.dropped() as u64);

        if index.is_empty() {
            restart_sequence(&store, &mut index, &previous)?;
        }
        let checkpoints = CheckpointStore::load(&store.checkpoint_path(), &index)?;

        let pipeline = Pipeline::attach(
            &store,
            &index,
            checkpoints.current(),
            &config,
            Arc::clone(&stats),
        )?;

        info!(
            task_id,
            dir = %store.dir().display(),
            segments = index.len(),
            write = %pipeline.write_position(),
            read = %pipeline.read_position(),
            "task log opened"
        );

        Ok(Self {
            task_id: task_id.to_string(),
            store,
            index,
            checkpoints,
            pipeline,
            stats,
        })
    }

    /// Appends an encoded change event.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the event cannot be encoded, or any error of
    /// [`write_payload`](Self::write_payload).
    pub fn write(&mut self, event: &ChangeEvent) -> LogResult<SegmentPosition> {
        let payload = event.encode()?;
        self.write_payload(&payload)
    }

    /// Appends an opaque payload and returns where its frame starts.
    ///
    /// Not durable until [`flush`](Self::flush).
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be written or rotation fails.
    pub fn write_payload(&mut self, payload: &[u8]) -> LogResult<SegmentPosition> {
        self.pipeline.write(&self.store, &mut self.index, payload)
    }

    /// Reads and decodes the next change event.
    ///
    /// An event that fails to decode is not consumed: the reader stays on it
    /// and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns a codec error for an undecodable event, or any error of
    /// [`read_payload`](Self::read_payload).
    pub fn read(&mut self) -> LogResult<Option<ChangeEvent>> {
        let before = self.pipeline.read_position();
        let Some(payload) = self.read_payload()? else {
            return Ok(None);
        };

        match ChangeEvent::decode(&payload) {
            Ok(event) => Ok(Some(event)),
            Err(err) => {
                self.pipeline.rewind_read(&self.store, &before)?;
                Err(err)
            }
        }
    }

    /// Returns the next unread payload, or `None` once caught up.
    ///
    /// # Errors
    ///
    /// Returns a data error for a corrupt frame or an I/O error.
    pub fn read_payload(&mut self) -> LogResult<Option<Vec<u8>>> {
        self.pipeline.read(&self.store, &self.index)
    }

    /// Makes written frames durable and persists both positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment cannot be synced or the checkpoint
    /// cannot be written. The previous checkpoint stays in effect.
    pub fn flush(&mut self) -> LogResult<()> {
        let checkpoint = self.pipeline.flush()?;
        if checkpoint == *self.checkpoints.current() {
            return Ok(());
        }

        self.checkpoints.persist(checkpoint)?;
        self.stats.record_flush();
        debug!(
            task_id = %self.task_id,
            write = %self.checkpoints.current().write,
            read = %self.checkpoints.current().read,
            "checkpoint persisted"
        );
        Ok(())
    }

    /// Closes the log, releasing segment handles and the task lock.
    ///
    /// Positions not flushed are lost.
    pub fn close(self) {
        let Self {
            task_id, pipeline, ..
        } = self;
        pipeline.close();
        info!(task_id = %task_id, "task log closed");
    }

    /// Returns the last persisted checkpoint.
    #[must_use]
    pub fn checkpoint(&self) -> &Checkpoint {
        self.checkpoints.current()
    }

    /// Returns the indexed segment names, oldest first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        self.index.names()
    }

    /// Position the next frame will be written at.
    #[must_use]
    pub fn write_position(&self) -> SegmentPosition {
        self.pipeline.write_position()
    }

    /// Position of the next frame the consumer will read.
    #[must_use]
    pub fn read_position(&self) -> SegmentPosition {
        self.pipeline.read_position()
    }

    /// Returns the task directory.
    #[must_use]
    pub fn task_dir(&self) -> &Path {
        self.store.dir()
    }

    /// Returns the task identifier.
    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Returns the log's counters.
    #[must_use]
    pub fn stats(&self) -> &LogStats {
        &self.stats
    }
}

/// Starts a fresh segment after the sweep emptied the index.
///
/// The new sequence follows the checkpoint's write segment so names keep
/// increasing across the gap.
fn restart_sequence(store: &SegmentStore, index: &mut SegmentIndex, previous: &Checkpoint) -> LogResult<()> {
    let last = parse_sequence(&previous.write.segment).unwrap_or(0);
    let name = next_segment_name(last);

    warn!(
        previous = %previous.write.segment,
        segment = %name,
        "every segment was swept, starting a new one"
    );
    store.create_segment(&name)?;
    index.append(&name)?;
    Checkpoint::at_start(&name).save(&store.checkpoint_path())
}
