//! Startup retention sweep.
//!
//! Runs once before the pipeline attaches. Index entries whose file is gone
//! are dropped; files created before `now - retention` are deleted and
//! dropped. The index is rewritten at most once per sweep.
//!
//! The segment named by the checkpoint is not exempt. Deleting it is logged
//! and left to checkpoint repair.

use crate::checkpoint::Checkpoint;
use crate::error::LogResult;
use crate::segment::{SegmentIndex, SegmentStore};
use std::collections::HashSet;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// What a sweep removed from the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries whose file no longer existed.
    pub missing: Vec<String>,
    /// Segments deleted for exceeding the retention window.
    pub expired: Vec<String>,
}

impl SweepReport {
    /// Returns `true` if the sweep changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.expired.is_empty()
    }

    /// Number of index entries dropped.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.missing.len() + self.expired.len()
    }
}

/// Removes expired and missing segments.
#[derive(Debug, Clone, Copy)]
pub struct ExpirySweeper {
    retention: Duration,
}

impl ExpirySweeper {
    /// Creates a sweeper that keeps segments for `retention`.
    #[must_use]
    pub const fn new(retention: Duration) -> Self {
        Self { retention }
    }

    /// Sweeps `index` as of `now`.
    ///
    /// `checkpoint` only serves to warn when the segment it names is deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if an expired segment cannot be deleted or the index
    /// cannot be rewritten. Entries already processed stay in memory only
    /// until the rewrite succeeds.
    pub fn sweep(
        &self,
        store: &SegmentStore,
        index: &mut SegmentIndex,
        checkpoint: Option<&Checkpoint>,
        now: SystemTime,
    ) -> LogResult<SweepReport> {
        let cutoff = now.checked_sub(self.retention);
        let mut report = SweepReport::default();

        for name in index.names() {
            if !store.segment_exists(name) {
                warn!(segment = %name, "indexed segment missing from disk, dropping");
                report.missing.push(name.clone());
                continue;
            }

            let Some(cutoff) = cutoff else { continue };
            if store.segment_created_at(name)? >= cutoff {
                continue;
            }

            if checkpoint.is_some_and(|c| c.write.segment == *name || c.read.segment == *name) {
                warn!(segment = %name, "deleting expired segment referenced by the checkpoint");
            }
            store.delete_segment(name)?;
            report.expired.push(name.clone());
        }

        if report.is_empty() {
            return Ok(report);
        }

        let dropped: HashSet<String> = report
            .missing
            .iter()
            .chain(&report.expired)
            .cloned()
            .collect();
        index.remove_all(&dropped)?;

        info!(
            missing = report.missing.len(),
            expired = report.expired.len(),
            remaining = index.len(),
            "segment sweep complete"
        );
        Ok(report)
    }
}
