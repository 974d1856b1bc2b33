//! # synclog core
//!
//! Durable segmented event log buffering captured row changes between a
//! source connector and the incremental sync worker of one task.
//!
//! This crate provides:
//! - Segment naming, creation and deletion ([`SegmentStore`])
//! - The ordered segment index ([`SegmentIndex`])
//! - The durable read/write pointer ([`CheckpointStore`])
//! - Length-prefixed, checksummed record framing ([`frame`])
//! - The writer/reader cursor with size-based rotation ([`Pipeline`])
//! - Retention sweeping at startup ([`ExpirySweeper`])
//! - The per-task façade tying them together ([`LogContext`])
//!
//! ## On-disk layout
//!
//! ```text
//! <root>/data/binlog/<task_id>/
//! ├─ binlog.index      # segment names, one per line, creation order
//! ├─ binlog.config     # {"fileName": "...", "position": N, ...}
//! ├─ binlog.lock       # advisory single-owner lock
//! ├─ binlog.000001
//! └─ binlog.000002
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use synclog_core::{LogConfig, LogContext};
//!
//! let config = LogConfig::new("/var/lib/sync");
//! let mut log = LogContext::open(config, "task-1")?;
//! log.write_payload(b"row change")?;
//! log.flush()?;
//! while let Some(payload) = log.read_payload()? {
//!     // apply to target...
//!     # let _ = payload;
//! }
//! log.flush()?;
//! log.close();
//! # Ok::<(), synclog_core::LogError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod checkpoint;
mod config;
mod context;
mod error;
mod event;
pub mod frame;
mod pipeline;
pub mod segment;
mod stats;
mod sweeper;

pub use checkpoint::{Checkpoint, CheckpointStore, SegmentPosition};
pub use config::{LogConfig, DEFAULT_MAX_SEGMENT_SIZE, DEFAULT_RETENTION};
pub use context::LogContext;
pub use error::{LogError, LogResult};
pub use event::{ChangeEvent, EventKind, FieldValue, Row};
pub use pipeline::Pipeline;
pub use segment::{SegmentIndex, SegmentStore};
pub use stats::{LogStats, StatsSnapshot};
pub use sweeper::{ExpirySweeper, SweepReport};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
