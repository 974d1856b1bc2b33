//! Segment files and the index that orders them.
//!
//! A segment is an append-only file of frames named `binlog.NNNNNN`. Only the
//! last segment in the index accepts writes; every earlier one is sealed and
//! read-only until the sweeper expires it.
//!
//! ## Naming
//!
//! Sequence numbers run from `1` to [`SEQUENCE_BOUND`] and wrap back to `1`.
//! The name following `binlog.999999` is `binlog.000001`; creating it while
//! the old `binlog.000001` is still indexed fails with
//! [`crate::LogError::SegmentNameCollision`].

mod index;
mod store;

pub use index::SegmentIndex;
pub use store::SegmentStore;

pub(crate) use store::write_atomic;

use crate::error::{LogError, LogResult};

/// Base name shared by every file of a task's log.
pub const BASE_NAME: &str = "binlog";

/// Largest sequence number before wrapping.
pub const SEQUENCE_BOUND: u32 = 999_999;

/// Renders the segment name for `sequence`.
#[must_use]
pub fn segment_name(sequence: u32) -> String {
    format!("{BASE_NAME}.{sequence:06}")
}

/// Returns the name that follows the segment numbered `last_sequence`.
///
/// `next_segment_name(0)` is the very first segment of a task.
#[must_use]
pub fn next_segment_name(last_sequence: u32) -> String {
    segment_name(last_sequence % SEQUENCE_BOUND + 1)
}

/// Extracts the sequence number from a segment name.
///
/// # Errors
///
/// Returns [`LogError::InvalidSegmentName`] unless `name` is `binlog.`
/// followed by six digits.
pub fn parse_sequence(name: &str) -> LogResult<u32> {
    let invalid = || LogError::InvalidSegmentName {
        name: name.to_string(),
    };
    let digits = name
        .strip_prefix(BASE_NAME)
        .and_then(|rest| rest.strip_prefix('.'))
        .ok_or_else(invalid)?;
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    digits.parse().map_err(|_| invalid())
}
