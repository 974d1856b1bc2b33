//! Crash simulation on segment files.
//!
//! A process killed mid-append leaves a prefix of the last frame on disk; a
//! filesystem that extends a file before writing its data leaves zeros.
//! These helpers reproduce both states on a closed log so a reopen can be
//! checked against them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use synclog_testkit::crash::truncate_tail;
//!
//! log.close();
//! truncate_tail(&task.segment_path("binlog.000001"), 3);
//! let log = task.open();
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Cuts `bytes` off the end of a file, as if its last write was torn.
///
/// Returns the new length.
pub fn truncate_tail(path: &Path, bytes: u64) -> u64 {
    let len = fs::metadata(path).expect("Failed to stat file").len();
    let new_len = len.saturating_sub(bytes);
    OpenOptions::new()
        .write(true)
        .open(path)
        .expect("Failed to open file")
        .set_len(new_len)
        .expect("Failed to truncate file");
    new_len
}

/// Appends raw bytes to a file, bypassing framing.
pub fn append_garbage(path: &Path, bytes: &[u8]) {
    OpenOptions::new()
        .append(true)
        .open(path)
        .expect("Failed to open file")
        .write_all(bytes)
        .expect("Failed to append");
}

/// Extends a file with `len` zero bytes.
pub fn append_zeros(path: &Path, len: usize) {
    append_garbage(path, &vec![0u8; len]);
}

/// Removes a segment file behind the log's back.
pub fn delete_segment(task_dir: &Path, name: &str) {
    fs::remove_file(task_dir.join(name)).expect("Failed to delete segment");
}

/// Flips one byte of a file in place.
pub fn flip_byte(path: &Path, offset: usize) {
    let mut bytes = fs::read(path).expect("Failed to read file");
    bytes[offset] ^= 0xff;
    fs::write(path, bytes).expect("Failed to rewrite file");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn truncate_tail_saturates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("segment");
        fs::write(&path, [1, 2, 3]).unwrap();

        assert_eq!(truncate_tail(&path, 1), 2);
        assert_eq!(truncate_tail(&path, 10), 0);
    }

    #[test]
    fn garbage_and_flips_modify_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("segment");
        fs::write(&path, [0u8; 2]).unwrap();

        append_garbage(&path, &[9]);
        append_zeros(&path, 2);
        flip_byte(&path, 0);
        assert_eq!(fs::read(&path).unwrap(), vec![0xff, 0, 9, 0, 0]);
    }
}
