//! The ordered list of live segments.

use crate::error::{LogError, LogResult};
use crate::segment::write_atomic;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Segment names in creation order, mirrored to `binlog.index`.
///
/// # Invariants
///
/// - No name appears twice
/// - The last entry is the active (writable) segment
/// - Entries leave the index only through [`SegmentIndex::remove_all`],
///   which the sweeper drives
/// - Every mutation rewrites the whole file, so it always parses
#[derive(Debug, Clone)]
pub struct SegmentIndex {
    path: PathBuf,
    names: Vec<String>,
}

impl SegmentIndex {
    /// Creates an index file holding `names`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn create(path: &Path, names: Vec<String>) -> LogResult<Self> {
        let index = Self {
            path: path.to_path_buf(),
            names: dedup(names),
        };
        index.persist()?;
        Ok(index)
    }

    /// Reads the index file.
    ///
    /// Blank lines are skipped and repeated names are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::IndexMissing`] if the file does not exist. After a
    /// bootstrap this is an environment failure the task cannot recover from.
    pub fn load(path: &Path) -> LogResult<Self> {
        if !path.exists() {
            return Err(LogError::IndexMissing {
                path: path.to_path_buf(),
            });
        }

        let contents = fs::read_to_string(path)?;
        let names: Vec<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        let total = names.len();
        let names = dedup(names);
        if names.len() != total {
            warn!(
                path = %path.display(),
                dropped = total - names.len(),
                "index held duplicate segment names"
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            names,
        })
    }

    /// Returns the segment names in creation order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the number of indexed segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no segment is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Checks whether `name` is indexed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Returns the earliest indexed segment.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    /// Returns the latest (active) segment.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// Returns the segment indexed right after `name`.
    ///
    /// `None` when `name` is the active segment or is not indexed.
    #[must_use]
    pub fn next_after(&self, name: &str) -> Option<&str> {
        let position = self.names.iter().position(|n| n == name)?;
        self.names.get(position + 1).map(String::as_str)
    }

    /// Appends a newly created segment and rewrites the index file.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::SegmentNameCollision`] if `name` is already
    /// indexed, or an I/O error.
    pub fn append(&mut self, name: &str) -> LogResult<()> {
        if self.contains(name) {
            return Err(LogError::SegmentNameCollision {
                name: name.to_string(),
            });
        }
        self.names.push(name.to_string());
        if let Err(err) = self.persist() {
            self.names.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Drops every name in `dropped` and rewrites the index file once.
    ///
    /// Returns the number of entries removed; the file is untouched when
    /// nothing matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be rewritten.
    pub fn remove_all(&mut self, dropped: &HashSet<String>) -> LogResult<usize> {
        let before = self.names.len();
        self.names.retain(|name| !dropped.contains(name));
        let removed = before - self.names.len();
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    fn persist(&self) -> LogResult<()> {
        let mut contents = String::new();
        for name in &self.names {
            contents.push_str(name);
            contents.push('\n');
        }
        write_atomic(&self.path, contents.as_bytes())
    }
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn load_missing_file_is_fatal() {
        let temp = tempdir().unwrap();
        let result = SegmentIndex::load(&temp.path().join("binlog.index"));
        assert!(matches!(result, Err(LogError::IndexMissing { .. })));
    }

    #[test]
    fn load_skips_blank_lines_and_duplicates() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("binlog.index");
        fs::write(&path, "binlog.000001\r\n\nbinlog.000002\nbinlog.000001\n").unwrap();

        let index = SegmentIndex::load(&path).unwrap();
        assert_eq!(index.names(), names(&["binlog.000001", "binlog.000002"]));
    }

    #[test]
    fn append_persists_in_order() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("binlog.index");
        let mut index = SegmentIndex::create(&path, names(&["binlog.000001"])).unwrap();

        index.append("binlog.000002").unwrap();

        let reloaded = SegmentIndex::load(&path).unwrap();
        assert_eq!(reloaded.names(), names(&["binlog.000001", "binlog.000002"]));
        assert_eq!(fs::read_to_string(&path).unwrap(), "binlog.000001\nbinlog.000002\n");
    }

    #[test]
    fn append_rejects_duplicate() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("binlog.index");
        let mut index = SegmentIndex::create(&path, names(&["binlog.000001"])).unwrap();

        let result = index.append("binlog.000001");
        assert!(matches!(result, Err(LogError::SegmentNameCollision { .. })));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn navigation() {
        let temp = tempdir().unwrap();
        let index = SegmentIndex::create(
            &temp.path().join("binlog.index"),
            names(&["binlog.000003", "binlog.000004", "binlog.000005"]),
        )
        .unwrap();

        assert_eq!(index.first(), Some("binlog.000003"));
        assert_eq!(index.last(), Some("binlog.000005"));
        assert_eq!(index.next_after("binlog.000003"), Some("binlog.000004"));
        assert_eq!(index.next_after("binlog.000005"), None);
        assert_eq!(index.next_after("binlog.000009"), None);
    }

    #[test]
    fn remove_all_rewrites_once() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("binlog.index");
        let mut index = SegmentIndex::create(
            &path,
            names(&["binlog.000001", "binlog.000002", "binlog.000003"]),
        )
        .unwrap();

        let dropped: HashSet<String> = names(&["binlog.000001", "binlog.000003"]).into_iter().collect();
        assert_eq!(index.remove_all(&dropped).unwrap(), 2);
        assert_eq!(SegmentIndex::load(&path).unwrap().names(), names(&["binlog.000002"]));

        assert_eq!(index.remove_all(&dropped).unwrap(), 0);
    }
}
