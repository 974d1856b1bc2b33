//! Benchmark utilities.

use rand::Rng;
use synclog_core::{ChangeEvent, FieldValue, LogConfig, LogContext, Row};
use tempfile::TempDir;

/// Generate random payload bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate insert events with `columns` text columns of `width` bytes each.
pub fn generate_events(count: usize, columns: usize, width: usize) -> Vec<ChangeEvent> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let mut row = Row::new();
            row.insert("id".into(), FieldValue::Int(i as i64));
            for c in 0..columns {
                let text: String = (0..width).map(|_| rng.gen_range('a'..='z')).collect();
                row.insert(format!("col_{c}"), FieldValue::Text(text));
            }
            ChangeEvent::insert("bench", "events", row).with_timestamp_ms(i as i64)
        })
        .collect()
}

/// Opens a task log in a fresh temporary root.
///
/// The directory must outlive the log.
pub fn temp_log(max_segment_size: u64, sync_on_flush: bool) -> (TempDir, LogContext) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let config = LogConfig::new(dir.path())
        .max_segment_size(max_segment_size)
        .sync_on_flush(sync_on_flush);
    let log = LogContext::open(config, "bench").expect("Failed to open task log");
    (dir, log)
}
