//! Captured row-change events.
//!
//! Source decoders turn native replication streams into [`ChangeEvent`]s;
//! the log stores them as CBOR payloads and hands them back unchanged to the
//! incremental sync worker.

use crate::error::{LogError, LogResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column name to value.
pub type Row = BTreeMap<String, FieldValue>;

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A row was inserted.
    Insert,
    /// A row was updated.
    Update,
    /// A row was deleted.
    Delete,
}

/// A column value as captured from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// SQL `NULL`.
    Null,
    /// Boolean column.
    Bool(bool),
    /// Integer column.
    Int(i64),
    /// Floating-point column.
    Float(f64),
    /// Character column.
    Text(String),
    /// Binary column.
    Bytes(Vec<u8>),
}

/// One captured row change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Identifier of the table mapping this change belongs to.
    pub table_group_id: String,
    /// Source table name.
    pub table: String,
    /// Kind of change.
    pub kind: EventKind,
    /// Row image before the change (updates and deletes).
    pub before: Option<Row>,
    /// Row image after the change (inserts and updates).
    pub after: Option<Row>,
    /// Native source position (binlog coordinates, LSN, ...), if known.
    pub source_position: Option<String>,
    /// Capture time in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl ChangeEvent {
    /// Creates an insert event.
    pub fn insert(table_group_id: impl Into<String>, table: impl Into<String>, row: Row) -> Self {
        Self::new(table_group_id, table, EventKind::Insert, None, Some(row))
    }

    /// Creates an update event.
    pub fn update(
        table_group_id: impl Into<String>,
        table: impl Into<String>,
        before: Row,
        after: Row,
    ) -> Self {
        Self::new(table_group_id, table, EventKind::Update, Some(before), Some(after))
    }

    /// Creates a delete event.
    pub fn delete(table_group_id: impl Into<String>, table: impl Into<String>, row: Row) -> Self {
        Self::new(table_group_id, table, EventKind::Delete, Some(row), None)
    }

    fn new(
        table_group_id: impl Into<String>,
        table: impl Into<String>,
        kind: EventKind,
        before: Option<Row>,
        after: Option<Row>,
    ) -> Self {
        Self {
            table_group_id: table_group_id.into(),
            table: table.into(),
            kind,
            before,
            after,
            source_position: None,
            timestamp_ms: 0,
        }
    }

    /// Attaches the native source position.
    #[must_use]
    pub fn with_source_position(mut self, position: impl Into<String>) -> Self {
        self.source_position = Some(position.into());
        self
    }

    /// Sets the capture timestamp.
    #[must_use]
    pub const fn with_timestamp_ms(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Serializes the event to CBOR.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Codec`] if serialization fails.
    pub fn encode(&self) -> LogResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| LogError::codec(e.to_string()))?;
        Ok(buf)
    }

    /// Deserializes an event from CBOR.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Codec`] if the bytes are not a valid event.
    pub fn decode(bytes: &[u8]) -> LogResult<Self> {
        ciborium::from_reader(bytes).map_err(|e| LogError::codec(e.to_string()))
    }
}
