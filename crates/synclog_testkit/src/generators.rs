//! Property-based test generators using proptest.

use proptest::prelude::*;
use synclog_core::{ChangeEvent, EventKind, FieldValue, Row};

/// Strategy for opaque record payloads, empty ones included.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Strategy for a batch of payloads written in one run.
pub fn payload_batch_strategy(max_len: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(payload_strategy(), 1..max_len.max(2))
}

/// Strategy for column names.
pub fn column_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for column values.
///
/// Floats are kept finite so events compare equal after a round trip.
pub fn field_value_strategy() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        any::<i64>().prop_map(FieldValue::Int),
        (-1.0e12f64..1.0e12).prop_map(FieldValue::Float),
        ".{0,32}".prop_map(FieldValue::Text),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(FieldValue::Bytes),
    ]
}

/// Strategy for a row image.
pub fn row_strategy() -> impl Strategy<Value = Row> {
    prop::collection::btree_map(column_name_strategy(), field_value_strategy(), 0..8)
}

/// Strategy for change events of every kind.
pub fn change_event_strategy() -> impl Strategy<Value = ChangeEvent> {
    (
        prop_oneof![Just(EventKind::Insert), Just(EventKind::Update), Just(EventKind::Delete)],
        column_name_strategy(),
        row_strategy(),
        row_strategy(),
        prop::option::of("[0-9a-f]{1,16}/[0-9a-f]{1,8}"),
        0i64..4_102_444_800_000,
    )
        .prop_map(|(kind, table, before, after, position, timestamp_ms)| {
            let event = match kind {
                EventKind::Insert => ChangeEvent::insert("group", table, after),
                EventKind::Update => ChangeEvent::update("group", table, before, after),
                EventKind::Delete => ChangeEvent::delete("group", table, before),
            };
            let event = event.with_timestamp_ms(timestamp_ms);
            match position {
                Some(position) => event.with_source_position(position),
                None => event,
            }
        })
}
