//! Rotation, retention and the end-to-end task scenario.

use std::time::{Duration, SystemTime};
use synclog_core::frame::FRAME_HEADER_SIZE;
use synclog_core::{
    ChangeEvent, Checkpoint, FieldValue, LogContext, Row, SegmentPosition, DEFAULT_MAX_SEGMENT_SIZE,
};
use synclog_testkit::crash::delete_segment;
use synclog_testkit::{drain, TempTask};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[test]
fn rotation_appends_next_segment_to_index() {
    let task = TempTask::new().configure(|c| c.max_segment_size(100));
    let mut log = task.open();

    let mut last = SegmentPosition::new("binlog.000001", 0);
    while log.segments().len() == 1 {
        last = log.write_payload(&[0xab; 40]).unwrap();
    }
    assert_eq!(last.segment, "binlog.000001");
    assert_eq!(log.segments(), ["binlog.000001", "binlog.000002"]);
    assert_eq!(task.index_on_disk(), log.segments());

    let next = log.write_payload(b"lands in the new segment").unwrap();
    assert_eq!(next, SegmentPosition::new("binlog.000002", 0));

    let sealed = std::fs::metadata(task.segment_path("binlog.000001")).unwrap().len();
    assert!(sealed > 100);
    assert!(sealed <= 100 + FRAME_HEADER_SIZE + 40);
    assert_eq!(log.stats().snapshot().rotations, 1);
}

#[test]
fn rotation_survives_restart() {
    let task = TempTask::new().configure(|c| c.max_segment_size(64));
    let mut log = task.open();
    let records: Vec<Vec<u8>> = (0..20u8).map(|i| vec![i; 24]).collect();
    for record in &records {
        log.write_payload(record).unwrap();
    }
    log.flush().unwrap();
    let segments = log.segments().to_vec();
    log.close();

    let mut log = task.open();
    assert_eq!(log.segments(), segments.as_slice());
    assert_eq!(drain(&mut log), records);
    assert_eq!(log.read_position(), log.write_position());
}

#[test]
fn sweep_is_idempotent() {
    let task = TempTask::new().configure(|c| c.max_segment_size(16));
    let mut log = task.open();
    for i in 0u8..3 {
        log.write_payload(&[i; 10]).unwrap();
    }
    log.flush().unwrap();
    log.close();
    delete_segment(&task.task_dir(), "binlog.000002");

    let now = SystemTime::now();
    let log = LogContext::open_at(task.config().clone(), task.task_id(), now).unwrap();
    assert_eq!(log.stats().snapshot().segments_swept, 1);
    let segments = log.segments().to_vec();
    let checkpoint = log.checkpoint().clone();
    log.close();
    let index = std::fs::read(task.index_path()).unwrap();

    let log = LogContext::open_at(task.config().clone(), task.task_id(), now).unwrap();
    assert_eq!(log.stats().snapshot().segments_swept, 0);
    assert_eq!(log.segments(), segments.as_slice());
    assert_eq!(log.checkpoint(), &checkpoint);
    assert_eq!(std::fs::read(task.index_path()).unwrap(), index);
}

#[test]
fn expired_segments_are_deleted_at_startup() {
    let task = TempTask::new().configure(|c| c.max_segment_size(16).retention(7 * DAY));
    let mut log = task.open();
    log.write_payload(&[1; 10]).unwrap();
    log.write_payload(&[2; 10]).unwrap();
    log.flush().unwrap();
    log.close();

    let six_days = SystemTime::now() + 6 * DAY;
    let log = LogContext::open_at(task.config().clone(), task.task_id(), six_days).unwrap();
    assert_eq!(log.segments().len(), 3);
    log.close();

    let eight_days = SystemTime::now() + 8 * DAY;
    let log = LogContext::open_at(task.config().clone(), task.task_id(), eight_days).unwrap();
    assert_eq!(log.segments(), ["binlog.000004"]);
    assert_eq!(log.checkpoint(), &Checkpoint::at_start("binlog.000004"));
    for name in ["binlog.000001", "binlog.000002", "binlog.000003"] {
        assert!(!task.segment_path(name).exists());
    }
}

#[test]
fn scenario_t1() {
    let task = TempTask::named("t1");

    let mut log = task.open();
    assert_eq!(log.segments(), ["binlog.000001"]);
    assert_eq!(log.checkpoint(), &Checkpoint::at_start("binlog.000001"));

    let a = [b'a'; 10];
    let b = [b'b'; 5];
    log.write_payload(&a).unwrap();
    log.write_payload(&b).unwrap();
    log.flush().unwrap();
    assert_eq!(
        log.checkpoint().write,
        SegmentPosition::new("binlog.000001", 15 + 2 * FRAME_HEADER_SIZE)
    );
    let on_disk = std::fs::read_to_string(task.checkpoint_path()).unwrap();
    assert!(on_disk.contains(r#""fileName":"binlog.000001","position":31"#));
    log.close();

    let mut log = task.open();
    assert_eq!(log.read_payload().unwrap(), Some(a.to_vec()));
    assert_eq!(log.read_payload().unwrap(), Some(b.to_vec()));
    assert_eq!(log.read_payload().unwrap(), None);

    // push the active segment past the default 256 MiB limit
    let chunk = vec![0x5a; 4 * 1024 * 1024];
    let chunks = DEFAULT_MAX_SEGMENT_SIZE / chunk.len() as u64 + 1;
    for _ in 0..chunks {
        log.write_payload(&chunk).unwrap();
    }
    assert_eq!(log.segments(), ["binlog.000001", "binlog.000002"]);
    log.write_payload(b"tail").unwrap();

    let mut chunks_read = 0;
    let mut last = Vec::new();
    while let Some(payload) = log.read_payload().unwrap() {
        if payload.len() == chunk.len() {
            chunks_read += 1;
        }
        last = payload;
    }
    assert_eq!(chunks_read, chunks);
    assert_eq!(last, b"tail");
    assert_eq!(log.read_position().segment, "binlog.000002");
}

#[test]
fn typed_events_round_trip() {
    let task = TempTask::new();
    let mut before = Row::new();
    before.insert("id".into(), FieldValue::Int(7));
    before.insert("name".into(), FieldValue::Text("old".into()));
    let mut after = before.clone();
    after.insert("name".into(), FieldValue::Text("new".into()));
    after.insert("avatar".into(), FieldValue::Bytes(vec![1, 2, 3]));

    let events = vec![
        ChangeEvent::insert("g1", "users", before.clone()).with_source_position("mysql-bin.000003:120"),
        ChangeEvent::update("g1", "users", before.clone(), after.clone()).with_timestamp_ms(1_700_000_000_000),
        ChangeEvent::delete("g1", "users", after),
    ];

    let mut log = task.open();
    for event in &events {
        log.write(event).unwrap();
    }
    log.flush().unwrap();
    log.close();

    let mut log = task.open();
    let mut read = Vec::new();
    while let Some(event) = log.read().unwrap() {
        read.push(event);
    }
    assert_eq!(read, events);
    assert_eq!(log.stats().records_read(), 3);
}

#[test]
fn concurrent_open_of_task_is_rejected() {
    let task = TempTask::new();
    let _owner = task.open();
    let err = LogContext::open(task.config().clone(), task.task_id()).unwrap_err();
    assert!(matches!(err, synclog_core::LogError::TaskLocked { .. }));
}
