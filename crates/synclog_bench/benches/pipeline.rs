//! Task log write/read benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use synclog_bench::utils::{generate_events, random_data, temp_log};
use synclog_core::DEFAULT_MAX_SEGMENT_SIZE;

/// Benchmark appending raw payloads without flushing.
fn bench_write_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_payload");

    for size in [64, 512, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let (_dir, mut log) = temp_log(DEFAULT_MAX_SEGMENT_SIZE, false);
            let data = random_data(size);

            b.iter(|| {
                let position = log.write_payload(black_box(&data)).unwrap();
                black_box(position);
            });
        });
    }

    group.finish();
}

/// Benchmark write + flush per record, with and without fsync.
fn bench_write_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_flush");
    group.sample_size(20);

    for sync in [false, true] {
        group.bench_with_input(BenchmarkId::new("sync", sync), &sync, |b, &sync| {
            let (_dir, mut log) = temp_log(DEFAULT_MAX_SEGMENT_SIZE, sync);
            let data = random_data(256);

            b.iter(|| {
                log.write_payload(black_box(&data)).unwrap();
                log.flush().unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark reading back a batch that spans several segments.
fn bench_read_across_segments(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_across_segments");
    let count = 1_000u64;
    group.throughput(Throughput::Elements(count));

    group.bench_function("1k_records_64k_segments", |b| {
        b.iter_with_setup(
            || {
                let (dir, mut log) = temp_log(64 * 1024, false);
                let data = random_data(512);
                for _ in 0..count {
                    log.write_payload(&data).unwrap();
                }
                (dir, log)
            },
            |(_dir, mut log)| {
                while let Some(payload) = log.read_payload().unwrap() {
                    black_box(payload);
                }
            },
        );
    });

    group.finish();
}

/// Benchmark typed event writes (CBOR encode included).
fn bench_write_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_event");
    let events = generate_events(256, 8, 16);
    group.throughput(Throughput::Elements(events.len() as u64));

    group.bench_function("256_inserts", |b| {
        let (_dir, mut log) = temp_log(DEFAULT_MAX_SEGMENT_SIZE, false);
        b.iter(|| {
            for event in &events {
                log.write(black_box(event)).unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_write_payload,
    bench_write_flush,
    bench_read_across_segments,
    bench_write_events,
);
criterion_main!(benches);
