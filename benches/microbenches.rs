//! Criterion microbenches for annotation parsing, repair, and conversion.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - annotation file parsing (parse_records)
//! - record formatting (format_record)
//! - clamp-then-discard repair (repair_records)
//! - normalized to pixel conversion and clipping (normalized_to_absolute, clip_boxes)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use std::path::Path;

use yolo_curate::annotation::{
    clip_boxes, format_record, normalized_to_absolute, parse_records, repair_records, YoloRecord,
};

// A detector-sized annotation file with a few out-of-range boxes.
const ANNOTATION_FIXTURE: &str = "0 0.500000 0.500000 0.200000 0.300000
0 0.200000 0.500000 0.100000 0.100000
1 0.734375 0.604167 0.531250 0.791667
2 1.050000 0.400000 0.300000 0.200000
3 0.100000 -0.020000 0.150000 0.150000
1 0.900000 0.900000 0.400000 0.400000
0 0.333333 0.666667 0.050000 0.080000
4 0.500000 0.500000 0.000000 0.250000
";

fn fixture_records() -> Vec<YoloRecord> {
    parse_records(ANNOTATION_FIXTURE, Path::new("bench.txt"))
}

/// Benchmark parsing a whole annotation file.
fn bench_parse_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("annotation_parse");
    group.throughput(Throughput::Bytes(ANNOTATION_FIXTURE.len() as u64));

    group.bench_function("parse_records", |b| {
        b.iter(|| {
            let records = parse_records(black_box(ANNOTATION_FIXTURE), Path::new("bench.txt"));
            black_box(records)
        })
    });

    group.finish();
}

fn bench_format_records(c: &mut Criterion) {
    let records = fixture_records();
    let mut group = c.benchmark_group("annotation_write");
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("format_record", |b| {
        b.iter(|| {
            let lines: Vec<String> = black_box(&records).iter().map(format_record).collect();
            black_box(lines)
        })
    });

    group.finish();
}

fn bench_repair(c: &mut Criterion) {
    let records = fixture_records();
    let mut group = c.benchmark_group("annotation_repair");
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("repair_records", |b| {
        b.iter(|| black_box(repair_records(black_box(&records))))
    });

    group.finish();
}

/// Benchmark the pixel round trip done once per augmented image.
fn bench_to_pixels(c: &mut Criterion) {
    let records = repair_records(&fixture_records());
    let mut group = c.benchmark_group("annotation_pixels");
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("normalized_to_absolute_and_clip", |b| {
        b.iter(|| {
            let boxes: Vec<_> = black_box(&records)
                .iter()
                .map(|r| normalized_to_absolute(r, 1920, 1080))
                .collect();
            black_box(clip_boxes(&boxes, 1920, 1080))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_records,
    bench_format_records,
    bench_repair,
    bench_to_pixels,
);
criterion_main!(benches);
