//! Benchmarks for the stream frame decoder.
//!
//! Run with: `cargo bench --package ssekit-benches --bench decoder`

// Allow missing docs for criterion_group! macro generated functions
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ssekit_benches::{chunks, stream_body};
use ssekit_core::{FrameDecoder, decode_payload};

fn bench_single_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_single_pass");

    for frames in [1, 100, 1_000] {
        let body = stream_body(frames, 64);
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(frames), &body, |b, body| {
            b.iter(|| {
                let mut decoder = FrameDecoder::new();
                black_box(decoder.decode(black_box(body)))
            });
        });
    }

    group.finish();
}

fn bench_chunked(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_chunked");
    let body = stream_body(200, 128);
    group.throughput(Throughput::Bytes(body.len() as u64));

    for size in [16, 256, 4_096] {
        // The transport reports cumulative text, so each call sees a longer prefix.
        let mut prefixes = Vec::new();
        let mut end = 0;
        for piece in chunks(&body, size) {
            end += piece.len();
            prefixes.push(&body[..end]);
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), &prefixes, |b, prefixes| {
            b.iter(|| {
                let mut decoder = FrameDecoder::new();
                let mut count = 0;
                for prefix in prefixes {
                    count += decoder.decode(black_box(prefix)).len();
                }
                black_box(count)
            });
        });
    }

    group.finish();
}

fn bench_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_payload");

    group.bench_function("json_object", |b| {
        b.iter(|| decode_payload(black_box(r#"{"seq":1,"text":"hello","tags":["a","b"]}"#)));
    });
    group.bench_function("plain_text", |b| {
        b.iter(|| decode_payload(black_box("just some text that is not json")));
    });

    group.finish();
}

criterion_group!(benches, bench_single_pass, bench_chunked, bench_payload);
criterion_main!(benches);
