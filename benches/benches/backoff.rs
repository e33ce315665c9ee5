//! Benchmarks for retry delay computation.
//!
//! Run with: `cargo bench --package ssekit-benches --bench backoff`

// Allow missing docs for criterion_group! macro generated functions
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ssekit_core::{compute_retry_delay, growth_ceiling, peer_close_delay};

fn bench_retry_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_retry_delay");
    let min = Duration::from_secs(1);
    let max = Duration::from_secs(30);
    let mut rng = StdRng::seed_from_u64(7);

    for attempt in [1_u32, 10, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(attempt), &attempt, |b, &attempt| {
            b.iter(|| compute_retry_delay(black_box(attempt), min, max, &mut rng));
        });
    }

    group.finish();
}

fn bench_ceiling(c: &mut Criterion) {
    let min = Duration::from_millis(100);
    let max = Duration::MAX;
    c.bench_function("growth_ceiling_unbounded", |b| {
        b.iter(|| growth_ceiling(black_box(u32::MAX), min, max));
    });
}

fn bench_peer_close(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    c.bench_function("peer_close_delay", |b| {
        b.iter(|| {
            peer_close_delay(
                black_box(Duration::from_secs(3)),
                Duration::from_secs(1),
                &mut rng,
            )
        });
    });
}

criterion_group!(benches, bench_retry_delay, bench_ceiling, bench_peer_close);
criterion_main!(benches);
