//! Benchmarks for event dispatch through the client.
//!
//! Run with: `cargo bench --package ssekit-benches --bench lifecycle`

// Allow missing docs for criterion_group! macro generated functions
#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ssekit_benches::{chunks, stream_body};
use ssekit_client::EventSource;
use ssekit_testing::{ManualScheduler, MockTransport, fixtures};

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    for listeners in [1, 8] {
        let body = stream_body(100, 64);
        let pieces: Vec<String> = chunks(&body, 512).into_iter().map(str::to_owned).collect();
        group.throughput(Throughput::Elements(100));

        group.bench_with_input(BenchmarkId::from_parameter(listeners), &pieces, |b, pieces| {
            b.iter(|| {
                let transport = MockTransport::new();
                let source = EventSource::builder(fixtures::BASE_URL)
                    .transport(transport.clone())
                    .scheduler(ManualScheduler::new())
                    .build()
                    .expect("valid configuration");

                let seen = Arc::new(AtomicUsize::new(0));
                for _ in 0..listeners {
                    let seen = Arc::clone(&seen);
                    source.on("update", move |_| {
                        seen.fetch_add(1, Ordering::Relaxed);
                    });
                }

                source.open();
                transport.respond(200);
                for piece in pieces {
                    transport.send(piece);
                }
                source.destroy();
                black_box(seen.load(Ordering::Relaxed))
            });
        });
    }

    group.finish();
}

fn bench_retry_cycle(c: &mut Criterion) {
    c.bench_function("fail_and_retry", |b| {
        let transport = MockTransport::new();
        let scheduler = ManualScheduler::new();
        let source = EventSource::builder(fixtures::BASE_URL)
            .retry_policy(fixtures::fast_retry())
            .transport(transport.clone())
            .scheduler(scheduler.clone())
            .rng_seed(1)
            .build()
            .expect("valid configuration");
        source.open();

        b.iter(|| {
            transport.fail();
            scheduler.fire_next();
        });
    });
}

criterion_group!(benches, bench_dispatch, bench_retry_cycle);
criterion_main!(benches);
