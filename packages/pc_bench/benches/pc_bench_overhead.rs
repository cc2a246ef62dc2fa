//! Benchmark demonstrating `pc_bench` overhead with empty producer and consumer hooks.
//!
//! The hooks do nothing, so what is measured is the cost of releasing the threads of a
//! launch and detecting that all of them have finished.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::num::NonZero;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use pc_bench::{Configuration, MonotonicClock, PcBenchmark, Settings};

criterion_group!(benches, pc_bench_overhead);
criterion_main!(benches);

fn pc_bench_overhead(c: &mut Criterion) {
    let benchmark = PcBenchmark::new("overhead", Settings::default())
        .producer(|ctx| {
            black_box(ctx.iterations());
            Ok(())
        })
        .consumer(|ctx| {
            black_box(ctx.iterations());
            Ok(())
        });

    let clock = MonotonicClock::new();

    let mut group = c.benchmark_group("overhead");

    for (producers, consumers) in [(1, 1), (4, 4)] {
        let configuration = Configuration::new(producers, consumers)
            .expect("thread counts are hardcoded and valid");

        group.bench_function(configuration.to_string(), |b| {
            b.iter_custom(|iters| {
                let Some(iterations) = NonZero::new(iters) else {
                    return Duration::ZERO;
                };

                let result = benchmark.measure(configuration, iterations, &clock);
                assert!(!result.is_failed(), "{:?}", result.failure());

                result.elapsed()
            });
        });
    }

    group.finish();
}
