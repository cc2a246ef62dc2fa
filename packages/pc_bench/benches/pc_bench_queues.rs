//! Compares queue implementations under a matrix of producer and consumer thread counts,
//! registering every configuration as its own Criterion benchmark.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::num::NonZero;
use std::sync::mpsc;

use criterion::{Criterion, criterion_group, criterion_main};
use parking_lot::Mutex;
use pc_bench::{PcBenchmark, Settings};
use testing::BoundedQueue;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const QUEUE_CAPACITY: NonZero<usize> = NonZero::new(128).unwrap();

fn entrypoint(c: &mut Criterion) {
    let settings = Settings::builder()
        .pc_doubling(4, 4)
        .build()
        .expect("thread counts are hardcoded and valid");

    let mut group = c.benchmark_group("bounded_queue");

    PcBenchmark::new("bounded_queue", settings.clone())
        .shared_state(|_| BoundedQueue::new(QUEUE_CAPACITY))
        .producer(|ctx| {
            for i in 0..ctx.iterations() {
                if ctx.shared().push(black_box(i)).is_err() {
                    return Err("queue closed before all items were pushed".into());
                }
            }
            Ok(())
        })
        .consumer(|ctx| {
            for _ in 0..ctx.iterations() {
                black_box(ctx.shared().pop());
            }
            Ok(())
        })
        .execute_criterion_on(&mut group);

    group.finish();

    let mut group = c.benchmark_group("sync_channel");

    // The receiver cannot be shared, so consumers take turns holding it.
    PcBenchmark::new("sync_channel", settings)
        .shared_state(|_| {
            let (tx, rx) = mpsc::sync_channel::<u64>(QUEUE_CAPACITY.get());
            (tx, Mutex::new(rx))
        })
        .producer(|ctx| {
            let (tx, _) = ctx.shared();
            for i in 0..ctx.iterations() {
                tx.send(black_box(i))?;
            }
            Ok(())
        })
        .consumer(|ctx| {
            let (_, rx) = ctx.shared();
            for _ in 0..ctx.iterations() {
                black_box(rx.lock().recv()?);
            }
            Ok(())
        })
        .execute_criterion_on(&mut group);

    group.finish();
}
