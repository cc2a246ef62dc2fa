//! Single producer, single consumer example.
//!
//! Measures how long it takes to pass a number of items through a bounded queue from one
//! producer thread to one consumer thread, reporting each launch through a closure.

#![allow(missing_docs, reason = "No need for API documentation in example code")]

use std::num::NonZero;

use pc_bench::{LaunchResult, MonotonicClock, PcBenchmark, Settings, run_all};
use testing::BoundedQueue;

const ITERATIONS: u64 = 100_000;
const QUEUE_CAPACITY: NonZero<usize> = NonZero::new(64).unwrap();

fn main() {
    println!("pc_bench SPSC Example");
    println!("=====================");
    println!();

    let settings = Settings::builder()
        .iterations(ITERATIONS)
        .pc(1, 1)
        .build()
        .expect("hardcoded settings are valid");

    let mut benchmark = PcBenchmark::new("spsc", settings)
        .shared_state(|_| BoundedQueue::new(QUEUE_CAPACITY))
        .producer(|ctx| {
            for i in 0..ctx.iterations() {
                if ctx.shared().push(i).is_err() {
                    return Err("queue closed early".into());
                }
            }
            Ok(())
        })
        .consumer(|ctx| {
            let mut expected = 0;

            for _ in 0..ctx.iterations() {
                let item = ctx.shared().pop().ok_or("queue closed early")?;

                // With a single producer, items must arrive in the order they were pushed.
                if item != expected {
                    return Err(format!("expected item {expected}, got {item}").into());
                }

                expected += 1;
                ctx.add_items(1);
            }
            Ok(())
        });

    let mut report = |current: usize, total: usize, result: &LaunchResult| {
        println!(
            "[{}/{total}] {}: {:?}",
            current + 1,
            result.configuration(),
            result.elapsed()
        );
    };

    run_all(&mut benchmark, &MonotonicClock::new(), &mut report)
        .expect("launch indexes come from the benchmark itself");

    for result in benchmark.results() {
        match result.failure() {
            Some(failure) => println!("Failed: {failure}"),
            None => println!(
                "Throughput: {:.0} items/s, {:?} per item",
                result.items_per_second().unwrap_or_default(),
                result.mean_iteration_duration().unwrap_or_default()
            ),
        }
    }
}
