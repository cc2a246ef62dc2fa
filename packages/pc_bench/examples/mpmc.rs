//! Multiple producers, multiple consumers example.
//!
//! Runs a bounded queue through a doubling matrix of producer and consumer thread counts.
//! One configuration is deliberately broken to show that a failing launch is reported without
//! stopping the rest of the matrix, and how blocked consumers notice that the launch failed.

#![allow(missing_docs, reason = "No need for API documentation in example code")]

use std::num::NonZero;
use std::time::Duration;

use pc_bench::{LogProgress, MonotonicClock, PcBenchmark, Settings, run_all};
use testing::BoundedQueue;
use tracing_subscriber::EnvFilter;

const ITERATIONS: u64 = 50_000;
const QUEUE_CAPACITY: NonZero<usize> = NonZero::new(128).unwrap();
const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::builder()
        .iterations(ITERATIONS)
        .pc_doubling(4, 4)
        .build()
        .expect("hardcoded settings are valid");

    let mut benchmark = PcBenchmark::new("mpmc", settings)
        .shared_state(|_| BoundedQueue::new(QUEUE_CAPACITY))
        .producer(|ctx| {
            // Pretend that this queue cannot handle 4 producers feeding 1 consumer.
            let configuration = ctx.configuration();
            if configuration.producers().get() == 4 && configuration.consumers().get() == 1 {
                return Err("refusing to overload a single consumer".into());
            }

            for i in 0..ctx.iterations() {
                if ctx.shared().push(i).is_err() {
                    return Err("queue closed early".into());
                }
            }
            Ok(())
        })
        .consumer(|ctx| {
            let mut remaining = ctx.iterations();

            while remaining > 0 {
                match ctx.shared().pop_timeout(POLL_INTERVAL) {
                    Some(_) => {
                        remaining -= 1;
                        ctx.add_items(1);
                    }
                    // Items from a failed producer will never arrive.
                    None if ctx.launch_failed() => return Err("gave up, launch failed".into()),
                    None => {}
                }
            }
            Ok(())
        });

    run_all(&mut benchmark, &MonotonicClock::new(), &mut LogProgress::new())
        .expect("launch indexes come from the benchmark itself");

    println!();

    for result in benchmark.results() {
        match result.failure() {
            Some(failure) => println!("{:<28} FAILED: {failure}", result.configuration().to_string()),
            None => println!(
                "{:<28} {:>12.0} items/s",
                result.configuration().to_string(),
                result.items_per_second().unwrap_or_default()
            ),
        }
    }
}
