//! Multiple producers, single consumer example.
//!
//! Uses the standard library's bounded channel as the shared state and measures how its
//! throughput changes as producers are added, logging progress via `tracing`.
//!
//! Run with `RUST_LOG=debug` to also see the engine's own launch events.

#![allow(missing_docs, reason = "No need for API documentation in example code")]

use std::mem;
use std::sync::mpsc;

use parking_lot::Mutex;
use pc_bench::{LogProgress, MonotonicClock, PcBenchmark, Settings, run_all};
use tracing_subscriber::EnvFilter;

const ITERATIONS: u64 = 100_000;
const CHANNEL_CAPACITY: usize = 256;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::builder()
        .iterations(ITERATIONS)
        .pc_range(1..=4, 1..=1)
        .build()
        .expect("hardcoded settings are valid");

    let mut benchmark = PcBenchmark::new("mpsc", settings)
        .shared_state(|_| {
            let (tx, rx) = mpsc::sync_channel::<[u8; 16]>(CHANNEL_CAPACITY);
            (tx, Mutex::new(rx))
        })
        .producer(|ctx| {
            let (tx, _) = ctx.shared();
            let payload = [u8::try_from(ctx.thread_index()).unwrap_or(u8::MAX); 16];

            for _ in 0..ctx.iterations() {
                tx.send(payload)?;
            }
            Ok(())
        })
        .consumer(|ctx| {
            let (_, rx) = ctx.shared();
            let rx = rx.lock();

            for _ in 0..ctx.iterations() {
                let payload = rx.recv()?;
                ctx.add_items(1);
                ctx.add_bytes(mem::size_of_val(&payload) as u64);
            }
            Ok(())
        });

    run_all(&mut benchmark, &MonotonicClock::new(), &mut LogProgress::new())
        .expect("launch indexes come from the benchmark itself");

    println!();
    println!("{:<28} {:>16} {:>16}", "configuration", "items/s", "bytes/s");

    for result in benchmark.results() {
        println!(
            "{:<28} {:>16.0} {:>16.0}",
            result.configuration().to_string(),
            result.items_per_second().unwrap_or_default(),
            result.bytes_per_second().unwrap_or_default()
        );
    }
}
