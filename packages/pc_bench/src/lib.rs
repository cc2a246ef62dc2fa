//! Producer/consumer benchmark engine for measuring concurrent data structures.
//!
//! This package measures how a pair of producer and consumer routines performs when executed
//! on many threads at once, across a matrix of producer and consumer thread counts. It is meant
//! for benchmarking queues, channels and similar hand-off mechanisms, where the interesting
//! question is how throughput changes as the number of threads on either side grows.
//!
//! The core functionality includes:
//! - [`Settings`] - The iteration count and the producer/consumer thread count matrix
//! - [`PcBenchmark`] - A named pair of producer and consumer hooks plus optional shared state
//! - [`Context`] - What a hook knows about the thread it runs on and the launch it belongs to
//! - [`Launcher`] - The execution contract a driver uses to perform launches one by one
//! - [`LaunchResult`] - The timing and throughput measured for one launch
//!
//! This package is not meant for use in production, serving only as a development tool for
//! benchmarking and performance analysis.
//!
//! # Operating Principles
//!
//! ## Launches
//!
//! A benchmark is executed once per producer/consumer configuration in its settings. Each such
//! execution is a launch. A launch creates the shared state, starts one fresh thread per
//! producer and per consumer, and runs the hook of the thread's role once on every thread.
//! Launches are strictly sequential and never share threads or state.
//!
//! ## Iterations
//!
//! The iteration count in the settings is the total for each role. It is split evenly between
//! the threads of the role, with any remainder going to the lowest-indexed threads, so the
//! producers together produce exactly as many iterations as the consumers together consume.
//!
//! ## Measurement Timing
//!
//! All threads of a launch wait at a start gate until every one of them exists. The clock is
//! read when the gate opens and again when the last thread finishes its hook. Thread creation,
//! shared state construction and thread teardown are not measured.
//!
//! ## Failures
//!
//! A hook that returns an error or panics fails the launch it belongs to, not the benchmark.
//! The failure is recorded in that launch's [`LaunchResult`] and the driver proceeds with the
//! next launch.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! use pc_bench::{LogProgress, MonotonicClock, PcBenchmark, Settings, run_all};
//!
//! let settings = Settings::builder()
//!     .iterations(10_000)
//!     .pc_doubling(4, 4)
//!     .build()
//!     .unwrap();
//!
//! let mut benchmark = PcBenchmark::new("atomic_counter", settings)
//!     .shared_state(|_configuration| AtomicU64::new(0))
//!     .producer(|ctx| {
//!         for _ in 0..ctx.iterations() {
//!             ctx.shared().fetch_add(1, Ordering::Relaxed);
//!         }
//!         Ok(())
//!     })
//!     .consumer(|ctx| {
//!         for _ in 0..ctx.iterations() {
//!             ctx.shared().fetch_sub(1, Ordering::Relaxed);
//!         }
//!         Ok(())
//!     });
//!
//! run_all(&mut benchmark, &MonotonicClock::new(), &mut LogProgress::new()).unwrap();
//!
//! for result in benchmark.results() {
//!     println!("{}: {:?}", result.configuration(), result.elapsed());
//! }
//! ```

mod benchmark;
mod clock;
mod context;
mod error;
mod launch;
mod launcher;
mod progress;
mod result;
mod run_criterion;
mod settings;

// This is in a separate module because 99% of the time the user never needs to name
// these types, so it makes sense to de-emphasize them in the API documentation.
pub mod configure;

pub use benchmark::*;
pub use clock::*;
pub use context::*;
pub use error::*;
pub use launcher::*;
pub use progress::*;
pub use result::*;
pub use settings::*;
