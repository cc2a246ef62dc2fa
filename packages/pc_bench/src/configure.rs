//! Intermediate stages of configuring a producer/consumer benchmark.
//!
//! You generally do not need to reference these types, they are just parts of a call chain.

use std::marker::PhantomData;

use crate::{Configuration, Context, HookResult, PcBenchmark, Settings};

/// Shared state factory used when the benchmark does not configure one.
pub type NoSharedState = fn(&Configuration);

/// The first stage of configuring a benchmark, with no callbacks known yet.
#[derive(Debug)]
#[must_use]
pub struct PcBenchmarkInitial {
    name: String,
    settings: Settings,
}

/// The second stage of configuring a benchmark, with the shared state type known.
#[derive(derive_more::Debug)]
#[must_use]
pub struct PcBenchmarkWithState<S, F> {
    name: String,
    settings: Settings,

    #[debug(ignore)]
    shared_state_fn: F,

    #[debug(ignore)]
    _shared: PhantomData<fn() -> S>,
}

/// The third stage of configuring a benchmark, with the producer hook known.
#[derive(derive_more::Debug)]
#[must_use]
pub struct PcBenchmarkWithProducer<S, F, P> {
    name: String,
    settings: Settings,

    #[debug(ignore)]
    shared_state_fn: F,
    #[debug(ignore)]
    producer_fn: P,

    #[debug(ignore)]
    _shared: PhantomData<fn() -> S>,
}

impl PcBenchmarkInitial {
    pub(crate) fn new(name: String, settings: Settings) -> Self {
        Self { name, settings }
    }

    /// Sets the factory that creates the state shared by all producer and consumer threads
    /// of a launch, typically a queue or channel.
    ///
    /// The factory is called once per launch, before any thread of the launch is created.
    /// The state is dropped after every thread of the launch has been joined.
    ///
    /// **Builder Order**: This must be called before setting the hooks. If not called, the
    /// shared state is `()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::atomic::{AtomicU64, Ordering};
    ///
    /// use pc_bench::{PcBenchmark, Settings};
    ///
    /// let benchmark = PcBenchmark::new("counter", Settings::default())
    ///     .shared_state(|_configuration| AtomicU64::new(0))
    ///     .producer(|ctx| {
    ///         ctx.shared().fetch_add(ctx.iterations(), Ordering::Relaxed);
    ///         Ok(())
    ///     })
    ///     .consumer(|_ctx| Ok(()));
    /// ```
    #[cfg_attr(test, mutants::skip)] // All mutations are unviable - skip them to save time.
    pub fn shared_state<S, F>(self, f: F) -> PcBenchmarkWithState<S, F>
    where
        F: Fn(&Configuration) -> S,
    {
        PcBenchmarkWithState {
            name: self.name,
            settings: self.settings,
            shared_state_fn: f,
            _shared: PhantomData,
        }
    }

    /// Sets the hook executed once on every producer thread of every launch, for a benchmark
    /// without shared state.
    #[cfg_attr(test, mutants::skip)] // All mutations are unviable - skip them to save time.
    pub fn producer<P>(self, f: P) -> PcBenchmarkWithProducer<(), NoSharedState, P>
    where
        P: Fn(&mut Context<'_, ()>) -> HookResult + Sync,
    {
        self.shared_state::<(), NoSharedState>(|_| {}).producer(f)
    }
}

impl<S, F> PcBenchmarkWithState<S, F>
where
    F: Fn(&Configuration) -> S,
{
    /// Sets the hook executed once on every producer thread of every launch.
    ///
    /// The hook receives a [`Context`] describing the thread and must perform
    /// [`Context::iterations()`] iterations of producing work before returning.
    #[cfg_attr(test, mutants::skip)] // All mutations are unviable - skip them to save time.
    pub fn producer<P>(self, f: P) -> PcBenchmarkWithProducer<S, F, P>
    where
        P: Fn(&mut Context<'_, S>) -> HookResult + Sync,
    {
        PcBenchmarkWithProducer {
            name: self.name,
            settings: self.settings,
            shared_state_fn: self.shared_state_fn,
            producer_fn: f,
            _shared: PhantomData,
        }
    }
}

impl<S, F, P> PcBenchmarkWithProducer<S, F, P>
where
    F: Fn(&Configuration) -> S,
    P: Fn(&mut Context<'_, S>) -> HookResult + Sync,
{
    /// Sets the hook executed once on every consumer thread of every launch.
    ///
    /// This is the last configuration step. The returned benchmark is ready to be launched.
    #[cfg_attr(test, mutants::skip)] // All mutations are unviable - skip them to save time.
    pub fn consumer<C>(self, f: C) -> PcBenchmark<S, F, P, C>
    where
        C: Fn(&mut Context<'_, S>) -> HookResult + Sync,
    {
        PcBenchmark::from_parts(
            self.name,
            self.settings,
            self.shared_state_fn,
            self.producer_fn,
            f,
        )
    }
}
