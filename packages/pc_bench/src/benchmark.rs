use std::marker::PhantomData;
use std::mem;
use std::num::NonZero;

use tracing::debug;

use crate::configure::PcBenchmarkInitial;
use crate::launch::{self, LaunchPlan};
use crate::{
    Clock, Configuration, Context, Error, HookResult, LaunchResult, Launcher, MonotonicClock,
    ProgressHandler, Result, Settings,
};

/// A producer/consumer benchmark: a pair of hooks that are executed on a matrix of producer and
/// consumer thread counts, with every configuration timed as a whole.
///
/// For every configuration in the [`Settings`], one launch is performed. A launch creates the
/// shared state, starts one fresh thread per producer and per consumer, runs the producer hook
/// once on every producer thread and the consumer hook once on every consumer thread, and
/// measures the time from the moment all threads are released until the last one finishes.
///
/// Launches are strictly sequential: the threads and the shared state of one launch are gone
/// before the next launch starts.
///
/// A benchmark is driven through the [`Launcher`] trait, usually via [`crate::run_all()`].
/// Results accumulate in the benchmark and can be inspected afterwards via
/// [`results()`](Self::results).
///
/// # Examples
///
/// ```
/// use std::sync::mpsc;
///
/// use parking_lot::Mutex;
/// use pc_bench::{MonotonicClock, NoProgress, PcBenchmark, Settings, run_all};
///
/// let settings = Settings::builder()
///     .iterations(1000)
///     .pc(1, 1)
///     .build()
///     .unwrap();
///
/// let mut benchmark = PcBenchmark::new("mpsc", settings)
///     .shared_state(|_| {
///         let (tx, rx) = mpsc::sync_channel::<u64>(64);
///         (tx, Mutex::new(rx))
///     })
///     .producer(|ctx| {
///         let (tx, _) = ctx.shared();
///         for i in 0..ctx.iterations() {
///             tx.send(i)?;
///         }
///         Ok(())
///     })
///     .consumer(|ctx| {
///         let (_, rx) = ctx.shared();
///         let rx = rx.lock();
///         for _ in 0..ctx.iterations() {
///             rx.recv()?;
///             ctx.add_items(1);
///         }
///         Ok(())
///     });
///
/// run_all(&mut benchmark, &MonotonicClock::new(), &mut NoProgress::new()).unwrap();
///
/// let result = &benchmark.results()[0];
/// assert!(!result.is_failed());
/// assert_eq!(result.items(), 1000);
/// ```
#[derive(derive_more::Debug)]
pub struct PcBenchmark<S, F, P, C> {
    name: String,
    settings: Settings,

    #[debug(ignore)]
    shared_state_fn: F,
    #[debug(ignore)]
    producer_fn: P,
    #[debug(ignore)]
    consumer_fn: C,

    results: Vec<LaunchResult>,

    #[debug(ignore)]
    _shared: PhantomData<fn() -> S>,
}

impl PcBenchmark<(), (), (), ()> {
    /// Creates a new benchmark with the given name and settings and starts the process of
    /// configuring it.
    ///
    /// # Order of operations
    ///
    /// 1. Start with `PcBenchmark::new()`.
    /// 2. Optionally set the shared state factory with
    ///    [`shared_state()`](crate::configure::PcBenchmarkInitial::shared_state).
    /// 3. **Required**: Set the producer hook with `producer()`.
    /// 4. **Required**: Set the consumer hook with `consumer()`.
    ///
    /// You can skip the optional step but cannot go back in the sequence.
    #[expect(
        clippy::new_ret_no_self,
        reason = "builder-style configuration pattern, intentional"
    )]
    pub fn new(name: impl Into<String>, settings: Settings) -> PcBenchmarkInitial {
        PcBenchmarkInitial::new(name.into(), settings)
    }
}

impl<S, F, P, C> PcBenchmark<S, F, P, C> {
    pub(crate) fn from_parts(
        name: String,
        settings: Settings,
        shared_state_fn: F,
        producer_fn: P,
        consumer_fn: C,
    ) -> Self {
        let results = Vec::with_capacity(settings.configurations().len());

        Self {
            name,
            settings,
            shared_state_fn,
            producer_fn,
            consumer_fn,
            results,
            _shared: PhantomData,
        }
    }

    /// The name the benchmark was created with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The settings the benchmark was created with.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The results of the launches performed so far, in the order they were performed.
    #[must_use]
    pub fn results(&self) -> &[LaunchResult] {
        &self.results
    }

    /// Removes and returns the results of the launches performed so far.
    #[must_use]
    pub fn take_results(&mut self) -> Vec<LaunchResult> {
        mem::take(&mut self.results)
    }
}

impl<S, F, P, C> PcBenchmark<S, F, P, C>
where
    S: Sync,
    F: Fn(&Configuration) -> S,
    P: Fn(&mut Context<'_, S>) -> HookResult + Sync,
    C: Fn(&mut Context<'_, S>) -> HookResult + Sync,
{
    /// Performs one launch of an arbitrary configuration with an arbitrary iteration count,
    /// without recording the result in the benchmark.
    ///
    /// This is the building block for integration with benchmark frameworks that decide the
    /// iteration count themselves.
    pub fn measure(
        &self,
        configuration: Configuration,
        iterations: NonZero<u64>,
        clock: &dyn Clock,
    ) -> LaunchResult {
        self.execute(configuration, iterations, clock)
    }

    /// Performs the warm-up launches of a configuration, discarding their results.
    ///
    /// Returns the result of the first warm-up launch that failed, if any. A configuration
    /// that cannot even warm up is not measured.
    fn warm_up(&self, configuration: Configuration) -> Option<LaunchResult> {
        let warmup_launches = self.settings.warmup_launches();

        if warmup_launches > 0 {
            debug!(%configuration, warmup_launches, "warming up");
        }

        // Warm-up timings are discarded, so they never touch the caller's clock.
        let clock = MonotonicClock::new();

        (0..warmup_launches)
            .map(|_| self.execute(configuration, self.settings.iterations(), &clock))
            .find(LaunchResult::is_failed)
    }

    fn execute(
        &self,
        configuration: Configuration,
        iterations: NonZero<u64>,
        clock: &dyn Clock,
    ) -> LaunchResult {
        let plan = LaunchPlan {
            configuration,
            iterations,
            thread_stack_size: self.settings.thread_stack_size(),
        };

        launch::execute(
            plan,
            &self.shared_state_fn,
            &self.producer_fn,
            &self.consumer_fn,
            clock,
        )
    }
}

impl<S, F, P, C> Launcher for PcBenchmark<S, F, P, C>
where
    S: Sync,
    F: Fn(&Configuration) -> S,
    P: Fn(&mut Context<'_, S>) -> HookResult + Sync,
    C: Fn(&mut Context<'_, S>) -> HookResult + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn count_launches(&self) -> usize {
        self.settings.configurations().len()
    }

    fn launch(
        &mut self,
        current: usize,
        total: usize,
        clock: &dyn Clock,
        progress: &mut dyn ProgressHandler,
    ) -> Result<()> {
        let configurations = self.settings.configurations();

        let configuration =
            *configurations
                .get(current)
                .ok_or_else(|| Error::LaunchIndexOutOfRange {
                    index: current,
                    count: configurations.len(),
                })?;

        let result = match self.warm_up(configuration) {
            Some(failed_warmup) => failed_warmup,
            None => self.execute(configuration, self.settings.iterations(), clock),
        };

        progress.on_launch_complete(current, total, &result);
        self.results.push(result);

        Ok(())
    }
}
