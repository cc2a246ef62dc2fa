#![cfg(any(test, feature = "criterion"))]

use std::num::NonZero;
use std::time::Duration;

use criterion::BenchmarkGroup;
use criterion::measurement::WallTime;

use crate::{Configuration, Context, HookResult, MonotonicClock, PcBenchmark};

impl<S, F, P, C> PcBenchmark<S, F, P, C>
where
    S: Sync,
    F: Fn(&Configuration) -> S,
    P: Fn(&mut Context<'_, S>) -> HookResult + Sync,
    C: Fn(&mut Context<'_, S>) -> HookResult + Sync,
{
    /// Registers one Criterion benchmark function per configuration of this benchmark in the
    /// given group, named after the configuration (e.g. "2 producers, 1 consumers").
    ///
    /// The number of iterations is determined by Criterion and each configuration is launched
    /// as many times as Criterion decides is appropriate to collect the desired data. The
    /// iteration count from the benchmark's settings is not used and the results are not
    /// recorded in the benchmark.
    ///
    /// # Panics
    ///
    /// Panics if a launch fails, as Criterion has no way to record a failed measurement.
    #[cfg_attr(test, mutants::skip)] // Criterion drives this, not something to assert on.
    pub fn execute_criterion_on(&self, group: &mut BenchmarkGroup<'_, WallTime>) {
        let clock = MonotonicClock::new();

        for &configuration in self.settings().configurations() {
            group.bench_function(configuration.to_string(), |b| {
                b.iter_custom(|iters| {
                    let Some(iterations) = NonZero::new(iters) else {
                        return Duration::ZERO;
                    };

                    let result = self.measure(configuration, iterations, &clock);

                    if let Some(failure) = result.failure() {
                        panic!("{} failed with {configuration}: {failure}", self.name());
                    }

                    result.elapsed()
                });
            });
        }
    }
}
