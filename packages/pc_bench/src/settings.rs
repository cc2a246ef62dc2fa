use std::iter;
use std::num::NonZero;
use std::ops::RangeInclusive;

use itertools::{Itertools, iproduct};
use num_integer::Integer;

use crate::{Error, Result};

/// One producer/consumer thread-count pair of a benchmark's configuration matrix.
///
/// Every configuration has at least one producer and at least one consumer.
///
/// # Examples
///
/// ```
/// use pc_bench::Configuration;
///
/// let configuration = Configuration::new(2, 4).unwrap();
/// assert_eq!(configuration.thread_count().get(), 6);
/// assert_eq!(configuration.to_string(), "2 producers, 4 consumers");
///
/// assert!(Configuration::new(0, 1).is_err());
/// ```
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[display("{producers} producers, {consumers} consumers")]
pub struct Configuration {
    producers: NonZero<usize>,
    consumers: NonZero<usize>,
}

impl Configuration {
    /// Creates a configuration with the given number of producer and consumer threads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if either count is zero.
    pub fn new(producers: usize, consumers: usize) -> Result<Self> {
        let (Some(producer_count), Some(consumer_count)) =
            (NonZero::new(producers), NonZero::new(consumers))
        else {
            return Err(Error::invalid_configuration(format!(
                "thread counts must be at least 1, got {producers} producers and {consumers} consumers"
            )));
        };

        Ok(Self::from_non_zero(producer_count, consumer_count))
    }

    /// Creates a configuration from counts that are already known to be non-zero.
    #[must_use]
    pub const fn from_non_zero(producers: NonZero<usize>, consumers: NonZero<usize>) -> Self {
        Self {
            producers,
            consumers,
        }
    }

    /// Number of producer threads.
    #[must_use]
    pub fn producers(&self) -> NonZero<usize> {
        self.producers
    }

    /// Number of consumer threads.
    #[must_use]
    pub fn consumers(&self) -> NonZero<usize> {
        self.consumers
    }

    /// Total number of threads (producers and consumers) started by one launch.
    #[must_use]
    pub fn thread_count(&self) -> NonZero<usize> {
        self.producers.saturating_add(self.consumers.get())
    }
}

/// Immutable settings of a producer/consumer benchmark.
///
/// The settings hold the iteration count, which is the same for every launch, and the ordered
/// list of distinct producer/consumer configurations the benchmark will be launched with.
///
/// Use [`Settings::builder()`] to create an instance. Cloning a `Settings` or converting it
/// back into a builder via [`to_builder()`](Self::to_builder) preserves everything configured
/// so far.
///
/// # Examples
///
/// ```
/// use pc_bench::Settings;
///
/// let settings = Settings::builder()
///     .iterations(100)
///     .pc(1, 1)
///     .pc(2, 2)
///     .build()
///     .unwrap();
///
/// assert_eq!(settings.iterations().get(), 100);
/// assert_eq!(settings.configurations().len(), 2);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    iterations: NonZero<u64>,
    configurations: Box<[Configuration]>,
    thread_stack_size: Option<NonZero<usize>>,
    warmup_launches: usize,
}

impl Settings {
    /// Starts configuring a new set of benchmark settings.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Creates a builder that starts from a copy of these settings.
    ///
    /// This is how a benchmark extends settings defined elsewhere with additional
    /// configurations without losing what was already there.
    pub fn to_builder(&self) -> SettingsBuilder {
        SettingsBuilder {
            iterations: self.iterations.get(),
            configurations: self.configurations.to_vec(),
            thread_stack_size: self.thread_stack_size.map(NonZero::get),
            warmup_launches: self.warmup_launches,
            problem: None,
        }
    }

    /// How many iterations each role performs per launch, summed over all threads of the role.
    #[must_use]
    pub fn iterations(&self) -> NonZero<u64> {
        self.iterations
    }

    /// The distinct configurations, in registration order.
    #[must_use]
    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    /// The stack size requested for benchmark threads, if any.
    #[must_use]
    pub fn thread_stack_size(&self) -> Option<NonZero<usize>> {
        self.thread_stack_size
    }

    /// How many untimed launches of a configuration precede its measured launch.
    ///
    /// Zero (the default) means every configuration is measured cold.
    #[must_use]
    pub fn warmup_launches(&self) -> usize {
        self.warmup_launches
    }

    /// Splits the iteration count between `thread_count` threads of one role.
    ///
    /// The split is as even as possible; the remainder goes one iteration each to the
    /// lowest-indexed threads. The yielded values always add up to [`iterations()`](Self::iterations)
    /// and differ from each other by at most 1. If there are more threads than iterations,
    /// the highest-indexed threads are assigned zero iterations.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZero;
    ///
    /// use pc_bench::Settings;
    ///
    /// let settings = Settings::builder().iterations(10).build().unwrap();
    /// let split: Vec<u64> = settings
    ///     .split_iterations(NonZero::new(3).unwrap())
    ///     .collect();
    ///
    /// assert_eq!(split, [4, 3, 3]);
    /// ```
    pub fn split_iterations(&self, thread_count: NonZero<usize>) -> impl Iterator<Item = u64> {
        split_evenly(self.iterations, thread_count)
    }
}

/// Splits `total` into `thread_count` parts differing by at most 1, larger parts first.
pub(crate) fn split_evenly(
    total: NonZero<u64>,
    thread_count: NonZero<usize>,
) -> impl Iterator<Item = u64> {
    let threads = u64::try_from(thread_count.get())
        .expect("thread counts beyond u64::MAX are impossible on any supported platform");

    let (per_thread, remainder) = total.get().div_rem(&threads);

    (0..threads).map(move |index| {
        if index < remainder {
            per_thread.saturating_add(1)
        } else {
            per_thread
        }
    })
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            iterations: NonZero::<u64>::MIN,
            configurations: Box::new([DEFAULT_CONFIGURATION]),
            thread_stack_size: None,
            warmup_launches: 0,
        }
    }
}

const DEFAULT_CONFIGURATION: Configuration =
    Configuration::from_non_zero(NonZero::<usize>::MIN, NonZero::<usize>::MIN);

/// Accumulates benchmark settings before they are validated by [`build()`](Self::build).
///
/// Problems found while adding configurations are remembered and the first one is reported
/// by `build()`, so calls can be chained without checking each step.
#[derive(Debug)]
#[must_use]
pub struct SettingsBuilder {
    iterations: u64,
    configurations: Vec<Configuration>,
    thread_stack_size: Option<usize>,
    warmup_launches: usize,
    problem: Option<Error>,
}

impl SettingsBuilder {
    fn new() -> Self {
        Self {
            iterations: 1,
            configurations: Vec::new(),
            thread_stack_size: None,
            warmup_launches: 0,
            problem: None,
        }
    }

    /// Sets the number of iterations each role performs per launch. Defaults to 1.
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Requests a specific stack size (in bytes) for every benchmark thread.
    ///
    /// If not set, the platform default for new threads is used.
    pub fn thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = Some(bytes);
        self
    }

    /// Sets how many untimed launches of each configuration are performed right before its
    /// measured launch, with the same thread counts and iterations. Defaults to 0.
    ///
    /// Warm-up launches let caches, allocators and the scheduler settle. Their results are
    /// discarded unless one of them fails, in which case the failure is reported in place of
    /// the measured launch.
    pub fn warmup(mut self, launches: usize) -> Self {
        self.warmup_launches = launches;
        self
    }

    /// Adds one configuration with the given number of producer and consumer threads.
    pub fn pc(mut self, producers: usize, consumers: usize) -> Self {
        self.push(producers, consumers);
        self
    }

    /// Adds every combination of the given producer and consumer counts, producer-major.
    ///
    /// # Examples
    ///
    /// ```
    /// use pc_bench::Settings;
    ///
    /// let settings = Settings::builder().pc_range(1..=2, 1..=3).build().unwrap();
    ///
    /// assert_eq!(settings.configurations().len(), 6);
    /// ```
    pub fn pc_range(
        mut self,
        producers: RangeInclusive<usize>,
        consumers: RangeInclusive<usize>,
    ) -> Self {
        if producers.is_empty() || consumers.is_empty() {
            self.record_problem(Error::invalid_configuration(format!(
                "thread count ranges must not be empty, got producers {producers:?} and consumers {consumers:?}"
            )));
            return self;
        }

        for (producer_count, consumer_count) in iproduct!(producers, consumers) {
            self.push(producer_count, consumer_count);
        }

        self
    }

    /// Adds every combination of 1, 2, 4, ... producers and consumers up to the given
    /// maximums. Each maximum is itself included even if it is not a power of two.
    ///
    /// # Examples
    ///
    /// ```
    /// use pc_bench::{Configuration, Settings};
    ///
    /// let settings = Settings::builder().pc_doubling(3, 1).build().unwrap();
    ///
    /// assert_eq!(
    ///     settings.configurations(),
    ///     [
    ///         Configuration::new(1, 1).unwrap(),
    ///         Configuration::new(2, 1).unwrap(),
    ///         Configuration::new(3, 1).unwrap(),
    ///     ]
    /// );
    /// ```
    pub fn pc_doubling(mut self, max_producers: usize, max_consumers: usize) -> Self {
        if max_producers == 0 || max_consumers == 0 {
            self.record_problem(Error::invalid_configuration(format!(
                "thread count maximums must be at least 1, got {max_producers} producers and {max_consumers} consumers"
            )));
            return self;
        }

        for (producer_count, consumer_count) in
            iproduct!(doubling_up_to(max_producers), doubling_up_to(max_consumers))
        {
            self.push(producer_count, consumer_count);
        }

        self
    }

    /// Validates the accumulated settings.
    ///
    /// Duplicate configurations are collapsed into the first one registered. If no
    /// configuration was added, the settings contain the single configuration of one producer
    /// and one consumer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] describing the first problem encountered, such
    /// as a zero thread count, an empty range or a zero iteration count.
    pub fn build(self) -> Result<Settings> {
        if let Some(problem) = self.problem {
            return Err(problem);
        }

        let iterations = NonZero::new(self.iterations)
            .ok_or_else(|| Error::invalid_configuration("iteration count must be at least 1"))?;

        let thread_stack_size = match self.thread_stack_size {
            Some(bytes) => Some(NonZero::new(bytes).ok_or_else(|| {
                Error::invalid_configuration("thread stack size must be at least 1 byte")
            })?),
            None => None,
        };

        let configurations: Box<[Configuration]> = if self.configurations.is_empty() {
            Box::new([DEFAULT_CONFIGURATION])
        } else {
            self.configurations.into_iter().unique().collect()
        };

        Ok(Settings {
            iterations,
            configurations,
            thread_stack_size,
            warmup_launches: self.warmup_launches,
        })
    }

    fn push(&mut self, producers: usize, consumers: usize) {
        match Configuration::new(producers, consumers) {
            Ok(configuration) => self.configurations.push(configuration),
            Err(problem) => self.record_problem(problem),
        }
    }

    fn record_problem(&mut self, problem: Error) {
        // Only the first problem is reported; later ones are often a consequence of it.
        if self.problem.is_none() {
            self.problem = Some(problem);
        }
    }
}

fn doubling_up_to(max: usize) -> impl Iterator<Item = usize> + Clone {
    iter::successors(Some(1_usize), |n| n.checked_mul(2))
        .take_while(move |n| *n < max)
        .chain(iter::once(max))
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Settings: Send, Sync, Clone);
    assert_impl_all!(Configuration: Send, Sync, Copy);

    fn pair(producers: usize, consumers: usize) -> Configuration {
        Configuration::new(producers, consumers).unwrap()
    }

    #[test]
    fn default_is_single_pair_single_iteration() {
        let settings = Settings::default();

        assert_eq!(settings.iterations().get(), 1);
        assert_eq!(settings.configurations(), [pair(1, 1)]);
        assert_eq!(settings.thread_stack_size(), None);
        assert_eq!(settings.warmup_launches(), 0);
    }

    #[test]
    fn empty_builder_matches_default() {
        assert_eq!(Settings::builder().build().unwrap(), Settings::default());
    }

    #[test]
    fn configurations_keep_registration_order() {
        let settings = Settings::builder()
            .iterations(100)
            .pc(4, 1)
            .pc(1, 1)
            .pc(2, 2)
            .build()
            .unwrap();

        assert_eq!(
            settings.configurations(),
            [pair(4, 1), pair(1, 1), pair(2, 2)]
        );
    }

    #[test]
    fn zero_producers_rejected() {
        let result = Settings::builder().pc(0, 1).build();

        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    fn zero_consumers_rejected_even_after_valid_pairs() {
        let result = Settings::builder().pc(1, 1).pc(3, 0).pc(2, 2).build();

        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    fn zero_iterations_rejected() {
        let result = Settings::builder().iterations(0).pc(1, 1).build();

        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    fn zero_stack_size_rejected() {
        let result = Settings::builder().thread_stack_size(0).build();

        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    fn first_problem_is_reported() {
        let Err(Error::InvalidConfiguration { problem }) =
            Settings::builder().pc(0, 5).pc(7, 0).build()
        else {
            panic!("expected invalid configuration");
        };

        assert!(problem.contains("0 producers"), "{problem}");
    }

    #[test]
    fn duplicates_collapse_to_first_position() {
        let settings = Settings::builder()
            .pc(2, 2)
            .pc(1, 1)
            .pc(2, 2)
            .pc(1, 1)
            .build()
            .unwrap();

        assert_eq!(settings.configurations(), [pair(2, 2), pair(1, 1)]);
    }

    #[test]
    fn range_is_producer_major_cross_product() {
        let settings = Settings::builder().pc_range(1..=2, 3..=4).build().unwrap();

        assert_eq!(
            settings.configurations(),
            [pair(1, 3), pair(1, 4), pair(2, 3), pair(2, 4)]
        );
    }

    #[test]
    fn range_including_zero_rejected() {
        let result = Settings::builder().pc_range(0..=2, 1..=1).build();

        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    #[allow(
        clippy::reversed_empty_ranges,
        reason = "testing that empty ranges are rejected"
    )]
    fn empty_range_rejected() {
        let result = Settings::builder().pc_range(3..=1, 1..=1).build();

        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    fn doubling_includes_maximum() {
        let settings = Settings::builder().pc_doubling(6, 2).build().unwrap();

        assert_eq!(
            settings.configurations(),
            [
                pair(1, 1),
                pair(1, 2),
                pair(2, 1),
                pair(2, 2),
                pair(4, 1),
                pair(4, 2),
                pair(6, 1),
                pair(6, 2),
            ]
        );
    }

    #[test]
    fn doubling_zero_rejected() {
        let result = Settings::builder().pc_doubling(4, 0).build();

        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    fn to_builder_preserves_and_extends() {
        let base = Settings::builder()
            .iterations(50)
            .thread_stack_size(1 << 20)
            .warmup(3)
            .pc(1, 1)
            .build()
            .unwrap();

        let extended = base.to_builder().pc(2, 1).build().unwrap();

        assert_eq!(extended.iterations().get(), 50);
        assert_eq!(extended.thread_stack_size().map(NonZero::get), Some(1 << 20));
        assert_eq!(extended.warmup_launches(), 3);
        assert_eq!(extended.configurations(), [pair(1, 1), pair(2, 1)]);

        // The source settings are untouched.
        assert_eq!(base.configurations(), [pair(1, 1)]);
    }

    #[test]
    fn split_is_even_with_remainder_to_low_indexes() {
        let settings = Settings::builder().iterations(11).build().unwrap();

        let split: Vec<_> = settings.split_iterations(NonZero::new(4).unwrap()).collect();

        assert_eq!(split, [3, 3, 3, 2]);
    }

    #[test]
    fn split_conserves_total_and_differs_by_at_most_one() {
        for iterations in [1_u64, 2, 7, 100, 1001] {
            let settings = Settings::builder().iterations(iterations).build().unwrap();

            for threads in 1..=9 {
                let split: Vec<_> = settings
                    .split_iterations(NonZero::new(threads).unwrap())
                    .collect();

                assert_eq!(split.len(), threads);
                assert_eq!(split.iter().sum::<u64>(), iterations);

                let max = split.iter().max().unwrap();
                let min = split.iter().min().unwrap();
                assert!(max - min <= 1, "{iterations} over {threads}: {split:?}");
            }
        }
    }

    #[test]
    fn split_with_more_threads_than_iterations() {
        let settings = Settings::builder().iterations(2).build().unwrap();

        let split: Vec<_> = settings.split_iterations(NonZero::new(5).unwrap()).collect();

        assert_eq!(split, [1, 1, 0, 0, 0]);
    }

    #[test]
    fn configuration_thread_count_and_display() {
        let configuration = pair(3, 5);

        assert_eq!(configuration.producers().get(), 3);
        assert_eq!(configuration.consumers().get(), 5);
        assert_eq!(configuration.thread_count().get(), 8);
        assert_eq!(configuration.to_string(), "3 producers, 5 consumers");
    }
}
