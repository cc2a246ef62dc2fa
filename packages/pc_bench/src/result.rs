use std::time::Duration;

use crate::{Configuration, Error};

/// The outcome of one launch, i.e. of running a benchmark once under a single
/// producer/consumer configuration.
///
/// A result is created once per launch and never modified afterwards. A launch that failed
/// still produces a result, carrying the failure and whatever the threads that did succeed
/// managed to complete.
#[derive(Debug)]
#[must_use = "the reporting layer will typically need this information for its results"]
pub struct LaunchResult {
    configuration: Configuration,
    elapsed: Duration,
    produced_iterations: u64,
    consumed_iterations: u64,
    items: u64,
    bytes: u64,
    failure: Option<Error>,
}

impl LaunchResult {
    pub(crate) fn completed(
        configuration: Configuration,
        elapsed: Duration,
        produced_iterations: u64,
        consumed_iterations: u64,
        items: u64,
        bytes: u64,
    ) -> Self {
        Self {
            configuration,
            elapsed,
            produced_iterations,
            consumed_iterations,
            items,
            bytes,
            failure: None,
        }
    }

    pub(crate) fn aborted(configuration: Configuration, failure: Error) -> Self {
        Self::completed(configuration, Duration::ZERO, 0, 0, 0, 0).with_failure(failure)
    }

    /// Attaches a failure unless the result already carries one; the earliest failure wins.
    pub(crate) fn with_failure(self, failure: Error) -> Self {
        Self {
            failure: self.failure.or(Some(failure)),
            ..self
        }
    }

    /// The producer/consumer configuration this result belongs to.
    #[must_use]
    pub fn configuration(&self) -> Configuration {
        self.configuration
    }

    /// Time from the moment all threads were released to start until the moment the last
    /// thread (of either role) finished.
    ///
    /// This is zero if the launch was aborted before its threads were released.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Iterations assigned to producer threads whose hook completed successfully.
    #[must_use]
    pub fn produced_iterations(&self) -> u64 {
        self.produced_iterations
    }

    /// Iterations assigned to consumer threads whose hook completed successfully.
    #[must_use]
    pub fn consumed_iterations(&self) -> u64 {
        self.consumed_iterations
    }

    /// Iterations that were both produced and consumed.
    ///
    /// For a successful launch this equals the configured iteration count.
    #[must_use]
    pub fn total_iterations_completed(&self) -> u64 {
        self.produced_iterations.min(self.consumed_iterations)
    }

    /// Items reported by all threads via [`Context::add_items()`](crate::Context::add_items).
    #[must_use]
    pub fn items(&self) -> u64 {
        self.items
    }

    /// Bytes reported by all threads via [`Context::add_bytes()`](crate::Context::add_bytes).
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Whether the launch failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// The failure that ended the launch, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    /// Throughput in items per second.
    ///
    /// Uses the items reported by the hooks if any were reported, otherwise the number of
    /// completed iterations. Returns `None` if no time elapsed.
    #[must_use]
    pub fn items_per_second(&self) -> Option<f64> {
        let units = if self.items > 0 {
            self.items
        } else {
            self.total_iterations_completed()
        };

        per_second(units, self.elapsed)
    }

    /// Throughput in bytes per second, based on the bytes reported by the hooks.
    ///
    /// Returns `None` if no time elapsed.
    #[must_use]
    pub fn bytes_per_second(&self) -> Option<f64> {
        per_second(self.bytes, self.elapsed)
    }

    /// Mean time per completed iteration, or `None` if no iteration was completed.
    #[must_use]
    pub fn mean_iteration_duration(&self) -> Option<Duration> {
        let nanos = self
            .elapsed
            .as_nanos()
            .checked_div(u128::from(self.total_iterations_completed()))?;

        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "throughput is reported as an approximation, precision loss is acceptable"
)]
fn per_second(units: u64, elapsed: Duration) -> Option<f64> {
    if elapsed.is_zero() {
        return None;
    }

    Some(units as f64 / elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp, reason = "test values are exactly representable")]

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::Role;

    assert_impl_all!(LaunchResult: Send, Sync);

    fn configuration() -> Configuration {
        Configuration::new(2, 2).unwrap()
    }

    #[test]
    fn completed_result_reports_everything() {
        let result = LaunchResult::completed(
            configuration(),
            Duration::from_secs(2),
            100,
            100,
            50,
            4096,
        );

        assert_eq!(result.configuration(), configuration());
        assert_eq!(result.elapsed(), Duration::from_secs(2));
        assert_eq!(result.total_iterations_completed(), 100);
        assert!(!result.is_failed());
        assert!(result.failure().is_none());
        assert_eq!(result.items_per_second(), Some(25.0));
        assert_eq!(result.bytes_per_second(), Some(2048.0));
        assert_eq!(
            result.mean_iteration_duration(),
            Some(Duration::from_millis(20))
        );
    }

    #[test]
    fn items_fall_back_to_iterations() {
        let result =
            LaunchResult::completed(configuration(), Duration::from_secs(4), 8, 8, 0, 0);

        assert_eq!(result.items_per_second(), Some(2.0));
    }

    #[test]
    fn completed_iterations_is_min_of_roles() {
        let result =
            LaunchResult::completed(configuration(), Duration::from_secs(1), 100, 50, 0, 0)
                .with_failure(Error::LaunchFailure {
                    role: Role::Consumer,
                    thread_index: 1,
                    message: "boom".to_string(),
                });

        assert_eq!(result.produced_iterations(), 100);
        assert_eq!(result.consumed_iterations(), 50);
        assert_eq!(result.total_iterations_completed(), 50);
        assert!(result.is_failed());
        assert!(matches!(
            result.failure(),
            Some(Error::LaunchFailure { thread_index: 1, .. })
        ));
    }

    #[test]
    fn first_failure_is_kept() {
        let result = LaunchResult::completed(configuration(), Duration::from_secs(1), 1, 1, 0, 0)
            .with_failure(Error::LaunchFailure {
                role: Role::Producer,
                thread_index: 0,
                message: "first".to_string(),
            })
            .with_failure(Error::LaunchFailure {
                role: Role::Consumer,
                thread_index: 0,
                message: "second".to_string(),
            });

        assert!(matches!(
            result.failure(),
            Some(Error::LaunchFailure { message, .. }) if message == "first"
        ));
    }

    #[test]
    fn aborted_result_has_no_measurements() {
        let result = LaunchResult::aborted(
            configuration(),
            Error::ThreadCreationFailure {
                role: Role::Producer,
                thread_index: 1,
                source: std::io::Error::other("no more threads"),
            },
        );

        assert!(result.is_failed());
        assert_eq!(result.elapsed(), Duration::ZERO);
        assert_eq!(result.total_iterations_completed(), 0);
        assert_eq!(result.items_per_second(), None);
        assert_eq!(result.bytes_per_second(), None);
        assert_eq!(result.mean_iteration_duration(), None);
    }
}
