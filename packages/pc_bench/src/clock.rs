use std::fmt::Debug;
use std::time::Instant;

/// A source of timestamps used to bracket the measured region of a launch.
///
/// The launcher reads the clock exactly twice per launch, both times on the thread that drives
/// the launch: once right after every benchmark thread has been released to start, and once
/// right after the last of them has finished. Benchmark threads never read the clock.
///
/// The real implementation is [`MonotonicClock`]. Tests can supply a clock that returns
/// predetermined instants to make the reported durations deterministic.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Debug + Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// A [`Clock`] backed by the operating system's monotonic clock.
#[derive(Clone, Copy, Debug, Default)]
#[non_exhaustive]
pub struct MonotonicClock;

impl MonotonicClock {
    /// Creates a new monotonic clock.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[cfg_attr(test, mutants::skip)] // Real time is not something tests can set expectations on.
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use static_assertions::assert_obj_safe;

    use super::*;

    assert_obj_safe!(Clock);

    #[test]
    fn monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();

        let first = clock.now();
        let second = clock.now();

        assert!(second >= first);
        assert!(second.duration_since(first) < Duration::from_secs(10));
    }

    #[test]
    fn mock_clock_returns_programmed_instants() {
        let base = Instant::now();

        let mut clock = MockClock::new();
        clock.expect_now().return_const(base);

        assert_eq!(clock.now(), base);
    }
}
