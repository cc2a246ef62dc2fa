use tracing::{info, warn};

use crate::LaunchResult;

/// Receives a notification every time a launch completes, successfully or not.
///
/// The driver of a benchmark uses this to report progress and to hand each [`LaunchResult`]
/// over to whatever reporting layer it uses.
///
/// Closures of the form `FnMut(usize, usize, &LaunchResult)` implement this trait.
///
/// # Examples
///
/// ```
/// use pc_bench::{LaunchResult, ProgressHandler};
///
/// let mut seen = Vec::new();
/// let mut handler = |current: usize, total: usize, _result: &LaunchResult| {
///     seen.push((current, total));
/// };
///
/// fn accepts_handler(_: &mut dyn ProgressHandler) {}
/// accepts_handler(&mut handler);
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ProgressHandler {
    /// Called after launch `current` (0-based) out of `total` launches has finished.
    fn on_launch_complete(&mut self, current: usize, total: usize, result: &LaunchResult);
}

impl<F> ProgressHandler for F
where
    F: FnMut(usize, usize, &LaunchResult),
{
    fn on_launch_complete(&mut self, current: usize, total: usize, result: &LaunchResult) {
        self(current, total, result);
    }
}

/// A [`ProgressHandler`] that ignores all notifications.
#[derive(Clone, Copy, Debug, Default)]
#[non_exhaustive]
pub struct NoProgress;

impl NoProgress {
    /// Creates a handler that ignores all notifications.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ProgressHandler for NoProgress {
    #[cfg_attr(test, mutants::skip)] // Nothing to observe.
    fn on_launch_complete(&mut self, _current: usize, _total: usize, _result: &LaunchResult) {}
}

/// A [`ProgressHandler`] that emits one `tracing` event per completed launch.
///
/// Successful launches are logged at `info` level, failed launches at `warn` level.
#[derive(Clone, Copy, Debug, Default)]
#[non_exhaustive]
pub struct LogProgress;

impl LogProgress {
    /// Creates a handler that logs every completed launch.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ProgressHandler for LogProgress {
    #[cfg_attr(test, mutants::skip)] // Log output is not asserted on.
    fn on_launch_complete(&mut self, current: usize, total: usize, result: &LaunchResult) {
        let launch = current.saturating_add(1);
        let configuration = result.configuration();

        match result.failure() {
            Some(failure) => warn!(
                launch,
                total,
                %configuration,
                %failure,
                "launch failed"
            ),
            None => info!(
                launch,
                total,
                %configuration,
                elapsed = ?result.elapsed(),
                iterations = result.total_iterations_completed(),
                "launch completed"
            ),
        }
    }
}
