use tracing::debug;

use crate::{Clock, ProgressHandler, Result};

/// The execution contract between a benchmark and the driver that runs it.
///
/// A benchmark consists of a fixed number of launches, each of which is executed by a separate
/// call to [`launch()`](Self::launch). The driver decides when each launch happens; launches
/// are never executed concurrently.
///
/// This trait is object-safe so a driver can hold benchmarks of different types together.
pub trait Launcher {
    /// The name of the benchmark, for reporting.
    fn name(&self) -> &str;

    /// How many launches the benchmark consists of.
    ///
    /// For a producer/consumer benchmark, this is the number of distinct configurations in its
    /// settings.
    fn count_launches(&self) -> usize;

    /// Performs launch number `current` (0-based) and reports it to `progress` together with
    /// the `total` number of launches the driver intends to perform.
    ///
    /// A failure of the benchmark code itself (a hook error or panic, or the operating system
    /// refusing to create threads) does not make this return an error. Such failures are
    /// recorded in the launch's result and reported to `progress` like any other result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LaunchIndexOutOfRange`](crate::Error::LaunchIndexOutOfRange) if
    /// `current` does not identify a launch of this benchmark.
    fn launch(
        &mut self,
        current: usize,
        total: usize,
        clock: &dyn Clock,
        progress: &mut dyn ProgressHandler,
    ) -> Result<()>;
}

/// Performs every launch of a benchmark, one after the other, in order.
///
/// # Errors
///
/// Returns an error if the benchmark rejects one of its own launch indexes, which indicates a
/// faulty [`Launcher`] implementation. Failures of individual launches are not errors here;
/// they are recorded in the results.
pub fn run_all(
    launcher: &mut dyn Launcher,
    clock: &dyn Clock,
    progress: &mut dyn ProgressHandler,
) -> Result<()> {
    let total = launcher.count_launches();

    debug!(benchmark = launcher.name(), total, "running all launches");

    for current in 0..total {
        launcher.launch(current, total, clock, progress)?;
    }

    Ok(())
}
