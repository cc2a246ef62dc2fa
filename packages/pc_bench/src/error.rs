use std::io;

use thiserror::Error;

use crate::Role;

/// Errors that can occur when configuring or launching a producer/consumer benchmark.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The benchmark settings were rejected. A benchmark with invalid settings is never
    /// scheduled for execution.
    #[error("invalid configuration: {problem}")]
    InvalidConfiguration {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// A producer or consumer hook reported an error or panicked during a launch.
    ///
    /// This is recorded against the failing configuration's result. Other configurations
    /// of the same benchmark still run.
    #[error("{role} thread {thread_index} failed: {message}")]
    LaunchFailure {
        /// The role of the thread whose hook failed.
        role: Role,

        /// The index of the failing thread within its role.
        thread_index: usize,

        /// The error or panic message produced by the hook.
        message: String,
    },

    /// Creating or releasing the state shared by the threads of a launch panicked.
    ///
    /// If creation panicked, no thread of the launch was started. Other configurations of
    /// the same benchmark still run.
    #[error("shared state {stage} failed: {message}")]
    SharedStateFailure {
        /// Whether the state was being created or dropped.
        stage: SharedStateStage,

        /// The panic message.
        message: String,
    },

    /// The operating system refused to create a thread for a launch.
    ///
    /// Threads already created for the same launch are released and joined before this
    /// is reported.
    #[error("failed to create {role} thread {thread_index}: {source}")]
    ThreadCreationFailure {
        /// The role of the thread that could not be created.
        role: Role,

        /// The index of the thread that could not be created.
        thread_index: usize,

        /// The underlying operating system error.
        source: io::Error,
    },

    /// The driver asked for a launch that does not exist.
    #[error("launch index {index} is out of range, the benchmark has {count} launches")]
    LaunchIndexOutOfRange {
        /// The requested launch index.
        index: usize,

        /// How many launches the benchmark has.
        count: usize,
    },
}

/// The point in a launch's life cycle at which its shared state failed.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "shared state is only ever created and dropped"
)]
pub enum SharedStateStage {
    /// The shared state factory panicked.
    #[display("creation")]
    Creation,

    /// The shared state panicked while being dropped after all threads were joined.
    #[display("release")]
    Release,
}

impl Error {
    pub(crate) fn invalid_configuration(problem: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            problem: problem.into(),
        }
    }
}

/// A specialized `Result` type for benchmark operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
