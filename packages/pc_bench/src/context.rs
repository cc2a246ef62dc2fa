use std::error::Error as StdError;
use std::num::NonZero;
use std::sync::atomic::{self, AtomicBool};

use crate::Configuration;

/// The error type a producer or consumer hook may return to report failure.
pub type HookError = Box<dyn StdError + Send + Sync>;

/// The return type of producer and consumer hooks.
///
/// Returning an error (or panicking) marks the current launch as failed. Other configurations
/// of the benchmark still run.
pub type HookResult = Result<(), HookError>;

/// The role a benchmark thread plays in a launch.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a benchmark thread is either a producer or a consumer, there is nothing else"
)]
pub enum Role {
    /// The thread runs the producer hook.
    #[display("producer")]
    Producer,

    /// The thread runs the consumer hook.
    #[display("consumer")]
    Consumer,
}

/// Informs a producer or consumer hook about the thread it is running on and gives it access
/// to the state shared by all threads of the launch.
///
/// A fresh context is created for every thread of every launch and is dropped when the hook
/// returns. The hook is called exactly once per thread and is expected to loop over
/// [`iterations()`](Self::iterations) itself.
///
/// The context performs no synchronization. Any ordering between producers and consumers is
/// the responsibility of the shared state (e.g. a blocking queue) and of the hooks.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// use pc_bench::{Context, HookResult, Role};
///
/// fn producer(ctx: &mut Context<'_, AtomicU64>) -> HookResult {
///     assert_eq!(ctx.role(), Role::Producer);
///
///     for _ in 0..ctx.iterations() {
///         ctx.shared().fetch_add(1, Ordering::Relaxed);
///         ctx.add_items(1);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(derive_more::Debug)]
pub struct Context<'a, S> {
    role: Role,
    thread_index: usize,
    role_thread_count: NonZero<usize>,
    configuration: Configuration,
    iterations: u64,

    #[debug(ignore)]
    shared: &'a S,
    #[debug(ignore)]
    launch_failed: &'a AtomicBool,

    items: u64,
    bytes: u64,
}

impl<'a, S> Context<'a, S> {
    pub(crate) fn new(
        role: Role,
        thread_index: usize,
        configuration: Configuration,
        iterations: u64,
        shared: &'a S,
        launch_failed: &'a AtomicBool,
    ) -> Self {
        let role_thread_count = match role {
            Role::Producer => configuration.producers(),
            Role::Consumer => configuration.consumers(),
        };

        Self {
            role,
            thread_index,
            role_thread_count,
            configuration,
            iterations,
            shared,
            launch_failed,
            items: 0,
            bytes: 0,
        }
    }

    /// Whether this thread is a producer or a consumer.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// The index of this thread among the threads of the same role, starting from 0.
    #[must_use]
    pub fn thread_index(&self) -> usize {
        self.thread_index
    }

    /// How many threads share this thread's role in the current launch.
    #[must_use]
    pub fn role_thread_count(&self) -> NonZero<usize> {
        self.role_thread_count
    }

    /// The producer/consumer configuration of the current launch.
    #[must_use]
    pub fn configuration(&self) -> Configuration {
        self.configuration
    }

    /// How many iterations this thread must perform.
    ///
    /// The iterations of a launch are split between the threads of each role so that every
    /// role performs exactly the configured total.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// The state shared by every producer and consumer thread of the current launch.
    #[must_use]
    pub fn shared(&self) -> &'a S {
        self.shared
    }

    /// Whether any thread of the current launch has already failed.
    ///
    /// The launch is not cancelled when a thread fails. Hooks that may otherwise wait forever
    /// for a counterpart that has failed (e.g. a consumer waiting for items) can poll this to
    /// stop early.
    #[must_use]
    pub fn launch_failed(&self) -> bool {
        self.launch_failed.load(atomic::Ordering::Acquire)
    }

    /// Records that this thread processed `count` items, for throughput reporting.
    pub fn add_items(&mut self, count: u64) {
        self.items = self.items.saturating_add(count);
    }

    /// Records that this thread processed `count` bytes, for throughput reporting.
    pub fn add_bytes(&mut self, count: u64) {
        self.bytes = self.bytes.saturating_add(count);
    }

    /// Items recorded so far via [`add_items()`](Self::add_items).
    #[must_use]
    pub fn items(&self) -> u64 {
        self.items
    }

    /// Bytes recorded so far via [`add_bytes()`](Self::add_bytes).
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    static NOT_FAILED: AtomicBool = AtomicBool::new(false);

    assert_impl_all!(Context<'static, u64>: Send, Sync);
    assert_not_impl_any!(Context<'static, Cell<u64>>: Sync);

    #[test]
    fn role_thread_count_follows_role() {
        let configuration = Configuration::new(3, 5).unwrap();

        let producer = Context::new(Role::Producer, 2, configuration, 10, &(), &NOT_FAILED);
        let consumer = Context::new(Role::Consumer, 4, configuration, 6, &(), &NOT_FAILED);

        assert_eq!(producer.role(), Role::Producer);
        assert_eq!(producer.thread_index(), 2);
        assert_eq!(producer.role_thread_count().get(), 3);
        assert_eq!(producer.iterations(), 10);

        assert_eq!(consumer.role(), Role::Consumer);
        assert_eq!(consumer.thread_index(), 4);
        assert_eq!(consumer.role_thread_count().get(), 5);
        assert_eq!(consumer.iterations(), 6);
        assert_eq!(consumer.configuration(), configuration);
    }

    #[test]
    fn metrics_accumulate() {
        let configuration = Configuration::new(1, 1).unwrap();
        let mut ctx = Context::new(Role::Producer, 0, configuration, 1, &(), &NOT_FAILED);

        ctx.add_items(3);
        ctx.add_items(4);
        ctx.add_bytes(64);
        ctx.add_bytes(u64::MAX);

        assert_eq!(ctx.items(), 7);
        assert_eq!(ctx.bytes(), u64::MAX);
    }

    #[test]
    fn shared_state_is_borrowed() {
        let configuration = Configuration::new(1, 1).unwrap();
        let shared = vec![1, 2, 3];
        let ctx = Context::new(Role::Consumer, 0, configuration, 1, &shared, &NOT_FAILED);

        assert_eq!(ctx.shared().len(), 3);
    }

    #[test]
    fn launch_failure_flag_is_visible() {
        let configuration = Configuration::new(1, 1).unwrap();
        let failed = AtomicBool::new(false);
        let ctx = Context::new(Role::Consumer, 0, configuration, 1, &(), &failed);

        assert!(!ctx.launch_failed());
        failed.store(true, atomic::Ordering::Release);
        assert!(ctx.launch_failed());
    }

    #[test]
    fn role_display() {
        assert_eq!(Role::Producer.to_string(), "producer");
        assert_eq!(Role::Consumer.to_string(), "consumer");
    }
}
