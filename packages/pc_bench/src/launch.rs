//! Executes one launch: one set of producer and consumer threads for a single configuration.

use std::any::Any;
use std::io;
use std::num::NonZero;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{self, AtomicBool};
use std::thread::{self, Scope, ScopedJoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::settings::split_evenly;
use crate::{
    Clock, Configuration, Context, Error, HookResult, LaunchResult, Role, SharedStateStage,
};

/// Everything that varies between launches of the same benchmark.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LaunchPlan {
    pub(crate) configuration: Configuration,
    pub(crate) iterations: NonZero<u64>,
    pub(crate) thread_stack_size: Option<NonZero<usize>>,
}

/// Runs one launch to completion and returns its result.
///
/// The shared state is created before any thread and dropped only after every thread of the
/// launch has been joined. The result is always produced, even if the shared state panics,
/// a hook fails or a thread cannot be created; such failures are attached to the result.
pub(crate) fn execute<S, F, P, C>(
    plan: LaunchPlan,
    shared_state_fn: &F,
    producer_fn: &P,
    consumer_fn: &C,
    clock: &dyn Clock,
) -> LaunchResult
where
    S: Sync,
    F: Fn(&Configuration) -> S,
    P: Fn(&mut Context<'_, S>) -> HookResult + Sync,
    C: Fn(&mut Context<'_, S>) -> HookResult + Sync,
{
    let configuration = plan.configuration;
    let thread_count = configuration.thread_count().get();

    debug!(
        %configuration,
        iterations = plan.iterations.get(),
        "launch starting"
    );

    let created = panic::catch_unwind(AssertUnwindSafe(|| shared_state_fn(&configuration)));

    let shared = match created {
        Ok(shared) => shared,
        Err(payload) => {
            let failure = Error::SharedStateFailure {
                stage: SharedStateStage::Creation,
                message: panic_message(payload.as_ref()),
            };

            warn!(%configuration, %failure, "aborting launch, could not create shared state");
            return LaunchResult::aborted(configuration, failure);
        }
    };

    let gate = StartGate::new();
    let failures = FailureSlot::new();

    let result = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(thread_count);

        let spawned = spawn_role(
            scope,
            &mut handles,
            Role::Producer,
            plan,
            &shared,
            producer_fn,
            &gate,
            &failures,
        )
        .and_then(|()| {
            spawn_role(
                scope,
                &mut handles,
                Role::Consumer,
                plan,
                &shared,
                consumer_fn,
                &gate,
                &failures,
            )
        });

        if let Err(error) = spawned {
            warn!(
                %configuration,
                started = handles.len(),
                %error,
                "aborting launch, could not create all threads"
            );

            // Threads that did start are parked at the gate. Aborting releases them without
            // running any hook, after which they are joined.
            gate.abort();
            join_all(handles);

            return LaunchResult::aborted(configuration, error);
        }

        // Every thread is constructed and parked before any of them starts.
        gate.wait_until_ready(thread_count);
        gate.open();
        let started = clock.now();

        gate.wait_until_finished(thread_count);
        let finished = clock.now();

        let tally = join_all(handles);

        let elapsed = finished.saturating_duration_since(started);

        let mut result = LaunchResult::completed(
            configuration,
            elapsed,
            tally.produced_iterations,
            tally.consumed_iterations,
            tally.items,
            tally.bytes,
        );

        // Hook failures take precedence over threads lost by the harness.
        for failure in [failures.take(), tally.harness_failure].into_iter().flatten() {
            result = result.with_failure(failure);
        }

        match result.failure() {
            Some(failure) => warn!(%configuration, %failure, "launch failed"),
            None => debug!(%configuration, ?elapsed, "launch finished"),
        }

        result
    });

    // Only now, with every thread joined, is the shared state released.
    match panic::catch_unwind(AssertUnwindSafe(move || drop(shared))) {
        Ok(()) => result,
        Err(payload) => {
            let failure = Error::SharedStateFailure {
                stage: SharedStateStage::Release,
                message: panic_message(payload.as_ref()),
            };

            warn!(%configuration, %failure, "shared state panicked on release");
            result.with_failure(failure)
        }
    }
}

#[expect(
    clippy::too_many_arguments,
    reason = "private helper, grouping the borrows into a struct would only move the noise"
)]
fn spawn_role<'scope, 'env, S, H>(
    scope: &'scope Scope<'scope, 'env>,
    handles: &mut Vec<SpawnedThread<'scope>>,
    role: Role,
    plan: LaunchPlan,
    shared: &'env S,
    hook: &'env H,
    gate: &'env StartGate,
    failures: &'env FailureSlot,
) -> Result<(), Error>
where
    S: Sync,
    H: Fn(&mut Context<'_, S>) -> HookResult + Sync,
{
    let configuration = plan.configuration;

    let role_count = match role {
        Role::Producer => configuration.producers(),
        Role::Consumer => configuration.consumers(),
    };

    for (thread_index, iterations) in split_evenly(plan.iterations, role_count).enumerate() {
        let mut builder = thread::Builder::new().name(format!("pc-{role}-{thread_index}"));

        if let Some(stack_size) = plan.thread_stack_size {
            builder = builder.stack_size(stack_size.get());
        }

        let handle = spawn_scoped(builder, scope, move || {
            // Whatever happens below, the driver must learn that this thread is done.
            let _finished = scopeguard::guard(gate, |gate| gate.finish());

            if !gate.arrive_and_wait() {
                trace!(%role, thread_index, "launch aborted before start");
                return None;
            }

            let mut ctx = Context::new(
                role,
                thread_index,
                configuration,
                iterations,
                shared,
                failures.flag(),
            );

            trace!(%role, thread_index, iterations, "thread started");

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| hook(&mut ctx)));

            let completed_iterations = match outcome {
                Ok(Ok(())) => iterations,
                Ok(Err(error)) => {
                    failures.record(role, thread_index, error.to_string());
                    0
                }
                Err(payload) => {
                    failures.record(role, thread_index, panic_message(payload.as_ref()));
                    0
                }
            };

            trace!(%role, thread_index, completed_iterations, "thread finished");

            Some(ThreadReport {
                role,
                completed_iterations,
                items: ctx.items(),
                bytes: ctx.bytes(),
            })
        })
        .map_err(|source| Error::ThreadCreationFailure {
            role,
            thread_index,
            source,
        })?;

        handles.push(SpawnedThread {
            role,
            thread_index,
            handle,
        });
    }

    Ok(())
}

fn spawn_scoped<'scope, 'env, F, T>(
    builder: thread::Builder,
    scope: &'scope Scope<'scope, 'env>,
    f: F,
) -> io::Result<ScopedJoinHandle<'scope, T>>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    #[cfg(test)]
    if tests::consume_spawn_budget() {
        return Err(io::Error::other("simulated thread creation failure"));
    }

    builder.spawn_scoped(scope, f)
}

#[derive(Debug)]
struct SpawnedThread<'scope> {
    role: Role,
    thread_index: usize,
    handle: ScopedJoinHandle<'scope, Option<ThreadReport>>,
}

/// Joins every thread, summing up the reports of the threads that ran their hook.
fn join_all(threads: Vec<SpawnedThread<'_>>) -> Tally {
    let mut tally = Tally::default();

    for SpawnedThread {
        role,
        thread_index,
        handle,
    } in threads
    {
        match handle.join() {
            Ok(Some(report)) => tally.add(&report),
            Ok(None) => {}
            Err(payload) => {
                // Hook panics are caught inside the thread, so this is the harness itself.
                let message = panic_message(payload.as_ref());

                warn!(
                    %role,
                    thread_index,
                    %message,
                    "benchmark thread panicked outside of its hook"
                );

                if tally.harness_failure.is_none() {
                    tally.harness_failure = Some(Error::LaunchFailure {
                        role,
                        thread_index,
                        message,
                    });
                }
            }
        }
    }

    tally
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "hook panicked with a non-string payload".to_string()
    }
}

#[derive(Debug)]
struct ThreadReport {
    role: Role,
    completed_iterations: u64,
    items: u64,
    bytes: u64,
}

#[derive(Debug, Default)]
struct Tally {
    produced_iterations: u64,
    consumed_iterations: u64,
    items: u64,
    bytes: u64,

    /// A thread that died outside of its hook; its share of the work is missing.
    harness_failure: Option<Error>,
}

impl Tally {
    fn add(&mut self, report: &ThreadReport) {
        let iterations = match report.role {
            Role::Producer => &mut self.produced_iterations,
            Role::Consumer => &mut self.consumed_iterations,
        };

        *iterations = iterations.saturating_add(report.completed_iterations);
        self.items = self.items.saturating_add(report.items);
        self.bytes = self.bytes.saturating_add(report.bytes);
    }
}

/// Holds the threads of a launch until all of them exist, then releases them together.
///
/// Also counts finished threads so the driver can stop the clock without first paying
/// for the joins.
#[derive(Debug)]
struct StartGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

#[derive(Debug)]
struct GateState {
    ready: usize,
    finished: usize,
    phase: Phase,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Closed,
    Open,
    Aborted,
}

impl StartGate {
    fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                ready: 0,
                finished: 0,
                phase: Phase::Closed,
            }),
            changed: Condvar::new(),
        }
    }

    /// Announces that the calling thread is ready and blocks until the gate opens or the
    /// launch is aborted. Returns `true` if the thread may start.
    fn arrive_and_wait(&self) -> bool {
        let mut state = self.state.lock();
        state.ready = state.ready.saturating_add(1);
        self.changed.notify_all();

        while state.phase == Phase::Closed {
            self.changed.wait(&mut state);
        }

        state.phase == Phase::Open
    }

    fn finish(&self) {
        let mut state = self.state.lock();
        state.finished = state.finished.saturating_add(1);
        self.changed.notify_all();
    }

    fn wait_until_ready(&self, thread_count: usize) {
        let mut state = self.state.lock();

        while state.ready < thread_count {
            self.changed.wait(&mut state);
        }
    }

    fn wait_until_finished(&self, thread_count: usize) {
        let mut state = self.state.lock();

        while state.finished < thread_count {
            self.changed.wait(&mut state);
        }
    }

    fn open(&self) {
        self.set_phase(Phase::Open);
    }

    fn abort(&self) {
        self.set_phase(Phase::Aborted);
    }

    fn set_phase(&self, phase: Phase) {
        let mut state = self.state.lock();
        state.phase = phase;
        self.changed.notify_all();
    }
}

/// Remembers the first failure reported by any thread of a launch.
#[derive(Debug)]
struct FailureSlot {
    first: Mutex<Option<Error>>,
    failed: AtomicBool,
}

impl FailureSlot {
    fn new() -> Self {
        Self {
            first: Mutex::new(None),
            failed: AtomicBool::new(false),
        }
    }

    fn record(&self, role: Role, thread_index: usize, message: String) {
        let mut first = self.first.lock();

        if first.is_none() {
            *first = Some(Error::LaunchFailure {
                role,
                thread_index,
                message,
            });
        }

        self.failed.store(true, atomic::Ordering::Release);
    }

    fn flag(&self) -> &AtomicBool {
        &self.failed
    }

    fn take(&self) -> Option<Error> {
        self.first.lock().take()
    }
}
