//! Periodic-task scheduling.
//!
//! The listener never spawns anything itself. It hands a tick callback to a
//! [`Scheduler`], which decides where and when the callback runs.

use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Returned by every tick to tell the scheduler whether to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    /// Keep the periodic task scheduled.
    Continue,
    /// Stop rescheduling this task.
    Halt,
}

/// Callback invoked once per interval.
pub type TickCallback = Box<dyn FnMut() -> BoxFuture<'static, TickResult> + Send + 'static>;

/// A runner of named periodic tasks.
pub trait Scheduler: Send + Sync {
    /// Identifies a registration so it can be cancelled later.
    type Handle: Send + Sync + 'static;

    /// Registers `callback` to run every `interval`, first after one interval
    /// has elapsed.
    fn schedule_periodic(&self, interval: Duration, name: &str, callback: TickCallback) -> Self::Handle;

    /// Prevents future runs of the task. A run already in progress completes.
    fn cancel(&self, handle: Self::Handle);
}

/// [`Scheduler`] that gives every registration its own tokio task.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    /// Creates a scheduler that spawns onto the current tokio runtime.
    pub fn new() -> Self {
        TokioScheduler
    }
}

/// Handle to a task registered with [`TokioScheduler`].
///
/// Dropping the handle stops the task after its current tick, like
/// [`Scheduler::cancel`].
#[derive(Debug)]
pub struct TokioTaskHandle {
    name: String,
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl TokioTaskHandle {
    /// Name the task was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the task has ended, either cancelled or halted by its callback.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Scheduler for TokioScheduler {
    type Handle = TokioTaskHandle;

    fn schedule_periodic(
        &self,
        interval: Duration,
        name: &str,
        mut callback: TickCallback,
    ) -> Self::Handle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let task_name = name.to_string();

        let join = tokio::spawn(async move {
            // tokio rejects a zero period.
            let period = interval.max(Duration::from_millis(1));
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                }

                // Cancellation is only observed between ticks.
                if callback().await == TickResult::Halt {
                    tracing::debug!(task = %task_name, "periodic task halted by its callback");
                    break;
                }
                if *shutdown_rx.borrow() {
                    break;
                }
            }

            tracing::debug!(task = %task_name, "periodic task finished");
        });

        TokioTaskHandle {
            name: name.to_string(),
            shutdown,
            join,
        }
    }

    fn cancel(&self, handle: Self::Handle) {
        tracing::debug!(task = %handle.name, "cancelling periodic task");
        // The task may already have halted, in which case nobody is listening.
        let _ = handle.shutdown.send(true);
    }
}
