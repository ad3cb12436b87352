//! Canned tasks and a recording lifecycle watcher.

use std::sync::atomic::{AtomicUsize, Ordering};

use cadence_core::{SchedulerWatcher, Task, TaskContext, TaskError};

/// Task that counts its executions.
///
/// Share it across firings via `Arc` and assert on [`count`](Self::count)
/// afterwards.
#[derive(Default)]
pub struct CountingTask {
    runs: AtomicUsize,
}

impl CountingTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Task for CountingTask {
    fn name(&self) -> &str {
        "counting"
    }

    fn run(&self, _ctx: &TaskContext<'_>) -> Result<(), TaskError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Task that parks itself and waits to be woken.
///
/// Records how far it got: [`parked`](Self::parked) flips before the
/// park call, [`resumed`](Self::resumed) only after a successful wake.
/// A forced cancellation during shutdown leaves `resumed` at zero.
#[derive(Default)]
pub struct GateTask {
    parked: AtomicUsize,
    resumed: AtomicUsize,
}

impl GateTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parked(&self) -> usize {
        self.parked.load(Ordering::SeqCst)
    }

    pub fn resumed(&self) -> usize {
        self.resumed.load(Ordering::SeqCst)
    }
}

impl Task for GateTask {
    fn name(&self) -> &str {
        "gate"
    }

    fn run(&self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
        self.parked.fetch_add(1, Ordering::SeqCst);
        ctx.park()?;
        self.resumed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Task that always fails.
pub struct FailingTask;

impl Task for FailingTask {
    fn name(&self) -> &str {
        "failing"
    }

    fn run(&self, _ctx: &TaskContext<'_>) -> Result<(), TaskError> {
        Err(TaskError::failed("deliberate test failure"))
    }
}

/// Task that panics mid-body.
pub struct PanickingTask;

impl Task for PanickingTask {
    fn name(&self) -> &str {
        "panicking"
    }

    fn run(&self, _ctx: &TaskContext<'_>) -> Result<(), TaskError> {
        panic!("deliberate test panic");
    }
}

/// Watcher that counts every lifecycle callback it receives.
#[derive(Default)]
pub struct RecordingWatcher {
    started: AtomicUsize,
    killed: AtomicUsize,
    end_time: AtomicUsize,
    exhausted: AtomicUsize,
}

impl RecordingWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst) > 0
    }

    pub fn killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst) > 0
    }

    pub fn killed_count(&self) -> usize {
        self.killed.load(Ordering::SeqCst)
    }

    pub fn end_time_reached(&self) -> bool {
        self.end_time.load(Ordering::SeqCst) > 0
    }

    pub fn exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst) > 0
    }
}

impl SchedulerWatcher for RecordingWatcher {
    fn on_started(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_killed(&self) {
        self.killed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_end_time_reached(&self) {
        self.end_time.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::SeqCst);
    }
}
