//! The driver thread: runs the step loop that advances logical time.
//!
//! One phase per distinct instant: commit the clock, submit the batch,
//! wait for the pool to go quiescent, re-insert fired repeats. The
//! driver is the only writer of the clock and the only thread that
//! moves the scheduler out of `Running`.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use cadence_core::{SchedulerWatcher, SubmitError};

use crate::scheduler::{Batch, ScheduledEntry, SchedulerState, StepScheduler};

/// Generous bound on pool drain after a graceful end. Phases already
/// waited for quiescence, so in practice this never expires.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// What the step loop decided to do next.
enum Step {
    /// Run every entry pending at `time`.
    Batch { time: u64, batch: Batch },
    /// Earliest pending instant exceeds the end time.
    EndOfTime,
    /// Nothing pending at all.
    Exhausted,
    /// `kill()` moved the state underneath us.
    Killed,
}

pub(crate) struct Driver {
    scheduler: StepScheduler,
}

impl Driver {
    pub fn new(scheduler: StepScheduler) -> Self {
        Self { scheduler }
    }

    /// The step loop. Runs on the `cadence-driver` thread until a
    /// terminal state, then shuts the pool down and fires the matching
    /// watcher callback.
    pub fn run(self) {
        for w in self.watchers() {
            w.on_started();
        }
        loop {
            match self.next_step() {
                Step::Batch { time, batch } => self.run_phase(time, batch),
                Step::EndOfTime => {
                    debug!(
                        end_time = self.scheduler.shared.end_time,
                        "end time reached"
                    );
                    self.drain_pool();
                    for w in self.watchers() {
                        w.on_end_time_reached();
                    }
                    break;
                }
                Step::Exhausted => {
                    debug!("no pending work left");
                    self.drain_pool();
                    for w in self.watchers() {
                        w.on_exhausted();
                    }
                    break;
                }
                Step::Killed => {
                    // kill() already issued shutdown_now; give running
                    // bodies a bounded window to unwind.
                    self.scheduler.shared.pool.wait_terminated(DRAIN_TIMEOUT);
                    for w in self.watchers() {
                        w.on_killed();
                    }
                    break;
                }
            }
        }
    }

    /// Decide the next action, committing any terminal transition
    /// under the lock.
    fn next_step(&self) -> Step {
        let shared = &self.scheduler.shared;
        let mut inner = shared.inner.lock().unwrap();
        if inner.state != SchedulerState::Running {
            // Only kill() moves a running scheduler, so this is Killed.
            return Step::Killed;
        }
        let step = match inner.agenda.next_time() {
            None => {
                inner.state = SchedulerState::EndedByExhaustion;
                Step::Exhausted
            }
            Some(time) if time > shared.end_time => {
                inner.state = SchedulerState::EndedByTime;
                Step::EndOfTime
            }
            Some(time) => {
                let batch = inner.agenda.take_batch(time);
                Step::Batch { time, batch }
            }
        };
        drop(inner);
        if !matches!(step, Step::Batch { .. }) {
            shared.state_cv.notify_all();
        }
        step
    }

    /// One phase: set the clock, run the batch to quiescence, and
    /// re-insert repeats that still have firings left.
    fn run_phase(&self, time: u64, batch: Batch) {
        let shared = &self.scheduler.shared;
        // Commit the instant before submitting, so a body that starts
        // immediately already reads the new time.
        if shared.clock.load(Ordering::Acquire) != time {
            shared.clock.store(time, Ordering::Release);
        }
        debug!(time, entries = batch.len(), "phase begin");
        for entry in &batch {
            if let Err(SubmitError::Shutdown) = shared.pool.submit(entry.item.clone()) {
                // Concurrent kill; the state check at the top of the
                // loop takes over.
                break;
            }
        }
        shared.pool.wait_quiescent();
        let mut inner = shared.inner.lock().unwrap();
        if inner.state != SchedulerState::Running {
            return;
        }
        for entry in batch {
            let Some(spec) = entry.repeat else { continue };
            if let Some(next) = spec.after_firing() {
                inner.agenda.insert(
                    time.saturating_add(spec.interval),
                    ScheduledEntry {
                        item: entry.item.next_firing(),
                        repeat: Some(next),
                    },
                );
            }
        }
    }

    /// Graceful pool shutdown after `EndedByTime`/`EndedByExhaustion`.
    fn drain_pool(&self) {
        let pool = &self.scheduler.shared.pool;
        pool.shutdown();
        pool.wait_terminated(DRAIN_TIMEOUT);
    }

    /// Snapshot of the registered watchers. Callbacks always run with
    /// the scheduler lock released.
    fn watchers(&self) -> Vec<Arc<dyn SchedulerWatcher>> {
        self.scheduler.shared.inner.lock().unwrap().watchers.clone()
    }
}
