//! Step scheduler: logical clock, pending-entry agenda, and lifecycle
//! state machine.
//!
//! [`StepScheduler`] is the user-facing handle — cheap to clone, and
//! the explicit simulation-context value that producers hold. The step
//! loop itself runs on a dedicated driver thread (see `driver.rs`).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use smallvec::SmallVec;
use tracing::debug;

use cadence_core::{
    RepeatSpec, Repetitions, ScheduleError, SchedulerError, SchedulerWatcher, WorkItem,
};

use crate::config::{ConfigError, SchedulerConfig};
use crate::driver::Driver;
use crate::pool::WorkerPool;

// ── SchedulerState ─────────────────────────────────────────────────

/// Lifecycle state of a [`StepScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed; accepts pre-loaded scheduling calls.
    Created,
    /// The driver thread is executing the step loop.
    Running,
    /// Terminal: the next pending instant exceeded the end time.
    EndedByTime,
    /// Terminal: the pending set drained completely.
    EndedByExhaustion,
    /// Terminal: `kill()` was issued.
    Killed,
}

impl SchedulerState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::EndedByTime | Self::EndedByExhaustion | Self::Killed
        )
    }
}

// ── Agenda ─────────────────────────────────────────────────────────

/// One pending entry: the item to run and, for repeating schedules,
/// the spec governing re-insertion.
pub(crate) struct ScheduledEntry {
    pub(crate) item: WorkItem,
    pub(crate) repeat: Option<RepeatSpec>,
}

/// Same-instant batches are usually tiny; keep them inline.
pub(crate) type Batch = SmallVec<[ScheduledEntry; 2]>;

/// The pending-entry set: ascending time, FIFO within one instant.
#[derive(Default)]
pub(crate) struct Agenda {
    entries: BTreeMap<u64, Batch>,
}

impl Agenda {
    pub fn insert(&mut self, time: u64, entry: ScheduledEntry) {
        self.entries.entry(time).or_default().push(entry);
    }

    /// The earliest instant with pending work.
    pub fn next_time(&self) -> Option<u64> {
        self.entries.keys().next().copied()
    }

    /// Remove and return every entry at `time`, in insertion order.
    pub fn take_batch(&mut self, time: u64) -> Batch {
        self.entries.remove(&time).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── StepScheduler ──────────────────────────────────────────────────

pub(crate) struct SchedInner {
    pub(crate) state: SchedulerState,
    pub(crate) agenda: Agenda,
    pub(crate) watchers: Vec<Arc<dyn SchedulerWatcher>>,
}

pub(crate) struct SchedShared {
    pub(crate) inner: Mutex<SchedInner>,
    /// Signalled on every state transition.
    pub(crate) state_cv: Condvar,
    /// Single writer (the driver); many readers. Never decreases.
    pub(crate) clock: AtomicU64,
    pub(crate) pool: WorkerPool,
    pub(crate) end_time: u64,
    driver: Mutex<Option<JoinHandle<()>>>,
}

/// Owns the logical clock and the pending-entry agenda; drives the
/// worker pool through one quiescent phase per distinct instant.
///
/// Cheap to clone; clones share one scheduler. Producers hold a clone
/// and inject work through [`schedule_once`](Self::schedule_once) and
/// [`schedule_repeating`](Self::schedule_repeating); item bodies that
/// need to schedule follow-up work capture a clone too.
#[derive(Clone)]
pub struct StepScheduler {
    pub(crate) shared: Arc<SchedShared>,
}

impl StepScheduler {
    /// Build a scheduler (state `Created`) from a validated config.
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(SchedShared {
                inner: Mutex::new(SchedInner {
                    state: SchedulerState::Created,
                    agenda: Agenda::default(),
                    watchers: Vec::new(),
                }),
                state_cv: Condvar::new(),
                clock: AtomicU64::new(0),
                pool: WorkerPool::new(config.resolved_parallelism()),
                end_time: config.end_time,
                driver: Mutex::new(None),
            }),
        })
    }

    /// Schedule one execution of `item`, `delay` logical units from
    /// the current clock. A delay of zero means "at the current
    /// instant" and is how a body schedules same-phase follow-up work.
    pub fn schedule_once(&self, item: WorkItem, delay: u64) -> Result<(), ScheduleError> {
        self.schedule(item, delay, None)
    }

    /// Schedule `item` to fire first after `first_delay`, then every
    /// `interval` units, `repetitions` times in total.
    ///
    /// Fails with [`ScheduleError::ZeroInterval`] if `interval` is
    /// zero — such an entry would never advance the clock.
    /// `Repetitions::Finite(0)` schedules nothing and returns `Ok`.
    pub fn schedule_repeating(
        &self,
        item: WorkItem,
        first_delay: u64,
        interval: u64,
        repetitions: Repetitions,
    ) -> Result<(), ScheduleError> {
        if interval == 0 {
            return Err(ScheduleError::ZeroInterval);
        }
        let spec = RepeatSpec {
            interval,
            repetitions,
        };
        if !spec.fires() {
            return Ok(());
        }
        self.schedule(item, first_delay, Some(spec))
    }

    fn schedule(
        &self,
        item: WorkItem,
        delay: u64,
        repeat: Option<RepeatSpec>,
    ) -> Result<(), ScheduleError> {
        let mut inner = self.shared.inner.lock().unwrap();
        if inner.state.is_terminal() {
            return Err(ScheduleError::Terminated);
        }
        let time = self.shared.clock.load(Ordering::Acquire).saturating_add(delay);
        debug!(item = %item.id(), task = item.name(), time, "scheduled");
        inner.agenda.insert(time, ScheduledEntry { item, repeat });
        Ok(())
    }

    /// `Created → Running`: spawn the driver thread and return without
    /// blocking. The driver fires `on_started` and runs the step loop.
    ///
    /// Fails with [`SchedulerError::AlreadyStarted`] while running and
    /// [`SchedulerError::Terminated`] from a terminal state.
    pub fn start(&self) -> Result<(), SchedulerError> {
        {
            let mut inner = self.shared.inner.lock().unwrap();
            match inner.state {
                SchedulerState::Created => inner.state = SchedulerState::Running,
                SchedulerState::Running => return Err(SchedulerError::AlreadyStarted),
                _ => return Err(SchedulerError::Terminated),
            }
        }
        debug!("scheduler started");
        let driver = Driver::new(self.clone());
        let handle = thread::Builder::new()
            .name("cadence-driver".into())
            .spawn(move || driver.run())
            .expect("failed to spawn driver thread");
        *self.shared.driver.lock().unwrap() = Some(handle);
        Ok(())
    }

    /// Kill the scheduler. Idempotent; safe from any thread, including
    /// from inside an item's body or a watcher callback.
    ///
    /// Issues `shutdown_now` on the pool: queued items are interrupted
    /// and every parked item observes cancellation. When killed from
    /// `Running`, the driver observes the transition and fires
    /// `on_killed`; killed from `Created` (no driver exists) the
    /// callback fires on the calling thread.
    pub fn kill(&self) {
        let fire_here = {
            let mut inner = self.shared.inner.lock().unwrap();
            match inner.state {
                SchedulerState::Created => {
                    inner.state = SchedulerState::Killed;
                    Some(inner.watchers.clone())
                }
                SchedulerState::Running => {
                    inner.state = SchedulerState::Killed;
                    None
                }
                _ => return,
            }
        };
        debug!("scheduler killed");
        self.shared.state_cv.notify_all();
        self.shared.pool.shutdown_now();
        if let Some(watchers) = fire_here {
            for w in &watchers {
                w.on_killed();
            }
        }
    }

    /// The logical clock. Meaningful once `Running` has begun;
    /// monotonically non-decreasing.
    pub fn current_time(&self) -> u64 {
        self.shared.clock.load(Ordering::Acquire)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.shared.inner.lock().unwrap().state
    }

    /// Register a lifecycle watcher. May be called in any state;
    /// watchers registered after a transition miss its notification.
    pub fn add_watcher(&self, watcher: Arc<dyn SchedulerWatcher>) {
        self.shared.inner.lock().unwrap().watchers.push(watcher);
    }

    /// The scheduler's worker pool.
    pub fn pool(&self) -> &WorkerPool {
        &self.shared.pool
    }

    /// Block until the scheduler reaches a terminal state or the
    /// timeout elapses. Returns whether a terminal state was reached.
    pub fn wait_terminal(&self, timeout: Duration) -> bool {
        let inner = self.shared.inner.lock().unwrap();
        let (inner, _result) = self
            .shared
            .state_cv
            .wait_timeout_while(inner, timeout, |inner| !inner.state.is_terminal())
            .unwrap();
        inner.state.is_terminal()
    }

    /// Join the driver thread, if one was started.
    ///
    /// Blocks until the driver exits (after its final watcher
    /// callbacks). Must not be called from a watcher callback or an
    /// item body — the driver cannot join itself.
    pub fn join(&self) {
        if let Some(handle) = self.shared.driver.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}
