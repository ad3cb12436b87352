//! Passive observers of scheduler lifecycle transitions.

/// Observer notified of scheduler phase transitions.
///
/// All methods default to no-ops, so implementors override only what
/// they care about. Callbacks fire synchronously after the
/// corresponding transition has been committed, normally on the
/// scheduler's driver thread; they may call back into the scheduler
/// (including `kill()`).
pub trait SchedulerWatcher: Send + Sync {
    /// The scheduler entered its running state.
    fn on_started(&self) {}

    /// The scheduler was killed.
    fn on_killed(&self) {}

    /// The configured end time was reached with work still pending.
    fn on_end_time_reached(&self) {}

    /// The pending set drained completely — no work left to execute.
    fn on_exhausted(&self) {}
}
