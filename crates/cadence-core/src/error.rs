//! Error types for the Cadence simulation kernel.
//!
//! One enum per failure surface: submission, scheduling, suspension,
//! task execution, and lifecycle. All errors are plain values returned
//! synchronously to the caller; nothing here unwinds across the engine.

use std::error::Error;
use std::fmt;

/// Error submitting a work item to the worker pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The pool has been shut down and accepts no new work.
    Shutdown,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shutdown => write!(f, "pool is shut down"),
        }
    }
}

impl Error for SubmitError {}

/// Error from the scheduling API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    /// A repeating schedule was given a zero interval, which would
    /// never advance the clock.
    ZeroInterval,
    /// The scheduler has reached a terminal state and accepts no new
    /// entries.
    Terminated,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroInterval => write!(f, "repeat interval must be at least 1"),
            Self::Terminated => write!(f, "scheduler has terminated"),
        }
    }
}

impl Error for ScheduleError {}

/// Error returned from a `park()` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParkError {
    /// The parked item was forcibly woken because the pool is shutting
    /// down. The body must stop waiting and return.
    Cancelled,
    /// The caller is not a currently running work item. `park()` is
    /// only valid from inside a running item's body.
    NotRunning,
    /// Shutdown was already requested; parking now would only be
    /// cancelled, so it fails fast instead.
    ShuttingDown,
}

impl fmt::Display for ParkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "park cancelled by shutdown"),
            Self::NotRunning => write!(f, "park called outside a running item"),
            Self::ShuttingDown => write!(f, "pool is shutting down"),
        }
    }
}

impl Error for ParkError {}

/// Error raised by a task body.
///
/// Caught at the per-item boundary by the worker pool: logged, never
/// propagated to sibling items or to the scheduler driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskError {
    /// The task observed cancellation (typically from a forced wake)
    /// and stopped early.
    Cancelled,
    /// The task body failed.
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl TaskError {
    /// Convenience constructor for [`TaskError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "task cancelled"),
            Self::Failed { reason } => write!(f, "task failed: {reason}"),
        }
    }
}

impl Error for TaskError {}

impl From<ParkError> for TaskError {
    fn from(e: ParkError) -> Self {
        match e {
            ParkError::Cancelled => Self::Cancelled,
            other => Self::Failed {
                reason: other.to_string(),
            },
        }
    }
}

/// Error from scheduler lifecycle operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    /// `start()` was called while the scheduler was already running.
    AlreadyStarted,
    /// `start()` was called after the scheduler reached a terminal
    /// state (killed, or already ran to completion).
    Terminated,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyStarted => write!(f, "scheduler was already started"),
            Self::Terminated => write!(f, "scheduler has terminated"),
        }
    }
}

impl Error for SchedulerError {}
