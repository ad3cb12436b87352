//! Core types and traits for the Cadence simulation kernel.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Cadence workspace:
//! work-item identity, the [`Task`] trait and its execution context,
//! repeat specifications, scheduler watchers, and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod item;
pub mod repeat;
pub mod watcher;

pub use error::{ParkError, ScheduleError, SchedulerError, SubmitError, TaskError};
pub use id::WorkItemId;
pub use item::{Suspender, Task, TaskContext, WorkItem};
pub use repeat::{RepeatSpec, Repetitions};
pub use watcher::SchedulerWatcher;
