//! Cadence: a discrete-event simulation kernel.
//!
//! This is the top-level facade crate that re-exports the public API
//! from the Cadence sub-crates. For most users, adding `cadence` as a
//! single dependency is sufficient.
//!
//! Time is logical: the clock only moves when every work item scheduled
//! at the current instant has finished or parked. Within one instant,
//! items run with bounded parallelism on a worker pool that supports
//! cooperative suspend/resume.
//!
//! # Quick start
//!
//! ```rust
//! use cadence::prelude::*;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! // A task that counts its firings.
//! struct Pulse {
//!     fires: AtomicU64,
//! }
//! impl Task for Pulse {
//!     fn name(&self) -> &str { "pulse" }
//!     fn run(&self, _ctx: &TaskContext<'_>) -> Result<(), TaskError> {
//!         self.fires.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! let scheduler = StepScheduler::new(SchedulerConfig::new(100)).unwrap();
//! let pulse = Arc::new(Pulse { fires: AtomicU64::new(0) });
//! scheduler
//!     .schedule_repeating(WorkItem::new(pulse.clone()), 0, 10, Repetitions::Finite(3))
//!     .unwrap();
//! scheduler.start().unwrap();
//! assert!(scheduler.wait_terminal(Duration::from_secs(5)));
//! scheduler.join();
//! assert_eq!(pulse.fires.load(Ordering::SeqCst), 3);
//! assert_eq!(scheduler.state(), SchedulerState::EndedByExhaustion);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cadence-core` | Work items, tasks, repeat specs, errors, watcher trait |
//! | [`engine`] | `cadence-engine` | Worker pool, step scheduler, configuration |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`cadence-core`).
///
/// Work item identities, the [`types::Task`] and
/// [`types::SchedulerWatcher`] traits, repeat specifications, and the
/// error taxonomy.
pub use cadence_core as types;

/// Execution engine (`cadence-engine`).
///
/// [`engine::WorkerPool`] for bounded-parallelism execution with
/// quiescence detection, [`engine::StepScheduler`] for phased logical
/// time.
pub use cadence_engine as engine;

/// Common imports for typical Cadence usage.
///
/// ```rust
/// use cadence::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use cadence_core::{
        RepeatSpec, Repetitions, SchedulerWatcher, Suspender, Task, TaskContext, WorkItem,
        WorkItemId,
    };

    // Errors
    pub use cadence_core::{ParkError, ScheduleError, SchedulerError, SubmitError, TaskError};

    // Engine
    pub use cadence_engine::{
        ConfigError, SchedulerConfig, SchedulerState, StepScheduler, WorkerPool,
    };
}
