//! Execution engine for the Cadence simulation kernel.
//!
//! Two subsystems: the [`WorkerPool`] (bounded-parallelism executor with
//! quiescence/termination detection and cooperative suspend/resume) and
//! the [`StepScheduler`] (logical clock plus pending-entry agenda, driven
//! phase-by-phase on a dedicated driver thread).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
mod driver;
pub mod pool;
pub mod scheduler;

pub use config::{ConfigError, SchedulerConfig};
pub use pool::WorkerPool;
pub use scheduler::{SchedulerState, StepScheduler};
