//! Scheduler configuration and validation.

use std::error::Error;
use std::fmt;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SchedulerConfig::validate()`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_parallelism` was explicitly set to zero.
    ZeroParallelism,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroParallelism => write!(f, "max_parallelism must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

// ── SchedulerConfig ────────────────────────────────────────────────

/// Configuration for a [`StepScheduler`](crate::StepScheduler).
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Inclusive upper bound on the logical clock. The first pending
    /// instant beyond this ends the run.
    pub end_time: u64,
    /// Maximum simultaneously running work items. `None` = auto-detect
    /// from `available_parallelism`, clamped to `[1, 16]`.
    pub max_parallelism: Option<usize>,
}

impl SchedulerConfig {
    /// Configuration with the given end time and auto-detected
    /// parallelism.
    pub fn new(end_time: u64) -> Self {
        Self {
            end_time,
            max_parallelism: None,
        }
    }

    /// Set an explicit parallelism bound.
    pub fn with_max_parallelism(mut self, n: usize) -> Self {
        self.max_parallelism = Some(n);
        self
    }

    /// Resolve the actual parallelism bound, applying auto-detection if
    /// unset. Explicit values are clamped to `[1, 64]`.
    pub fn resolved_parallelism(&self) -> usize {
        match self.max_parallelism {
            Some(n) => n.clamp(1, 64),
            None => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4);
                cpus.clamp(1, 16)
            }
        }
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallelism == Some(0) {
            return Err(ConfigError::ZeroParallelism);
        }
        Ok(())
    }
}
