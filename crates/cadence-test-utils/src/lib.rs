//! Test fixtures and helpers for Cadence development.
//!
//! Canned [`Task`](cadence_core::Task) implementations covering the
//! interesting execution shapes (counting, parking, failing, panicking)
//! and a [`RecordingWatcher`] for asserting on lifecycle callbacks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod fixtures;

pub use fixtures::{CountingTask, FailingTask, GateTask, PanickingTask, RecordingWatcher};

/// Install a compact tracing subscriber for test output.
///
/// Respects `RUST_LOG`; safe to call from every test — repeat
/// initialization is silently ignored.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
