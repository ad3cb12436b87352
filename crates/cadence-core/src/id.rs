//! Strongly-typed work-item identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`WorkItemId`] allocation.
static WORK_ITEM_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a submitted work item.
///
/// Allocated from a monotonic atomic counter via [`WorkItemId::next`].
/// This is the pairing key for the cooperative suspend primitive: a
/// `park()` issued from inside an item's body is matched by the `wake()`
/// that names the same identity. Two distinct items always have
/// different IDs, even when they share the same underlying task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkItemId(u64);

impl WorkItemId {
    /// Allocate a fresh, unique identity.
    ///
    /// Each call returns an ID that has never been returned before
    /// within this process. Thread-safe.
    pub fn next() -> Self {
        Self(WORK_ITEM_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
