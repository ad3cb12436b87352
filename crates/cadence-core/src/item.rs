//! The [`Task`] trait, [`WorkItem`] wrapper, and execution context.
//!
//! A `Task` is the user-supplied body of work; a `WorkItem` binds one
//! task to a unique identity for a single submission. The pool passes a
//! [`TaskContext`] into the body, giving it access to the cooperative
//! suspend primitive without any global state: producers hold handles,
//! bodies hold contexts.

use std::fmt;
use std::sync::Arc;

use crate::error::{ParkError, TaskError};
use crate::id::WorkItemId;

/// A unit of executable work.
///
/// Implementations must be `Send + Sync`: the pool runs tasks on worker
/// threads and repeating schedules share one task across firings. State
/// that mutates across runs goes behind interior mutability (atomics,
/// channels).
pub trait Task: Send + Sync {
    /// Short human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Execute the body once.
    ///
    /// Errors are isolated at the item boundary: the pool logs them and
    /// treats the item as finished. They never reach sibling items or
    /// the scheduler driver.
    fn run(&self, ctx: &TaskContext<'_>) -> Result<(), TaskError>;
}

/// The suspend/resume seam implemented by the worker pool.
///
/// Lives here so that [`TaskContext`] can stay in the leaf crate while
/// the pool implementation lives in the engine crate.
pub trait Suspender: Send + Sync {
    /// Suspend the running item with the given identity until an
    /// explicit wake. Blocks the calling thread.
    fn park(&self, id: WorkItemId) -> Result<(), ParkError>;

    /// Wake a parked item. Returns `true` if the item was parked and is
    /// now queued for resumption; `false` makes spurious or duplicate
    /// wakes harmless no-ops.
    fn wake(&self, id: WorkItemId) -> bool;
}

/// Execution context passed into [`Task::run`].
///
/// Borrows the pool (as a [`Suspender`]) and the item being executed.
/// This is the explicit replacement for process-wide simulation state:
/// a body reaches the kernel only through its context.
pub struct TaskContext<'a> {
    suspender: &'a dyn Suspender,
    item: &'a WorkItem,
}

impl<'a> TaskContext<'a> {
    /// Build a context for one execution. Called by the pool's worker.
    pub fn new(suspender: &'a dyn Suspender, item: &'a WorkItem) -> Self {
        Self { suspender, item }
    }

    /// The item currently executing.
    pub fn item(&self) -> &WorkItem {
        self.item
    }

    /// Suspend this item until another item wakes it.
    ///
    /// Frees the item's capacity slot while suspended. Returns
    /// [`ParkError::Cancelled`] if the wake was forced by shutdown, so
    /// bodies can simply write `ctx.park()?`.
    pub fn park(&self) -> Result<(), ParkError> {
        self.suspender.park(self.item.id())
    }

    /// Wake another item if it is currently parked.
    ///
    /// Returns `false` (a no-op) if the target is not parked.
    pub fn wake(&self, other: &WorkItem) -> bool {
        self.suspender.wake(other.id())
    }
}

/// An immutable unit of work: one task bound to one submission identity.
///
/// Cheap to clone (the task is shared behind an `Arc`); never mutated
/// after creation. A work item is submitted to a pool exactly once —
/// repeating schedules produce a fresh item per firing via
/// [`WorkItem::next_firing`].
#[derive(Clone)]
pub struct WorkItem {
    id: WorkItemId,
    task: Arc<dyn Task>,
}

impl WorkItem {
    /// Wrap a task in a new item with a fresh identity.
    pub fn new(task: Arc<dyn Task>) -> Self {
        Self {
            id: WorkItemId::next(),
            task,
        }
    }

    /// Build an item from a closure.
    pub fn from_fn<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TaskContext<'_>) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        Self::new(Arc::new(FnTask {
            name: name.into(),
            body,
        }))
    }

    /// The item's unique identity — the park/wake pairing key.
    pub fn id(&self) -> WorkItemId {
        self.id
    }

    /// The underlying task body.
    pub fn task(&self) -> &dyn Task {
        self.task.as_ref()
    }

    /// The task's name, for logs.
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// A new item sharing this task but carrying a fresh identity.
    ///
    /// Used by repeating schedules: each firing is a distinct
    /// submission with its own park/wake identity.
    pub fn next_firing(&self) -> WorkItem {
        Self::new(Arc::clone(&self.task))
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("id", &self.id)
            .field("name", &self.task.name())
            .finish()
    }
}

/// Closure-backed [`Task`].
struct FnTask<F> {
    name: String,
    body: F,
}

impl<F> Task for FnTask<F>
where
    F: Fn(&TaskContext<'_>) -> Result<(), TaskError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
        (self.body)(ctx)
    }
}
