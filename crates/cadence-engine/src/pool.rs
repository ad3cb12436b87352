//! Bounded-parallelism worker pool with quiescence detection and
//! cooperative suspend/resume.
//!
//! Every submitted item is in exactly one of {queued, running, parked}
//! until it finishes. Capacity is a logical bound on the running set:
//! each in-flight item executes on its own named worker thread, and a
//! `park()` frees the item's slot while its thread blocks on a
//! bounded(1) rendezvous channel awaiting the matching `wake()`.
//!
//! Quiescence (queued and running both empty; parked excluded) and
//! termination (quiescent and shut down) are independently signalled
//! condition variables, notified strictly after the state mutation that
//! established them has been committed.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, error};

use cadence_core::{ParkError, SubmitError, Suspender, TaskContext, TaskError, WorkItem, WorkItemId};

/// Delivered to a parked thread through its rendezvous channel.
enum WakeSignal {
    /// The item was promoted back into a running slot; continue.
    Resume,
    /// Shutdown forced the wake; the body must stop waiting.
    Cancelled,
}

/// One slot in the FIFO queue.
enum Ticket {
    /// An item that has never started.
    Fresh(WorkItem),
    /// A woken item waiting for a free slot to resume in.
    Resumed {
        id: WorkItemId,
        waker: Sender<WakeSignal>,
    },
}

/// Pool bookkeeping. All mutation happens under one mutex.
struct PoolInner {
    queued: VecDeque<Ticket>,
    running: IndexSet<WorkItemId>,
    parked: IndexMap<WorkItemId, Sender<WakeSignal>>,
    shutdown: bool,
}

impl PoolInner {
    fn is_quiescent(&self) -> bool {
        self.queued.is_empty() && self.running.is_empty()
    }
}

struct PoolShared {
    inner: Mutex<PoolInner>,
    /// Signalled when queued and running drain to empty.
    quiesce_cv: Condvar,
    /// Signalled when the pool is both quiescent and shut down.
    terminate_cv: Condvar,
    max_parallelism: usize,
}

/// Bounded-parallelism executor for [`WorkItem`]s.
///
/// A cheap-to-clone handle; clones share one pool. Worker threads hold
/// a clone for the duration of their item, so the pool state outlives
/// every in-flight body.
#[derive(Clone)]
pub struct WorkerPool {
    shared: Arc<PoolShared>,
}

impl WorkerPool {
    /// Create a pool allowing up to `max_parallelism` simultaneously
    /// running items. A bound of zero is treated as one.
    pub fn new(max_parallelism: usize) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                inner: Mutex::new(PoolInner {
                    queued: VecDeque::new(),
                    running: IndexSet::new(),
                    parked: IndexMap::new(),
                    shutdown: false,
                }),
                quiesce_cv: Condvar::new(),
                terminate_cv: Condvar::new(),
                max_parallelism: max_parallelism.max(1),
            }),
        }
    }

    /// The configured parallelism bound.
    pub fn max_parallelism(&self) -> usize {
        self.shared.max_parallelism
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        self.shared.inner.lock().unwrap()
    }

    /// Enqueue an item and attempt promotion into a free running slot.
    ///
    /// May start execution on a worker thread before returning. Fails
    /// with [`SubmitError::Shutdown`] once shutdown has been requested.
    pub fn submit(&self, item: WorkItem) -> Result<(), SubmitError> {
        let mut inner = self.lock();
        if inner.shutdown {
            return Err(SubmitError::Shutdown);
        }
        debug!(item = %item.id(), task = item.name(), "submit");
        inner.queued.push_back(Ticket::Fresh(item));
        self.promote(&mut inner);
        Ok(())
    }

    /// Stop accepting new submissions; let queued and running items run
    /// to completion. Idempotent.
    ///
    /// Once only parked items remain, each is forcibly woken with a
    /// cancellation signal so that termination can complete. Items
    /// parked while a sibling is still legitimately running are left
    /// alone until the drain finishes.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        if inner.shutdown {
            return;
        }
        debug!("pool shutdown requested");
        inner.shutdown = true;
        self.settle(inner);
    }

    /// As [`shutdown`](Self::shutdown), but also removes items that
    /// never started and returns them. Resumption tickets already in
    /// the queue are cancelled; the currently running items still run
    /// to completion.
    pub fn shutdown_now(&self) -> Vec<WorkItem> {
        let mut inner = self.lock();
        inner.shutdown = true;
        let mut never_run = Vec::new();
        for ticket in inner.queued.drain(..) {
            match ticket {
                Ticket::Fresh(item) => never_run.push(item),
                Ticket::Resumed { waker, .. } => {
                    let _ = waker.send(WakeSignal::Cancelled);
                }
            }
        }
        debug!(interrupted = never_run.len(), "pool shutdown_now");
        self.settle(inner);
        never_run
    }

    /// True iff queued and running are both empty. Parked items are
    /// suspended, not active, and do not count.
    pub fn is_quiescent(&self) -> bool {
        self.lock().is_quiescent()
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    /// Quiescent and shut down.
    pub fn is_terminated(&self) -> bool {
        let inner = self.lock();
        inner.shutdown && inner.is_quiescent()
    }

    /// Block until the pool is quiescent.
    pub fn wait_quiescent(&self) {
        let inner = self.lock();
        let _inner = self
            .shared
            .quiesce_cv
            .wait_while(inner, |inner| !inner.is_quiescent())
            .unwrap();
    }

    /// Block until quiescent or the timeout elapses. Returns whether
    /// the pool was quiescent on return.
    pub fn wait_quiescent_timeout(&self, timeout: Duration) -> bool {
        let inner = self.lock();
        let (inner, _result) = self
            .shared
            .quiesce_cv
            .wait_timeout_while(inner, timeout, |inner| !inner.is_quiescent())
            .unwrap();
        inner.is_quiescent()
    }

    /// Block until terminated or the timeout elapses. Returns `false`
    /// immediately if shutdown was never requested.
    pub fn wait_terminated(&self, timeout: Duration) -> bool {
        let inner = self.lock();
        if !inner.shutdown {
            return false;
        }
        let (inner, _result) = self
            .shared
            .terminate_cv
            .wait_timeout_while(inner, timeout, |inner| !inner.is_quiescent())
            .unwrap();
        inner.shutdown && inner.is_quiescent()
    }

    /// Number of items waiting for a running slot.
    pub fn queued_len(&self) -> usize {
        self.lock().queued.len()
    }

    /// Number of items currently running.
    pub fn running_len(&self) -> usize {
        self.lock().running.len()
    }

    /// Number of items currently parked.
    pub fn parked_len(&self) -> usize {
        self.lock().parked.len()
    }

    /// Move queued tickets into free running slots until capacity is
    /// reached or the queue drains. Attempted after every state
    /// transition so a free slot is never left idle.
    fn promote(&self, inner: &mut PoolInner) {
        while inner.running.len() < self.shared.max_parallelism {
            let Some(ticket) = inner.queued.pop_front() else {
                break;
            };
            match ticket {
                Ticket::Fresh(item) => {
                    inner.running.insert(item.id());
                    self.spawn_runner(item);
                }
                Ticket::Resumed { id, waker } => {
                    inner.running.insert(id);
                    // The parked thread resumes inside its original
                    // park() call.
                    let _ = waker.send(WakeSignal::Resume);
                }
            }
        }
    }

    /// Common tail after a state transition: force-wake leftover parked
    /// items once a shutdown has drained, then notify whichever
    /// conditions now hold. The guard is dropped before notification.
    fn settle(&self, mut inner: MutexGuard<'_, PoolInner>) {
        if inner.shutdown && inner.is_quiescent() && !inner.parked.is_empty() {
            debug!(parked = inner.parked.len(), "cancelling parked items");
            for (_, waker) in inner.parked.drain(..) {
                let _ = waker.send(WakeSignal::Cancelled);
            }
        }
        let quiescent = inner.is_quiescent();
        let terminated = quiescent && inner.shutdown;
        drop(inner);
        if quiescent {
            self.shared.quiesce_cv.notify_all();
        }
        if terminated {
            self.shared.terminate_cv.notify_all();
        }
    }

    fn spawn_runner(&self, item: WorkItem) {
        let pool = self.clone();
        thread::Builder::new()
            .name(format!("cadence-worker-{}", item.id()))
            .spawn(move || pool.run_item(item))
            .expect("failed to spawn worker thread");
    }

    /// Execute one item's body and record it as finished. Errors and
    /// panics are isolated here: logged, never propagated to siblings
    /// or to the driver.
    fn run_item(&self, item: WorkItem) {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let ctx = TaskContext::new(self, &item);
            item.task().run(&ctx)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(TaskError::Cancelled)) => {
                debug!(item = %item.id(), task = item.name(), "item cancelled");
            }
            Ok(Err(e)) => {
                error!(item = %item.id(), task = item.name(), error = %e, "item failed");
            }
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "opaque panic payload".to_string());
                error!(item = %item.id(), task = item.name(), panic = %msg, "item panicked");
            }
        }
        self.finish(item.id());
    }

    /// Remove a finished item from the running set and promote.
    ///
    /// A force-cancelled item was already removed from the books when
    /// its wake was sent; its unwinding thread lands here as a no-op.
    fn finish(&self, id: WorkItemId) {
        let mut inner = self.lock();
        inner.running.shift_remove(&id);
        self.promote(&mut inner);
        self.settle(inner);
    }
}

impl Suspender for WorkerPool {
    /// Move the calling item from running to parked, free its capacity
    /// slot, and block until woken.
    fn park(&self, id: WorkItemId) -> Result<(), ParkError> {
        let rx = {
            let mut inner = self.lock();
            if inner.shutdown {
                return Err(ParkError::ShuttingDown);
            }
            if !inner.running.shift_remove(&id) {
                return Err(ParkError::NotRunning);
            }
            let (tx, rx) = bounded(1);
            inner.parked.insert(id, tx);
            debug!(item = %id, "parked");
            self.promote(&mut inner);
            // Parking the last active item can establish quiescence.
            self.settle(inner);
            rx
        };
        match rx.recv() {
            Ok(WakeSignal::Resume) => Ok(()),
            Ok(WakeSignal::Cancelled) | Err(_) => Err(ParkError::Cancelled),
        }
    }

    /// Move a parked item back into the queue and attempt promotion.
    /// A no-op unless the target is currently parked, so spurious or
    /// duplicate wakes cannot corrupt pool state.
    fn wake(&self, id: WorkItemId) -> bool {
        let mut inner = self.lock();
        let Some(waker) = inner.parked.shift_remove(&id) else {
            return false;
        };
        debug!(item = %id, "woken");
        inner.queued.push_back(Ticket::Resumed { id, waker });
        self.promote(&mut inner);
        true
    }
}
