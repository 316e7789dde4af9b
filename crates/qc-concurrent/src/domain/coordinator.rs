//! # Pipeline Coordinator
//!
//! Owns the lock set and the in-flight counter shared by every client a
//! creator hands out (mempool, consensus and query connections).
//!
//! ## Lock Set
//!
//! | Lock | Kind | Held by |
//! |------|------|---------|
//! | `admission` | mutex | check_tx submitters, for the whole admission step |
//! | `arbitration` | mutex | admission and commit, only while acquiring `commit` |
//! | `commit` | mutex | admission enqueue, or a commit-class call from arbitration to completion |
//! | `app` | rw lock | write: ordered workers, commit, mutating direct calls; read: info/query |
//!
//! ## Lock Order
//!
//! ```text
//! check_tx admission : admission → arbitration → commit → (release arbitration) → enqueue
//! commit / end_block : arbitration → commit → (release arbitration) → wait in-flight == 0 → app(write)
//! ordered worker     : app(write)
//! ```
//!
//! Every path acquires in this order, so no cycle exists. The ordered worker
//! never touches `commit`, which is what lets a commit waiting on the
//! in-flight counter make progress.
//!
//! ## Fairness
//!
//! The arbitration mutex narrows the window in which a burst of admissions
//! can keep re-acquiring `commit` ahead of a waiting commit, and
//! `parking_lot` mutexes hand off fairly under sustained contention. This is
//! a best-effort heuristic, not a starvation-freedom guarantee.

use parking_lot::{Condvar, Mutex, MutexGuard, RwLock, RwLockWriteGuard};
use quantum_telemetry::{time_histogram, COMMIT_BARRIER_WAIT, PIPELINE_IN_FLIGHT};
use tracing::debug;

/// Count of admitted-but-unresolved work items.
#[derive(Default)]
pub struct InFlightCounter {
    count: Mutex<usize>,
    drained: Condvar,
}

impl InFlightCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self) {
        let mut count = self.count.lock();
        *count += 1;
        PIPELINE_IN_FLIGHT.inc();
    }

    pub fn done(&self) {
        let mut count = self.count.lock();
        debug_assert!(*count > 0, "in-flight counter underflow");
        *count = count.saturating_sub(1);
        PIPELINE_IN_FLIGHT.dec();
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    pub fn get(&self) -> usize {
        *self.count.lock()
    }

    /// Block until the counter reaches zero.
    pub fn wait_zero(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.drained.wait(&mut count);
        }
    }
}

/// Lock set plus in-flight counter for one application.
#[derive(Default)]
pub struct PipelineCoordinator {
    admission: Mutex<()>,
    arbitration: Mutex<()>,
    commit: Mutex<()>,
    app: RwLock<()>,
    in_flight: InFlightCounter,
}

impl PipelineCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> &InFlightCounter {
        &self.in_flight
    }

    /// Arbitration then commit; arbitration is released on return.
    fn acquire_commit(&self) -> MutexGuard<'_, ()> {
        let _arbitration = self.arbitration.lock();
        self.commit.lock()
    }

    /// Admit one check_tx work item.
    ///
    /// `enqueue` runs with the admission and commit mutexes held, after the
    /// in-flight counter is incremented. The counter goes up before the item
    /// becomes visible to the worker so it can never be decremented first;
    /// a failed enqueue rolls it back. Both happen under the commit mutex, so
    /// a commit observes them as one step.
    pub fn admit_check_tx<T, E>(&self, enqueue: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let _admission = self.admission.lock();
        let _commit = self.acquire_commit();
        self.in_flight.add();
        enqueue().inspect_err(|_| self.in_flight.done())
    }

    /// Admit one deliver_tx work item.
    ///
    /// No locks: the host never runs deliver_tx concurrently with commit.
    pub fn admit_deliver_tx<T, E>(&self, enqueue: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        self.in_flight.add();
        enqueue().inspect_err(|_| self.in_flight.done())
    }

    /// Run a commit-class application call behind the barrier.
    ///
    /// Holds the commit mutex from before the in-flight wait until `call`
    /// returns, so no check_tx can be admitted in between.
    pub fn commit_barrier<R>(&self, call: impl FnOnce() -> R) -> R {
        debug!("Trying to get commit lock");
        let _commit = self.acquire_commit();
        {
            let _timer = time_histogram!(COMMIT_BARRIER_WAIT);
            self.in_flight.wait_zero();
        }
        let _app = self.app.write();
        debug!("Commit barrier passed");
        call()
    }

    /// Run `f` with the commit mutex held. Used to close queues on shutdown.
    pub fn with_commit_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _commit = self.commit.lock();
        f()
    }

    /// Run a state-mutating direct call.
    pub fn exclusive<R>(&self, call: impl FnOnce() -> R) -> R {
        let _app = self.app.write();
        call()
    }

    /// Run a read-only direct call.
    pub fn shared<R>(&self, call: impl FnOnce() -> R) -> R {
        let _app = self.app.read();
        call()
    }

    pub(crate) fn write_app(&self) -> RwLockWriteGuard<'_, ()> {
        self.app.write()
    }
}
