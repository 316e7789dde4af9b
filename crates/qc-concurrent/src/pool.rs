//! # Pre-validation Pool
//!
//! Bounded thread pool running the order-independent half of a pipeline.
//!
//! ```text
//!                schedule(task)
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//!   work queue (bounded)    worker slot free?
//!          │                       │ yes: spawn worker
//!          ▼                       ▼
//!   ┌──────────┐ ┌──────────┐ ┌──────────┐
//!   │ worker 0 │ │ worker 1 │ │ worker n │   n < size
//!   └──────────┘ └──────────┘ └──────────┘
//! ```
//!
//! `spawn` workers start with the pool. `schedule` hands the task to the
//! queue if there is room, otherwise grows the pool by one worker, and
//! blocks when both the queue and the worker slots are exhausted.
//!
//! Tasks are isolated: a panicking task is logged and the worker keeps
//! going. Tasks carry no ordering guarantee.

use crossbeam_channel::{bounded, Receiver, Select, Sender};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

use crate::config::PoolConfig;
use crate::domain::ClientError;

/// Unit of work accepted by the pool.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Holds one worker slot; frees it when the worker exits.
struct WorkerSlot {
    sem_rx: Receiver<()>,
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        let _ = self.sem_rx.try_recv();
    }
}

/// Bounded pool of pre-validation threads.
pub struct PrevalidationPool {
    name: &'static str,
    work_tx: Mutex<Option<Sender<Task>>>,
    work_rx: Receiver<Task>,
    sem_tx: Sender<()>,
    sem_rx: Receiver<()>,
    spawned: AtomicUsize,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl PrevalidationPool {
    /// Build the pool and start `config.spawn` workers.
    pub fn new(name: &'static str, config: PoolConfig) -> Result<Self, ClientError> {
        let (work_tx, work_rx) = bounded(config.queue);
        let (sem_tx, sem_rx) = bounded(config.size);

        let pool = Self {
            name,
            work_tx: Mutex::new(Some(work_tx)),
            work_rx,
            sem_tx,
            sem_rx,
            spawned: AtomicUsize::new(0),
            workers: Mutex::new(Vec::new()),
        };

        for _ in 0..config.spawn {
            if pool.sem_tx.try_send(()).is_err() {
                break;
            }
            pool.spawn_worker()?;
        }

        debug!(
            pool = name,
            size = config.size,
            queue = config.queue,
            spawn = config.spawn,
            "Pre-validation pool started"
        );
        Ok(pool)
    }

    /// Run `task` on a pool thread.
    ///
    /// Blocks while the queue is full and no worker slot is free. After
    /// [`shutdown`](Self::shutdown) the task runs on the calling thread.
    pub fn schedule(&self, task: Task) {
        let Some(work_tx) = self.work_tx.lock().clone() else {
            debug!(pool = self.name, "Pool closed, running task inline");
            run_task(self.name, task);
            return;
        };

        let mut select = Select::new();
        let work_op = select.send(&work_tx);
        select.send(&self.sem_tx);
        let oper = select.select();

        if oper.index() == work_op {
            if let Err(err) = oper.send(&work_tx, task) {
                run_task(self.name, err.into_inner());
            }
            return;
        }

        if oper.send(&self.sem_tx, ()).is_err() {
            run_task(self.name, task);
            return;
        }
        match self.spawn_worker() {
            Ok(()) => {
                if let Err(err) = work_tx.send(task) {
                    run_task(self.name, err.into_inner());
                }
            }
            Err(err) => {
                warn!(pool = self.name, error = %err, "Running task inline");
                run_task(self.name, task);
            }
        }
    }

    /// Number of live worker threads.
    pub fn workers(&self) -> usize {
        self.sem_rx.len()
    }

    /// Stop accepting queued work and join every worker.
    ///
    /// Tasks already queued still run before the workers exit.
    pub fn shutdown(&self) {
        self.close();
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if worker.join().is_err() {
                error!(pool = self.name, "Pre-validation worker panicked");
            }
        }
    }

    fn close(&self) {
        self.work_tx.lock().take();
    }

    /// Spawn one worker. The caller must already hold its slot.
    fn spawn_worker(&self) -> Result<(), ClientError> {
        let id = self.spawned.fetch_add(1, Ordering::Relaxed);
        let thread_name = format!("{}-prevalidate-{}", self.name, id);
        let pool = self.name;
        let work_rx = self.work_rx.clone();
        let slot = WorkerSlot {
            sem_rx: self.sem_rx.clone(),
        };

        let spawned = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let _slot = slot;
                for task in work_rx.iter() {
                    run_task(pool, task);
                }
            });

        match spawned {
            Ok(handle) => {
                self.workers.lock().push(handle);
                Ok(())
            }
            Err(source) => {
                // The closure, and with it the slot, was dropped by the failed spawn.
                Err(ClientError::WorkerSpawn {
                    name: thread_name,
                    source,
                })
            }
        }
    }
}

impl Drop for PrevalidationPool {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_task(pool: &'static str, task: Task) {
    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
        error!(pool, "Pre-validation task panicked");
    }
}
