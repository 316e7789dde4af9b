//! # Ordered Pipelines
//!
//! One pipeline per tx-carrying call: a bounded FIFO queue drained by a
//! single ordered worker, fed by a pre-validation pool.
//!
//! ```text
//! submit ──► queue (FIFO, bounded) ──► ordered worker ──► application
//!    │                                       ▲
//!    └──► pre-validation pool ── opens gate ─┘
//! ```
//!
//! The worker handles items strictly in queue order. For each item it waits
//! for the gate, takes the exclusivity lock in write mode, calls the
//! application unless pre-validation already produced a rejection, marks the
//! item done, decrements the in-flight counter and delivers callbacks before
//! releasing the lock.
//!
//! A panic inside the application's `check_tx`/`deliver_tx` resolves that
//! item with [`APPLICATION_PANIC_CODE`]; the worker moves on to the next one.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use quantum_telemetry::{
    log_event, log_tx_event, time_histogram, APP_CALLS, APP_CALL_DURATION,
    PREVALIDATION_REJECTIONS,
};
use shared_types::{ConcurrentApplication, Response, ResponseCheckTx, ResponseDeliverTx};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

use crate::config::PoolConfig;
use crate::domain::{ClientError, GateOpener, PipelineCoordinator, ReqRes, WorkItem};
use crate::pool::PrevalidationPool;
use crate::ports::outbound::CallbackSlot;

/// Response code for an item whose application call panicked.
pub const APPLICATION_PANIC_CODE: u32 = u32::MAX;

/// Which tx-carrying call a pipeline serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineKind {
    CheckTx,
    DeliverTx,
}

impl PipelineKind {
    pub fn label(self) -> &'static str {
        match self {
            PipelineKind::CheckTx => "check_tx",
            PipelineKind::DeliverTx => "deliver_tx",
        }
    }

    /// Stateless half. `Some` carries a rejection that replaces the real call.
    fn prevalidate(self, app: &dyn ConcurrentApplication, tx: &[u8]) -> Option<Response> {
        match self {
            PipelineKind::CheckTx => {
                let res = app.pre_check_tx(tx);
                (!res.is_ok()).then_some(Response::CheckTx(res))
            }
            PipelineKind::DeliverTx => {
                let res = app.pre_deliver_tx(tx);
                (!res.is_ok()).then_some(Response::DeliverTx(res))
            }
        }
    }

    fn execute(self, app: &dyn ConcurrentApplication, tx: &[u8]) -> Response {
        match self {
            PipelineKind::CheckTx => Response::CheckTx(app.check_tx(tx)),
            PipelineKind::DeliverTx => Response::DeliverTx(app.deliver_tx(tx)),
        }
    }

    fn panicked(self) -> Response {
        const LOG: &str = "application panicked";
        match self {
            PipelineKind::CheckTx => {
                Response::CheckTx(ResponseCheckTx::rejected(APPLICATION_PANIC_CODE, LOG))
            }
            PipelineKind::DeliverTx => {
                Response::DeliverTx(ResponseDeliverTx::rejected(APPLICATION_PANIC_CODE, LOG))
            }
        }
    }
}

/// Everything an ordered worker needs, shared with the owning client.
pub struct ExecutionContext {
    pub app: Arc<dyn ConcurrentApplication>,
    pub coordinator: Arc<PipelineCoordinator>,
    pub callback: CallbackSlot,
}

/// Count and time one application call.
pub(crate) fn app_call<R>(method: &'static str, call: impl FnOnce() -> R) -> R {
    APP_CALLS.with_label_values(&[method]).inc();
    let _timer = time_histogram!(APP_CALL_DURATION.with_label_values(&[method]));
    call()
}

/// Queue, pool and worker for one pipeline.
pub struct Pipeline {
    kind: PipelineKind,
    queue_tx: Mutex<Option<Sender<WorkItem>>>,
    queue_rx: Mutex<Option<Receiver<WorkItem>>>,
    pool: PrevalidationPool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Pipeline {
    pub fn new(
        kind: PipelineKind,
        pool: PoolConfig,
        queue_capacity: usize,
    ) -> Result<Self, ClientError> {
        let (queue_tx, queue_rx) = bounded(queue_capacity);
        Ok(Self {
            kind,
            queue_tx: Mutex::new(Some(queue_tx)),
            queue_rx: Mutex::new(Some(queue_rx)),
            pool: PrevalidationPool::new(kind.label(), pool)?,
            worker: Mutex::new(None),
        })
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    /// Spawn the ordered worker. Fails if it was ever started before.
    pub fn start(&self, ctx: Arc<ExecutionContext>) -> Result<(), ClientError> {
        let queue_rx = self
            .queue_rx
            .lock()
            .take()
            .ok_or(ClientError::AlreadyStarted)?;
        let kind = self.kind;
        let name = format!("{}-ordered", kind.label());

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                log_event!(debug, kind.label(), "Ordered worker started");
                for item in queue_rx.iter() {
                    resolve(kind, &ctx, item);
                }
                log_event!(debug, kind.label(), "Ordered worker drained");
            })
            .map_err(|source| ClientError::WorkerSpawn { name, source })?;

        *self.worker.lock() = Some(handle);
        Ok(())
    }

    /// Append an item to the queue, blocking while it is full.
    pub fn enqueue(&self, item: WorkItem) -> Result<(), ClientError> {
        let queue_tx = self
            .queue_tx
            .lock()
            .clone()
            .ok_or(ClientError::NotRunning)?;
        queue_tx.send(item).map_err(|_| ClientError::NotRunning)
    }

    /// Hand the item's pre-validation to the pool.
    ///
    /// The gate opens when the task finishes, or when the task is dropped.
    pub fn schedule_prevalidation(
        &self,
        app: &Arc<dyn ConcurrentApplication>,
        req_res: ReqRes,
        opener: GateOpener,
    ) {
        let app = Arc::clone(app);
        let kind = self.kind;
        self.pool.schedule(Box::new(move || {
            let tx = req_res.request().tx().unwrap_or_default();
            if let Some(rejection) = kind.prevalidate(app.as_ref(), tx) {
                PREVALIDATION_REJECTIONS
                    .with_label_values(&[kind.label()])
                    .inc();
                debug!(pipeline = kind.label(), "Pre-validation rejected tx");
                req_res.set_response(rejection);
            }
            opener.open();
        }));
    }

    /// Stop accepting items. Already queued items still resolve.
    pub fn close(&self) {
        self.queue_tx.lock().take();
        // A never-started pipeline has nobody to drain its queue.
        self.queue_rx.lock().take();
    }

    /// Wait for the worker to drain the queue, then stop the pool.
    pub fn join(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                error!(pipeline = self.kind.label(), "Ordered worker panicked");
            }
        }
        self.pool.shutdown();
        info!(pipeline = self.kind.label(), "Pipeline stopped");
    }
}

/// Resolve one item on the ordered worker.
fn resolve(kind: PipelineKind, ctx: &ExecutionContext, item: WorkItem) {
    item.gate.wait();

    let _app = ctx.coordinator.write_app();
    let req_res = &item.req_res;
    let response = match req_res.response() {
        Some(rejection) => rejection,
        None => {
            let tx = req_res.request().tx().unwrap_or_default();
            app_call(kind.label(), || execute_contained(kind, ctx.app.as_ref(), tx))
        }
    };

    let callback = req_res.set_done(response.clone());
    ctx.coordinator.in_flight().done();

    log_tx_event!(
        debug,
        kind.label(),
        "Resolved",
        item.tx_hash,
        code_ok = response.is_ok()
    );
    if let Some(callback) = callback {
        callback(&response);
    }
    ctx.callback.invoke(req_res.request(), &response);
}

fn execute_contained(kind: PipelineKind, app: &dyn ConcurrentApplication, tx: &[u8]) -> Response {
    match panic::catch_unwind(AssertUnwindSafe(|| kind.execute(app, tx))) {
        Ok(response) => response,
        Err(_) => {
            error!(pipeline = kind.label(), "Application panicked, item rejected");
            kind.panicked()
        }
    }
}
