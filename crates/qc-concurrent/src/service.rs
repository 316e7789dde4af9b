//! # Async Local Client
//!
//! In-process [`AbciClient`] that pipelines check_tx and deliver_tx through
//! ordered queues and routes every other call through the coordinator's
//! lock set.

use quantum_telemetry::{component_span, log_tx_event, PIPELINE_SUBMISSIONS};
use shared_types::{
    Application, ConcurrentApplication, Request, RequestBeginBlock, RequestCommit,
    RequestEcho, RequestEndBlock, RequestFlush, RequestInfo, RequestInitChain, RequestQuery,
    RequestSetOption, Response, ResponseBeginBlock, ResponseCheckTx, ResponseCommit,
    ResponseDeliverTx, ResponseEcho, ResponseEndBlock, ResponseFlush, ResponseInfo,
    ResponseInitChain, ResponseQuery, ResponseSetOption, Tx, TxHash,
};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ConcurrencyConfig;
use crate::domain::{ClientError, PipelineCoordinator, ReqRes, WorkItem};
use crate::pipeline::{app_call, ExecutionContext, Pipeline, PipelineKind};
use crate::ports::inbound::AbciClient;
use crate::ports::outbound::{Callback, CallbackSlot};

const CREATED: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Concurrent in-process ABCI client.
///
/// Clients built against the same [`PipelineCoordinator`] share the lock set
/// and the in-flight counter, so a commit on one client waits for check_tx
/// work admitted through another.
pub struct AsyncLocalClient {
    ctx: Arc<ExecutionContext>,
    check_tx: Pipeline,
    deliver_tx: Pipeline,
    state: AtomicU8,
}

impl AsyncLocalClient {
    pub fn new(
        app: Arc<dyn ConcurrentApplication>,
        coordinator: Arc<PipelineCoordinator>,
        config: &ConcurrencyConfig,
    ) -> Result<Self, ClientError> {
        config.validate()?;

        Ok(Self {
            ctx: Arc::new(ExecutionContext {
                app,
                coordinator,
                callback: CallbackSlot::new(),
            }),
            check_tx: Pipeline::new(
                PipelineKind::CheckTx,
                config.check_tx_pool,
                config.queue_capacity,
            )?,
            deliver_tx: Pipeline::new(
                PipelineKind::DeliverTx,
                config.deliver_tx_pool,
                config.queue_capacity,
            )?,
            state: AtomicU8::new(CREATED),
        })
    }

    /// Wrap an application, failing if it lacks the concurrent capability set.
    pub fn from_application(
        app: Arc<dyn Application>,
        coordinator: Arc<PipelineCoordinator>,
        config: &ConcurrencyConfig,
    ) -> Result<Self, ClientError> {
        let app = app.as_concurrent().ok_or(ClientError::MissingCapability)?;
        Self::new(app, coordinator, config)
    }

    pub fn coordinator(&self) -> &Arc<PipelineCoordinator> {
        &self.ctx.coordinator
    }

    fn ensure_running(&self) -> Result<(), ClientError> {
        if self.state.load(Ordering::Acquire) == RUNNING {
            Ok(())
        } else {
            Err(ClientError::NotRunning)
        }
    }

    /// Admit `request` into `pipeline` and schedule its pre-validation.
    fn submit(&self, pipeline: &Pipeline, request: Request) -> Result<ReqRes, ClientError> {
        self.ensure_running()?;

        let label = pipeline.kind().label();
        let (item, opener) = WorkItem::new(request);
        let req_res = item.req_res().clone();
        let tx_hash = item.tx_hash();

        let coordinator = &self.ctx.coordinator;
        let enqueue = || pipeline.enqueue(item);
        match pipeline.kind() {
            PipelineKind::CheckTx => coordinator.admit_check_tx(enqueue)?,
            PipelineKind::DeliverTx => coordinator.admit_deliver_tx(enqueue)?,
        }

        PIPELINE_SUBMISSIONS.with_label_values(&[label]).inc();
        log_tx_event!(debug, label, "Enqueued", tx_hash);

        pipeline.schedule_prevalidation(&self.ctx.app, req_res.clone(), opener);
        Ok(req_res)
    }

    /// Read-only direct call.
    fn read<R>(
        &self,
        method: &'static str,
        call: impl FnOnce(&dyn ConcurrentApplication) -> R,
    ) -> R {
        let app = self.ctx.app.as_ref();
        self.ctx
            .coordinator
            .shared(|| app_call(method, || call(app)))
    }

    /// State-mutating direct call.
    fn write<R>(
        &self,
        method: &'static str,
        call: impl FnOnce(&dyn ConcurrentApplication) -> R,
    ) -> R {
        let app = self.ctx.app.as_ref();
        self.ctx
            .coordinator
            .exclusive(|| app_call(method, || call(app)))
    }

    /// Commit-class call behind the barrier.
    fn barrier<R>(
        &self,
        method: &'static str,
        call: impl FnOnce(&dyn ConcurrentApplication) -> R,
    ) -> R {
        let _span = component_span!("commit_barrier", method).entered();
        let app = self.ctx.app.as_ref();
        let response = self
            .ctx
            .coordinator
            .commit_barrier(|| app_call(method, || call(app)));
        debug!(method, "Commit barrier released");
        response
    }

    /// Wrap an answered call in a done handle and notify the global callback.
    fn deliver(&self, request: Request, response: Response) -> ReqRes {
        self.ctx.callback.invoke(&request, &response);
        ReqRes::resolved(request, response)
    }
}

impl AbciClient for AsyncLocalClient {
    fn start(&self) -> Result<(), ClientError> {
        self.state
            .compare_exchange(CREATED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ClientError::AlreadyStarted)?;

        if !self.ctx.callback.is_set() {
            warn!("Starting ABCI client without a response callback");
        }

        let started = self
            .check_tx
            .start(Arc::clone(&self.ctx))
            .and_then(|()| self.deliver_tx.start(Arc::clone(&self.ctx)));
        if let Err(err) = started {
            self.state.store(STOPPED, Ordering::Release);
            self.check_tx.close();
            self.deliver_tx.close();
            self.check_tx.join();
            self.deliver_tx.join();
            return Err(err);
        }

        info!("Concurrent ABCI client started");
        Ok(())
    }

    fn stop(&self) -> Result<(), ClientError> {
        let previous = self.state.swap(STOPPED, Ordering::AcqRel);
        if previous == STOPPED {
            return Err(ClientError::NotRunning);
        }

        self.ctx.coordinator.with_commit_lock(|| {
            self.check_tx.close();
            self.deliver_tx.close();
        });
        self.check_tx.join();
        self.deliver_tx.join();

        info!("Concurrent ABCI client stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    fn set_response_callback(&self, callback: Callback) {
        self.ctx.coordinator.exclusive(|| {
            self.ctx.callback.replace(callback);
        });
    }

    fn error(&self) -> Result<(), ClientError> {
        Ok(())
    }

    // =========================================================================
    // ASYNC
    // =========================================================================

    fn flush_async(&self) -> ReqRes {
        ReqRes::resolved(
            Request::Flush(RequestFlush),
            Response::Flush(ResponseFlush),
        )
    }

    fn echo_async(&self, message: String) -> ReqRes {
        self.deliver(
            Request::Echo(RequestEcho {
                message: message.clone(),
            }),
            Response::Echo(ResponseEcho { message }),
        )
    }

    fn info_async(&self, req: RequestInfo) -> ReqRes {
        let res = self.read("info", |app| app.info(req.clone()));
        self.deliver(Request::Info(req), Response::Info(res))
    }

    fn set_option_async(&self, req: RequestSetOption) -> ReqRes {
        let res = self.write("set_option", |app| app.set_option(req.clone()));
        self.deliver(Request::SetOption(req), Response::SetOption(res))
    }

    fn query_async(&self, req: RequestQuery) -> ReqRes {
        let res = self.read("query", |app| app.query(req.clone()));
        self.deliver(Request::Query(req), Response::Query(res))
    }

    fn check_tx_async(&self, tx: Tx) -> Result<ReqRes, ClientError> {
        self.submit(&self.check_tx, Request::check_tx(tx))
    }

    fn deliver_tx_async(&self, tx: Tx) -> Result<ReqRes, ClientError> {
        self.submit(&self.deliver_tx, Request::deliver_tx(tx))
    }

    fn re_check_tx_async(&self, tx: Tx) -> ReqRes {
        let res = self.write("re_check_tx", |app| app.re_check_tx(&tx));
        log_tx_event!(debug, "re_check_tx", "Re-checked", TxHash::of(&tx));
        self.deliver(Request::check_tx(tx), Response::CheckTx(res))
    }

    fn init_chain_async(&self, req: RequestInitChain) -> ReqRes {
        let res = self.write("init_chain", |app| app.init_chain(req.clone()));
        self.deliver(Request::InitChain(req), Response::InitChain(res))
    }

    fn begin_block_async(&self, req: RequestBeginBlock) -> ReqRes {
        let res = self.write("begin_block", |app| app.begin_block(req.clone()));
        self.deliver(Request::BeginBlock(req), Response::BeginBlock(res))
    }

    fn end_block_async(&self, req: RequestEndBlock) -> ReqRes {
        let res = self.barrier("end_block", |app| app.end_block(req.clone()));
        self.deliver(Request::EndBlock(req), Response::EndBlock(res))
    }

    fn commit_async(&self) -> ReqRes {
        let res = self.barrier("commit", |app| app.commit());
        self.deliver(Request::Commit(RequestCommit), Response::Commit(res))
    }

    // =========================================================================
    // SYNC
    // =========================================================================

    fn flush_sync(&self) -> Result<(), ClientError> {
        Ok(())
    }

    fn echo_sync(&self, message: String) -> Result<ResponseEcho, ClientError> {
        Ok(ResponseEcho { message })
    }

    fn info_sync(&self, req: RequestInfo) -> Result<ResponseInfo, ClientError> {
        Ok(self.read("info", |app| app.info(req)))
    }

    fn set_option_sync(&self, req: RequestSetOption) -> Result<ResponseSetOption, ClientError> {
        Ok(self.write("set_option", |app| app.set_option(req)))
    }

    fn query_sync(&self, req: RequestQuery) -> Result<ResponseQuery, ClientError> {
        Ok(self.read("query", |app| app.query(req)))
    }

    fn check_tx_sync(&self, tx: Tx) -> Result<ResponseCheckTx, ClientError> {
        Ok(self.write("check_tx", |app| app.check_tx(&tx)))
    }

    fn deliver_tx_sync(&self, tx: Tx) -> Result<ResponseDeliverTx, ClientError> {
        Ok(self.write("deliver_tx", |app| app.deliver_tx(&tx)))
    }

    fn init_chain_sync(&self, req: RequestInitChain) -> Result<ResponseInitChain, ClientError> {
        Ok(self.write("init_chain", |app| app.init_chain(req)))
    }

    fn begin_block_sync(&self, req: RequestBeginBlock) -> Result<ResponseBeginBlock, ClientError> {
        Ok(self.write("begin_block", |app| app.begin_block(req)))
    }

    fn end_block_sync(&self, req: RequestEndBlock) -> Result<ResponseEndBlock, ClientError> {
        Ok(self.barrier("end_block", |app| app.end_block(req)))
    }

    fn commit_sync(&self) -> Result<ResponseCommit, ClientError> {
        Ok(self.barrier("commit", |app| app.commit()))
    }
}

impl Drop for AsyncLocalClient {
    fn drop(&mut self) {
        // Workers drain what is queued and exit on their own.
        self.check_tx.close();
        self.deliver_tx.close();
    }
}
