//! # Inbound Port - AbciClient
//!
//! Driving port used by the node's connections (mempool, consensus, query).
//!
//! ## Call Classes
//!
//! | Methods | Path | Exclusivity lock |
//! |---------|------|------------------|
//! | `check_tx_async`, `deliver_tx_async` | ordered pipeline | write, per item |
//! | `commit_*`, `end_block_*` | commit barrier | write |
//! | `set_option_*`, `init_chain_*`, `begin_block_*`, `re_check_tx_async`, `check_tx_sync`, `deliver_tx_sync` | direct | write |
//! | `info_*`, `query_*` | direct | read |
//! | `echo_*`, `flush_*` | answered locally | none |
//!
//! `*_async` calls return a [`ReqRes`] and deliver the response to the global
//! callback. `*_sync` calls return the response and skip the global callback.

use shared_types::{
    RequestBeginBlock, RequestEndBlock, RequestInfo, RequestInitChain, RequestQuery,
    RequestSetOption, ResponseBeginBlock, ResponseCheckTx, ResponseCommit, ResponseDeliverTx,
    ResponseEcho, ResponseEndBlock, ResponseInfo, ResponseInitChain, ResponseQuery,
    ResponseSetOption, Tx,
};

use crate::domain::{ClientError, ReqRes};
use crate::ports::outbound::Callback;

/// Client API for one host connection.
///
/// # Example
///
/// ```rust,ignore
/// use qc_concurrent::{AbciClient, ClientCreator, LocalAsyncClientCreator};
///
/// let creator = LocalAsyncClientCreator::new(app)?;
/// let mempool = creator.new_abci_client()?;
/// mempool.start()?;
///
/// let res = mempool.check_tx_async(tx)?;
/// res.set_callback(|response| println!("{:?}", response));
/// ```
pub trait AbciClient: Send + Sync {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Spawn the ordered workers.
    ///
    /// # Errors
    /// - `AlreadyStarted`: called on a running or stopped client
    /// - `WorkerSpawn`: a worker thread could not be created
    fn start(&self) -> Result<(), ClientError>;

    /// Close both queues and wait for already admitted items to resolve.
    ///
    /// Must not be called from a response callback.
    fn stop(&self) -> Result<(), ClientError>;

    fn is_running(&self) -> bool;

    /// Install the global callback. Takes the exclusivity lock in write mode.
    fn set_response_callback(&self, callback: Callback);

    /// Sticky transport error. Always `Ok` for in-process clients.
    fn error(&self) -> Result<(), ClientError>;

    // =========================================================================
    // ASYNC
    // =========================================================================

    fn flush_async(&self) -> ReqRes;

    fn echo_async(&self, message: String) -> ReqRes;

    fn info_async(&self, req: RequestInfo) -> ReqRes;

    fn set_option_async(&self, req: RequestSetOption) -> ReqRes;

    fn query_async(&self, req: RequestQuery) -> ReqRes;

    /// Admit a transaction into the check_tx pipeline.
    ///
    /// Blocks while a commit-class call holds the barrier and while the
    /// ordered queue is full.
    ///
    /// # Errors
    /// - `NotRunning`: before `start()` or after `stop()`
    fn check_tx_async(&self, tx: Tx) -> Result<ReqRes, ClientError>;

    /// Admit a transaction into the deliver_tx pipeline.
    ///
    /// # Errors
    /// - `NotRunning`: before `start()` or after `stop()`
    fn deliver_tx_async(&self, tx: Tx) -> Result<ReqRes, ClientError>;

    /// Re-check an already admitted transaction. Bypasses the pipeline.
    fn re_check_tx_async(&self, tx: Tx) -> ReqRes;

    fn init_chain_async(&self, req: RequestInitChain) -> ReqRes;

    fn begin_block_async(&self, req: RequestBeginBlock) -> ReqRes;

    /// Runs behind the commit barrier.
    fn end_block_async(&self, req: RequestEndBlock) -> ReqRes;

    /// Runs behind the commit barrier.
    fn commit_async(&self) -> ReqRes;

    // =========================================================================
    // SYNC
    // =========================================================================

    fn flush_sync(&self) -> Result<(), ClientError>;

    fn echo_sync(&self, message: String) -> Result<ResponseEcho, ClientError>;

    fn info_sync(&self, req: RequestInfo) -> Result<ResponseInfo, ClientError>;

    fn set_option_sync(&self, req: RequestSetOption) -> Result<ResponseSetOption, ClientError>;

    fn query_sync(&self, req: RequestQuery) -> Result<ResponseQuery, ClientError>;

    /// Full check under the write lock, without pre-validation.
    fn check_tx_sync(&self, tx: Tx) -> Result<ResponseCheckTx, ClientError>;

    /// Full execution under the write lock, without pre-validation.
    fn deliver_tx_sync(&self, tx: Tx) -> Result<ResponseDeliverTx, ClientError>;

    fn init_chain_sync(&self, req: RequestInitChain) -> Result<ResponseInitChain, ClientError>;

    fn begin_block_sync(&self, req: RequestBeginBlock) -> Result<ResponseBeginBlock, ClientError>;

    /// Runs behind the commit barrier.
    fn end_block_sync(&self, req: RequestEndBlock) -> Result<ResponseEndBlock, ClientError>;

    /// Runs behind the commit barrier.
    fn commit_sync(&self) -> Result<ResponseCommit, ClientError>;
}

/// Factory for clients that share one application and one coordinator.
pub trait ClientCreator: Send + Sync {
    fn new_abci_client(&self) -> Result<Box<dyn AbciClient>, ClientError>;
}
