//! # Application Contract
//!
//! The state machine behind the consensus engine. Every method is a plain,
//! blocking call. Implementations must be `Send + Sync` because the node
//! calls them from several threads, but they may assume nothing about
//! internal concurrency beyond what the calling client guarantees.
//!
//! ## Capability Sets
//!
//! | Trait | Methods | Required by |
//! |-------|---------|-------------|
//! | `Application` | info, set_option, query, check_tx, init_chain, begin_block, deliver_tx, end_block, commit | every client |
//! | `ConcurrentApplication` | pre_check_tx, pre_deliver_tx, re_check_tx | the concurrent client |
//!
//! An application advertises the concurrent set by overriding
//! [`Application::as_concurrent`]. Clients that need it fail construction
//! otherwise.

use std::sync::Arc;

use crate::abci::{
    RequestBeginBlock, RequestEndBlock, RequestInfo, RequestInitChain, RequestQuery,
    RequestSetOption, ResponseBeginBlock, ResponseCheckTx, ResponseCommit, ResponseDeliverTx,
    ResponseEndBlock, ResponseInfo, ResponseInitChain, ResponseQuery, ResponseSetOption,
};

/// Base ABCI application contract.
pub trait Application: Send + Sync {
    fn info(&self, req: RequestInfo) -> ResponseInfo;

    fn set_option(&self, req: RequestSetOption) -> ResponseSetOption;

    fn query(&self, req: RequestQuery) -> ResponseQuery;

    /// Full, stateful admission check.
    fn check_tx(&self, tx: &[u8]) -> ResponseCheckTx;

    fn init_chain(&self, req: RequestInitChain) -> ResponseInitChain;

    fn begin_block(&self, req: RequestBeginBlock) -> ResponseBeginBlock;

    /// State-mutating execution of a transaction.
    fn deliver_tx(&self, tx: &[u8]) -> ResponseDeliverTx;

    fn end_block(&self, req: RequestEndBlock) -> ResponseEndBlock;

    fn commit(&self) -> ResponseCommit;

    /// Upcast to the concurrent capability set, if implemented.
    fn as_concurrent(self: Arc<Self>) -> Option<Arc<dyn ConcurrentApplication>> {
        None
    }
}

/// Capability set needed to pipeline check/deliver calls.
///
/// `pre_check_tx` and `pre_deliver_tx` must be pure functions of the
/// transaction: they run on pool threads in no particular order and
/// concurrently with every other call.
pub trait ConcurrentApplication: Application {
    /// Stateless half of `check_tx` (signatures, format, dedup).
    fn pre_check_tx(&self, tx: &[u8]) -> ResponseCheckTx;

    /// Stateless half of `deliver_tx`.
    fn pre_deliver_tx(&self, tx: &[u8]) -> ResponseDeliverTx;

    /// Re-check of an already admitted transaction after a block boundary.
    fn re_check_tx(&self, tx: &[u8]) -> ResponseCheckTx;
}
