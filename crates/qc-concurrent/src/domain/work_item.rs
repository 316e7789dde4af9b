//! Work items carried by the ordered queues.

use shared_types::{Request, TxHash};

use super::gate::{ordering_gate, GateOpener, GateWaiter};
use super::req_res::ReqRes;

/// One admitted request travelling through a pipeline.
///
/// The queue owns the item until the ordered worker resolves it; the
/// matching [`GateOpener`] travels separately to the pre-validation pool.
pub struct WorkItem {
    pub(crate) req_res: ReqRes,
    pub(crate) gate: GateWaiter,
    pub(crate) tx_hash: TxHash,
}

impl WorkItem {
    /// Allocate an item with its gate closed and an empty response slot.
    pub fn new(request: Request) -> (Self, GateOpener) {
        let tx_hash = TxHash::of(request.tx().unwrap_or_default());
        let (opener, gate) = ordering_gate();
        let item = Self {
            req_res: ReqRes::new(request),
            gate,
            tx_hash,
        };
        (item, opener)
    }

    pub fn req_res(&self) -> &ReqRes {
        &self.req_res
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }
}
