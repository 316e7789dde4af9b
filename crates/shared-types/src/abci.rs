//! # ABCI Message Types
//!
//! Request and response shapes exchanged between the consensus engine and the
//! application. Only the fields the node actually routes are modelled; the
//! application owns the meaning of `data`, `log` and `tags`.
//!
//! ## Result Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | `0` | OK |
//! | non-zero | Application-defined failure, surfaced verbatim |

use serde::{Deserialize, Serialize};

use crate::entities::Tx;

/// Result code for a successful call.
pub const CODE_TYPE_OK: u32 = 0;

/// Key/value tag attached to a response for indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct KvPair {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// A validator power change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidatorUpdate {
    pub pub_key: Vec<u8>,
    pub power: i64,
}

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestEcho {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestFlush;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestInfo {
    /// Version of the calling consensus engine.
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestSetOption {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestInitChain {
    pub time: u64,
    pub chain_id: String,
    pub validators: Vec<ValidatorUpdate>,
    pub app_state_bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestQuery {
    pub data: Vec<u8>,
    pub path: String,
    pub height: i64,
    pub prove: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestBeginBlock {
    pub hash: Vec<u8>,
    pub height: i64,
    pub proposer_address: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestCheckTx {
    pub tx: Tx,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestDeliverTx {
    pub tx: Tx,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestEndBlock {
    pub height: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestCommit;

// =============================================================================
// RESPONSES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseEcho {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseFlush;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseInfo {
    pub data: String,
    pub version: String,
    pub last_block_height: i64,
    pub last_block_app_hash: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseSetOption {
    pub code: u32,
    pub log: String,
}

impl ResponseSetOption {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_TYPE_OK
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseInitChain {
    pub validators: Vec<ValidatorUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseQuery {
    pub code: u32,
    pub log: String,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub height: i64,
}

impl ResponseQuery {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_TYPE_OK
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseBeginBlock {
    pub tags: Vec<KvPair>,
}

/// Result of a full or stateless transaction check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseCheckTx {
    pub code: u32,
    pub data: Vec<u8>,
    pub log: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
}

impl ResponseCheckTx {
    /// Successful check with no payload.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Rejection with an application-defined code.
    pub fn rejected(code: u32, log: impl Into<String>) -> Self {
        Self {
            code,
            log: log.into(),
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == CODE_TYPE_OK
    }
}

/// Result of a full or stateless transaction execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseDeliverTx {
    pub code: u32,
    pub data: Vec<u8>,
    pub log: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
    pub tags: Vec<KvPair>,
}

impl ResponseDeliverTx {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn rejected(code: u32, log: impl Into<String>) -> Self {
        Self {
            code,
            log: log.into(),
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == CODE_TYPE_OK
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseEndBlock {
    pub validator_updates: Vec<ValidatorUpdate>,
    pub tags: Vec<KvPair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseCommit {
    /// Application state root after the commit.
    pub data: Vec<u8>,
}

// =============================================================================
// ENVELOPES
// =============================================================================

/// Any request the client can route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    Echo(RequestEcho),
    Flush(RequestFlush),
    Info(RequestInfo),
    SetOption(RequestSetOption),
    InitChain(RequestInitChain),
    Query(RequestQuery),
    BeginBlock(RequestBeginBlock),
    CheckTx(RequestCheckTx),
    DeliverTx(RequestDeliverTx),
    EndBlock(RequestEndBlock),
    Commit(RequestCommit),
}

impl Request {
    pub fn check_tx(tx: impl Into<Tx>) -> Self {
        Request::CheckTx(RequestCheckTx { tx: tx.into() })
    }

    pub fn deliver_tx(tx: impl Into<Tx>) -> Self {
        Request::DeliverTx(RequestDeliverTx { tx: tx.into() })
    }

    /// The raw transaction for tx-carrying requests.
    pub fn tx(&self) -> Option<&[u8]> {
        match self {
            Request::CheckTx(req) => Some(&req.tx),
            Request::DeliverTx(req) => Some(&req.tx),
            _ => None,
        }
    }

    /// Method name, used as a log field and metric label.
    pub fn method(&self) -> &'static str {
        match self {
            Request::Echo(_) => "echo",
            Request::Flush(_) => "flush",
            Request::Info(_) => "info",
            Request::SetOption(_) => "set_option",
            Request::InitChain(_) => "init_chain",
            Request::Query(_) => "query",
            Request::BeginBlock(_) => "begin_block",
            Request::CheckTx(_) => "check_tx",
            Request::DeliverTx(_) => "deliver_tx",
            Request::EndBlock(_) => "end_block",
            Request::Commit(_) => "commit",
        }
    }
}

/// Any response the client can deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Echo(ResponseEcho),
    Flush(ResponseFlush),
    Info(ResponseInfo),
    SetOption(ResponseSetOption),
    InitChain(ResponseInitChain),
    Query(ResponseQuery),
    BeginBlock(ResponseBeginBlock),
    CheckTx(ResponseCheckTx),
    DeliverTx(ResponseDeliverTx),
    EndBlock(ResponseEndBlock),
    Commit(ResponseCommit),
}

impl Response {
    /// Whether the response carries a success code.
    ///
    /// Responses without a code (info, commit, ...) are always OK.
    pub fn is_ok(&self) -> bool {
        match self {
            Response::SetOption(res) => res.is_ok(),
            Response::Query(res) => res.is_ok(),
            Response::CheckTx(res) => res.is_ok(),
            Response::DeliverTx(res) => res.is_ok(),
            _ => true,
        }
    }

    pub fn as_check_tx(&self) -> Option<&ResponseCheckTx> {
        match self {
            Response::CheckTx(res) => Some(res),
            _ => None,
        }
    }

    pub fn as_deliver_tx(&self) -> Option<&ResponseDeliverTx> {
        match self {
            Response::DeliverTx(res) => Some(res),
            _ => None,
        }
    }
}

macro_rules! impl_from_message {
    ($envelope:ident, $( $variant:ident => $ty:ty ),* $(,)?) => {
        $(
            impl From<$ty> for $envelope {
                fn from(msg: $ty) -> Self {
                    $envelope::$variant(msg)
                }
            }
        )*
    };
}

impl_from_message!(Request,
    Echo => RequestEcho,
    Flush => RequestFlush,
    Info => RequestInfo,
    SetOption => RequestSetOption,
    InitChain => RequestInitChain,
    Query => RequestQuery,
    BeginBlock => RequestBeginBlock,
    CheckTx => RequestCheckTx,
    DeliverTx => RequestDeliverTx,
    EndBlock => RequestEndBlock,
    Commit => RequestCommit,
);

impl_from_message!(Response,
    Echo => ResponseEcho,
    Flush => ResponseFlush,
    Info => ResponseInfo,
    SetOption => ResponseSetOption,
    InitChain => ResponseInitChain,
    Query => ResponseQuery,
    BeginBlock => ResponseBeginBlock,
    CheckTx => ResponseCheckTx,
    DeliverTx => ResponseDeliverTx,
    EndBlock => ResponseEndBlock,
    Commit => ResponseCommit,
);
