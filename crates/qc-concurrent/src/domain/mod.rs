//! # Domain Layer - Concurrent ABCI Client
//!
//! Synchronization primitives the pipelines are assembled from.
//!
//! ## Components
//!
//! - `coordinator`: Lock set and in-flight counter shared across clients
//! - `gate`: One-shot ordering gate between pre-validation and execution
//! - `req_res`: Completion handle returned to submitters
//! - `work_item`: Queue entry pairing a handle with its gate
//! - `errors`: ClientError and ConfigError

pub mod coordinator;
pub mod errors;
pub mod gate;
pub mod req_res;
pub mod work_item;

pub use coordinator::*;
pub use errors::*;
pub use gate::*;
pub use req_res::*;
pub use work_item::*;
