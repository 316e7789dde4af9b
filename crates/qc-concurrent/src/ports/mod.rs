//! Ports layer for the concurrent ABCI client.
//!
//! - Inbound (Driving) ports: client API used by the node's connections
//! - Outbound (Driven) ports: the wrapped application and response sink

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
