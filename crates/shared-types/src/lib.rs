//! # Shared Types Crate
//!
//! ABCI message types, the application contract, and transaction identity
//! shared by the concurrent client, telemetry and the test suite.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Request/response shapes are defined once here.
//! - **Opaque Transactions**: Transactions are bytes; nothing in the node
//!   decodes them outside the application.
//! - **Capability by Trait**: The concurrent capability set is a separate
//!   trait so a plain application is rejected at client construction.

pub mod abci;
pub mod application;
pub mod entities;

pub use abci::*;
pub use application::{Application, ConcurrentApplication};
pub use entities::*;
