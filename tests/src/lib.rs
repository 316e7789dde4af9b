//! # Quantum-Chain Test Suite
//!
//! Cross-client tests for the concurrent ABCI client. Unit tests live next
//! to the code in each crate; this crate exercises several clients sharing
//! one application, the way a node wires its mempool, consensus and query
//! connections.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── flows.rs           # Mempool + consensus block lifecycle
//! │   ├── commit_barrier.rs  # Barrier soundness under check_tx floods
//! │   ├── exclusivity.rs     # Reader/writer contract on the application
//! │   ├── fifo_properties.rs # proptest: order under random latency
//! │   └── telemetry.rs       # Logging init and metrics exposition
//! └── benches/
//!     └── pipeline_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # By category
//! cargo test -p qc-tests integration::commit_barrier::
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

#![allow(dead_code)]

pub mod integration;
