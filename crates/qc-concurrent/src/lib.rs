//! # Concurrent ABCI Client
//!
//! **Component:** qc-concurrent
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! In-process client between the consensus engine's connections and the
//! application. check_tx and deliver_tx calls run through ordered pipelines:
//! their stateless pre-validation (`pre_check_tx`, `pre_deliver_tx`) runs in
//! parallel, while the stateful call reaches the application strictly in
//! submission order. Commit-class calls wait behind a barrier until every
//! admitted item is resolved.
//!
//! ## Guarantees
//!
//! | Guarantee | Enforcement Location |
//! |-----------|---------------------|
//! | Per-pipeline FIFO: submission == application call == callback order | `pipeline.rs` - single ordered worker per queue |
//! | Gate opens exactly once, even on panic | `domain/gate.rs` - `GateOpener` drop |
//! | Commit observes every admitted item | `domain/coordinator.rs` - `commit_barrier()` |
//! | No check_tx admitted while a commit holds the barrier | `domain/coordinator.rs` - `admit_check_tx()` |
//! | Writers exclusive, readers shared | `domain/coordinator.rs` - `exclusive()` / `shared()` |
//! | Backpressure, never drops | `pipeline.rs` - bounded `enqueue()` |
//! | Application panic resolves its item, worker survives | `pipeline.rs` - `execute_contained()` |
//!
//! ## Request Flow
//!
//! ```text
//! check_tx_async(tx)
//!   │ admission → arbitration → commit mutex
//!   │ in_flight += 1, enqueue
//!   ├──────────────► pre-validation pool ── pre_check_tx ── open gate
//!   ▼                                                         │
//! ordered queue ──► ordered worker: wait gate ◄───────────────┘
//!                     write lock
//!                     check_tx (unless pre-validation rejected)
//!                     done, in_flight -= 1
//!                     per-request callback, global callback
//!
//! commit_async()
//!   arbitration → commit mutex → wait in_flight == 0 → write lock → commit
//! ```
//!
//! ## Host Assumptions
//!
//! - deliver_tx and commit-class calls are never issued concurrently.
//! - check_tx may arrive from any thread at any time.
//! - Callbacks must not call `stop()` or `set_response_callback()`, and must
//!   not submit check_tx while the queue may be full: the ordered worker is
//!   the thread that would drain it.
//! - A panic inside the application's `check_tx`/`deliver_tx` is contained:
//!   the item resolves with `APPLICATION_PANIC_CODE` and the worker continues.
//!   Application state touched before the panic is not rolled back.
//! - A panicking callback takes down the ordered worker.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  service.rs  - AsyncLocalClient (AbciClient implementation)     │
//! │  creator.rs  - LocalAsyncClientCreator                          │
//! │  pipeline.rs - ordered queue + worker                           │
//! │  pool.rs     - pre-validation thread pool                       │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - AbciClient, ClientCreator traits           │
//! │  ports/outbound.rs - Application contract, global callback      │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/coordinator.rs - lock set, in-flight counter, barrier   │
//! │  domain/gate.rs        - one-shot ordering gate                 │
//! │  domain/req_res.rs     - completion handle                      │
//! │  domain/work_item.rs   - queue entry                            │
//! │  domain/errors.rs      - ClientError, ConfigError               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_concurrent::{AbciClient, ClientCreator, LocalAsyncClientCreator};
//!
//! let creator = LocalAsyncClientCreator::new(app)?;
//! let mempool = creator.new_abci_client()?;
//! let consensus = creator.new_abci_client()?;
//! mempool.start()?;
//! consensus.start()?;
//!
//! let res = mempool.check_tx_async(tx)?;
//! let response = res.wait();
//! consensus.commit_sync()?;
//! ```

pub mod config;
pub mod creator;
pub mod domain;
pub mod pipeline;
pub mod pool;
pub mod ports;
pub mod service;

/// Instrumented application fixtures for tests.
///
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConcurrencyConfig, PoolConfig};
pub use creator::LocalAsyncClientCreator;
pub use domain::{ClientError, ConfigError, PipelineCoordinator, ReqRes, ResponseCallback};
pub use pipeline::{PipelineKind, APPLICATION_PANIC_CODE};
pub use ports::{AbciClient, Application, Callback, ClientCreator, ConcurrentApplication};
pub use service::AsyncLocalClient;
