//! # Integration Tests
//!
//! Shared fixtures for the cross-client suites.

pub mod commit_barrier;
pub mod exclusivity;
pub mod fifo_properties;
pub mod flows;
pub mod telemetry;

use qc_concurrent::test_utils::RecordingApp;
use qc_concurrent::{AbciClient, ClientCreator, ConcurrencyConfig, LocalAsyncClientCreator};
use std::sync::Arc;

/// Clients a node opens against one application.
pub struct Node {
    pub app: Arc<RecordingApp>,
    pub creator: LocalAsyncClientCreator,
    pub mempool: Box<dyn AbciClient>,
    pub consensus: Box<dyn AbciClient>,
    pub query: Box<dyn AbciClient>,
}

impl Node {
    /// Build and start all three connections.
    pub fn start(app: RecordingApp, config: ConcurrencyConfig) -> Self {
        let app = Arc::new(app);
        let creator = LocalAsyncClientCreator::with_config(app.clone(), config)
            .expect("recording app is concurrent");
        let mempool = creator.new_abci_client().expect("mempool client");
        let consensus = creator.new_abci_client().expect("consensus client");
        let query = creator.new_abci_client().expect("query client");
        for client in [&mempool, &consensus, &query] {
            client.start().expect("client starts");
        }
        Self {
            app,
            creator,
            mempool,
            consensus,
            query,
        }
    }

    pub fn stop(self) {
        for client in [&self.mempool, &self.consensus, &self.query] {
            client.stop().expect("client stops");
        }
    }
}
