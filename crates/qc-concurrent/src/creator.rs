//! # Client Creator
//!
//! A node opens one client per host connection. All of them must share one
//! coordinator: the mempool connection admits check_tx work that the
//! consensus connection's commit has to wait for.

use shared_types::{Application, ConcurrentApplication};
use std::sync::Arc;
use tracing::debug;

use crate::config::ConcurrencyConfig;
use crate::domain::{ClientError, PipelineCoordinator};
use crate::ports::inbound::{AbciClient, ClientCreator};
use crate::service::AsyncLocalClient;

/// Hands out [`AsyncLocalClient`]s over one application and one coordinator.
pub struct LocalAsyncClientCreator {
    app: Arc<dyn ConcurrentApplication>,
    coordinator: Arc<PipelineCoordinator>,
    config: ConcurrencyConfig,
}

impl LocalAsyncClientCreator {
    /// Creator with the default configuration.
    ///
    /// # Errors
    /// - `MissingCapability`: `app` does not advertise the concurrent set
    pub fn new(app: Arc<dyn Application>) -> Result<Self, ClientError> {
        Self::with_config(app, ConcurrencyConfig::default())
    }

    pub fn with_config(
        app: Arc<dyn Application>,
        config: ConcurrencyConfig,
    ) -> Result<Self, ClientError> {
        let app = app.as_concurrent().ok_or(ClientError::MissingCapability)?;
        config.validate()?;
        Ok(Self {
            app,
            coordinator: Arc::new(PipelineCoordinator::new()),
            config,
        })
    }

    pub fn coordinator(&self) -> &Arc<PipelineCoordinator> {
        &self.coordinator
    }

    pub fn config(&self) -> &ConcurrencyConfig {
        &self.config
    }

    /// Concrete client sharing this creator's coordinator.
    pub fn new_client(&self) -> Result<AsyncLocalClient, ClientError> {
        debug!("Creating concurrent ABCI client");
        AsyncLocalClient::new(
            Arc::clone(&self.app),
            Arc::clone(&self.coordinator),
            &self.config,
        )
    }
}

impl ClientCreator for LocalAsyncClientCreator {
    fn new_abci_client(&self) -> Result<Box<dyn AbciClient>, ClientError> {
        Ok(Box::new(self.new_client()?))
    }
}
