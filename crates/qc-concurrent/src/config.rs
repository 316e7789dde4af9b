//! # Concurrency Configuration
//!
//! Sizing for the pre-validation pools and the ordered queues.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QC_CHECKTX_POOL_SIZE` | `8` | Max check_tx pre-validation threads |
//! | `QC_DELIVERTX_POOL_SIZE` | `16` | Max deliver_tx pre-validation threads |
//! | `QC_PIPELINE_QUEUE` | `32` | Ordered queue capacity per pipeline |
//!
//! Unparseable values fall back to the default.

use serde::{Deserialize, Serialize};
use std::env;

use crate::domain::ConfigError;

/// Max pre-validation threads in the deliver_tx pool.
pub const WORKER_POOL_SIZE: usize = 16;

/// Pre-validation threads started eagerly in the deliver_tx pool.
pub const WORKER_POOL_SPAWN: usize = 4;

/// Pending task capacity of the deliver_tx pool.
pub const WORKER_POOL_QUEUE: usize = 16;

/// Ordered queue capacity, per pipeline.
pub const ORDERED_QUEUE_CAPACITY: usize = WORKER_POOL_QUEUE * 2;

/// Sizing of one pre-validation pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Upper bound on worker threads.
    pub size: usize,
    /// Pending task capacity.
    pub queue: usize,
    /// Workers started with the pool.
    pub spawn: usize,
}

impl PoolConfig {
    /// Default check_tx pool: half the deliver_tx pool.
    pub fn check_tx() -> Self {
        Self {
            size: WORKER_POOL_SIZE / 2,
            queue: WORKER_POOL_QUEUE / 2,
            spawn: WORKER_POOL_SPAWN / 2,
        }
    }

    pub fn deliver_tx() -> Self {
        Self {
            size: WORKER_POOL_SIZE,
            queue: WORKER_POOL_QUEUE,
            spawn: WORKER_POOL_SPAWN,
        }
    }

    fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self.spawn = self.spawn.min(size);
        self
    }

    fn validate(&self, pool: &'static str) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ZeroPoolSize { pool });
        }
        if self.spawn > self.size {
            return Err(ConfigError::SpawnExceedsSize {
                pool,
                spawn: self.spawn,
                size: self.size,
            });
        }
        Ok(())
    }
}

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub check_tx_pool: PoolConfig,
    pub deliver_tx_pool: PoolConfig,
    /// Ordered queue capacity for each pipeline.
    pub queue_capacity: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            check_tx_pool: PoolConfig::check_tx(),
            deliver_tx_pool: PoolConfig::deliver_tx(),
            queue_capacity: ORDERED_QUEUE_CAPACITY,
        }
    }
}

impl ConcurrencyConfig {
    /// Defaults overridden by `QC_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            check_tx_pool: env_usize("QC_CHECKTX_POOL_SIZE")
                .map(|size| defaults.check_tx_pool.with_size(size))
                .unwrap_or(defaults.check_tx_pool),

            deliver_tx_pool: env_usize("QC_DELIVERTX_POOL_SIZE")
                .map(|size| defaults.deliver_tx_pool.with_size(size))
                .unwrap_or(defaults.deliver_tx_pool),

            queue_capacity: env_usize("QC_PIPELINE_QUEUE").unwrap_or(defaults.queue_capacity),
        }
    }

    /// Small pools for tests.
    pub fn for_testing() -> Self {
        Self {
            check_tx_pool: PoolConfig {
                size: 4,
                queue: 4,
                spawn: 1,
            },
            deliver_tx_pool: PoolConfig {
                size: 4,
                queue: 4,
                spawn: 1,
            },
            queue_capacity: 8,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check_tx_pool.validate("check_tx")?;
        self.deliver_tx_pool.validate("deliver_tx")?;
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
