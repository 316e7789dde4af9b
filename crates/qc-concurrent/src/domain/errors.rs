//! Error types for the concurrent ABCI client.
//!
//! Pre-validation rejections and application failures are NOT errors here:
//! they are ordinary responses with a non-zero code and are delivered as-is.

use thiserror::Error;

/// Errors raised by the client itself.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The wrapped application lacks pre_check_tx/pre_deliver_tx/re_check_tx.
    #[error("Application does not implement the concurrent ABCI capability set")]
    MissingCapability,

    /// Rejected configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A worker or pool thread could not be spawned
    #[error("Failed to spawn thread {name}: {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// `start()` called on a running or stopped client
    #[error("Client already started")]
    AlreadyStarted,

    /// Submission before `start()` or after `stop()`
    #[error("Client is not running")]
    NotRunning,
}

/// Configuration validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{pool} pool size must be greater than zero")]
    ZeroPoolSize { pool: &'static str },

    #[error("{pool} pool spawns {spawn} workers but is capped at {size}")]
    SpawnExceedsSize {
        pool: &'static str,
        spawn: usize,
        size: usize,
    },

    #[error("Ordered queue capacity must be greater than zero")]
    ZeroQueueCapacity,
}
