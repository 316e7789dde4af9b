//! # Quantum Telemetry
//!
//! Logging and metrics for Quantum-Chain components.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with env filter, pretty or JSON output
//! - **Metrics**: Prometheus counters/gauges/histograms for the ABCI pipelines
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quantum_telemetry::{encode_metrics, init_logging, register_metrics, TelemetryConfig};
//!
//! init_logging(&TelemetryConfig::for_component("abci-client"))?;
//! register_metrics()?;
//!
//! // Serve on the node's metrics endpoint.
//! let body = encode_metrics()?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QC_SERVICE_NAME` | `quantum-chain` | Service name in logs |
//! | `QC_LOG_LEVEL` | `info` | Log level filter |
//! | `QC_JSON_LOGS` | `false` | JSON log output |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, APP_CALLS, APP_CALL_DURATION, COMMIT_BARRIER_WAIT,
    PIPELINE_IN_FLIGHT, PIPELINE_SUBMISSIONS, PREVALIDATION_REJECTIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Convenience macro for creating a span with component context.
///
/// # Example
///
/// ```rust,ignore
/// use quantum_telemetry::component_span;
///
/// fn commit() {
///     let _span = component_span!("commit", component = "commit_barrier").entered();
/// }
/// ```
#[macro_export]
macro_rules! component_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
