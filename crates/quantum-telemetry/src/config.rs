//! Logging configuration.

use std::env;

const DEFAULT_SERVICE: &str = "quantum-chain";
const DEFAULT_FILTER: &str = "info";

/// How a process's logs are filtered and rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Attached to the "Logging initialized" event
    pub service_name: String,

    /// `EnvFilter` directives, e.g. `qc_concurrent=debug,warn`
    pub log_level: String,

    /// One JSON object per line instead of pretty output
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE.to_string(),
            log_level: DEFAULT_FILTER.to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Read overrides from the environment.
    ///
    /// `QC_SERVICE_NAME`, `QC_LOG_LEVEL` (falls back to `RUST_LOG`) and
    /// `QC_JSON_LOGS` (`true` or `1`). Unset variables keep the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: env::var("QC_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: env::var("QC_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: env::var("QC_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.json_logs),
        }
    }

    /// Environment configuration named after one component, e.g. `abci-client`.
    pub fn for_component(component: &str) -> Self {
        Self {
            service_name: format!("qc-{component}"),
            ..Self::from_env()
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
