//! # Telemetry
//!
//! The client's logs and metrics as an operator sees them. Both the
//! subscriber and the Prometheus registry are process-global, so each is
//! installed by exactly one test in this binary.

#[cfg(test)]
mod tests {
    use quantum_telemetry::{encode_metrics, init_logging, register_metrics, TelemetryConfig};
    use std::time::Duration;

    use qc_concurrent::test_utils::RecordingApp;
    use qc_concurrent::ConcurrencyConfig;

    use crate::integration::Node;

    #[test]
    fn test_logging_installs_once() {
        let config = TelemetryConfig {
            log_level: "qc_concurrent=debug,warn".to_string(),
            ..TelemetryConfig::for_component("abci-client")
        };
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_err());

        // Lifecycle and per-tx events go through the installed subscriber.
        let node = Node::start(RecordingApp::builder().build(), ConcurrencyConfig::for_testing());
        node.mempool.check_tx_async(b"logged".to_vec()).unwrap().wait();
        node.stop();
    }

    #[test]
    fn test_pipeline_metrics_exposed() {
        register_metrics().expect("registered once per process");

        let node = Node::start(
            RecordingApp::builder()
                .pre_delay(b"slow", Duration::from_millis(10))
                .reject_pre(b"spam", 3)
                .build(),
            ConcurrencyConfig::for_testing(),
        );
        node.mempool.check_tx_async(b"slow".to_vec()).unwrap();
        node.mempool.check_tx_async(b"spam".to_vec()).unwrap();
        node.consensus.deliver_tx_async(b"block".to_vec()).unwrap();
        node.consensus.commit_sync().unwrap();
        node.stop();

        let text = encode_metrics().unwrap();
        for name in [
            "qc_abci_pipeline_submissions_total",
            "qc_abci_prevalidation_rejections_total",
            "qc_abci_pipeline_in_flight",
            "qc_abci_app_calls_total",
            "qc_abci_app_call_duration_seconds",
            "qc_abci_commit_barrier_wait_seconds",
        ] {
            assert!(text.contains(name), "missing metric {name}");
        }
        assert!(text.contains("pipeline=\"check_tx\""));
    }
}
