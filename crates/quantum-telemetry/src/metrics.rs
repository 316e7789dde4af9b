//! Prometheus metrics for the ABCI client pipelines.
//!
//! All metrics follow the naming convention: `qc_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., submissions_total)
//! - **Gauge**: Value that can go up or down (e.g., in_flight)
//! - **Histogram**: Distribution of values (e.g., commit wait duration)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, Histogram, HistogramVec, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PIPELINE METRICS
    // =========================================================================

    /// Transactions admitted into a pipeline
    pub static ref PIPELINE_SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("qc_abci_pipeline_submissions_total", "Transactions admitted into a pipeline"),
        &["pipeline"]  // pipeline: check_tx/deliver_tx
    ).expect("metric creation failed");

    /// Transactions short-circuited by a failed pre-validation
    pub static ref PREVALIDATION_REJECTIONS: CounterVec = CounterVec::new(
        Opts::new(
            "qc_abci_prevalidation_rejections_total",
            "Transactions rejected by stateless pre-validation"
        ),
        &["pipeline"]
    ).expect("metric creation failed");

    /// Admitted but unresolved work items across all pipelines
    pub static ref PIPELINE_IN_FLIGHT: Gauge = Gauge::new(
        "qc_abci_pipeline_in_flight",
        "Work items admitted but not yet resolved by an ordered worker"
    ).expect("metric creation failed");

    // =========================================================================
    // APPLICATION METRICS
    // =========================================================================

    /// Calls into the application by method
    pub static ref APP_CALLS: CounterVec = CounterVec::new(
        Opts::new("qc_abci_app_calls_total", "Calls made into the application"),
        &["method"]
    ).expect("metric creation failed");

    /// Application call duration by method
    pub static ref APP_CALL_DURATION: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "qc_abci_app_call_duration_seconds",
            "Time spent inside the application"
        ).buckets(exponential_buckets(0.00001, 2.0, 18).unwrap()),
        &["method"]
    ).expect("metric creation failed");

    // =========================================================================
    // COMMIT BARRIER METRICS
    // =========================================================================

    /// Time a commit-class call waited for in-flight work to drain
    pub static ref COMMIT_BARRIER_WAIT: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "qc_abci_commit_barrier_wait_seconds",
            "Time commit-class calls spent waiting for the in-flight counter to reach zero"
        ).buckets(exponential_buckets(0.0001, 2.0, 16).unwrap())
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Fails on the second call in a process.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Pipelines
        Box::new(PIPELINE_SUBMISSIONS.clone()),
        Box::new(PREVALIDATION_REJECTIONS.clone()),
        Box::new(PIPELINE_IN_FLIGHT.clone()),
        // Application
        Box::new(APP_CALLS.clone()),
        Box::new(APP_CALL_DURATION.clone()),
        // Commit barrier
        Box::new(COMMIT_BARRIER_WAIT.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
