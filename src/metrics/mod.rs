//! Prometheus metrics for the classification service.
//!
//! Covers HTTP traffic (via [`MetricsMiddleware`]) and per-model prediction
//! outcomes and latency (via [`record_prediction`]).
//!
//! # Example
//! ```no_run
//! use emergency_ai_service::metrics::{self, HTTP_REQUESTS_TOTAL};
//!
//! metrics::init_metrics().unwrap();
//! HTTP_REQUESTS_TOTAL
//!     .with_label_values(&["POST", "/severity", "200"])
//!     .inc();
//! ```

mod config;
mod middleware;

pub use config::MetricsConfig;
pub use middleware::{MetricsLayer, MetricsMiddleware};

use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use prometheus::{CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "emergency_ai";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// Total number of HTTP requests received
    ///
    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration in seconds
    ///
    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    /// Number of HTTP requests currently being served
    pub static ref HTTP_REQUESTS_IN_FLIGHT: Gauge = Gauge::with_opts(
        Opts::new("http_requests_in_flight", "Number of HTTP requests being served")
            .namespace(NAMESPACE)
    ).expect("Failed to create HTTP_REQUESTS_IN_FLIGHT metric");

    // ============================================================================
    // Prediction Metrics
    // ============================================================================

    /// Total predictions
    ///
    /// Labels: model (severity, department), outcome (success, error)
    pub static ref PREDICTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("predictions_total", "Total number of model predictions")
            .namespace(NAMESPACE),
        &["model", "outcome"]
    ).expect("Failed to create PREDICTIONS_TOTAL metric");

    /// Time spent vectorizing and predicting
    ///
    /// Labels: model
    pub static ref PREDICTION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "prediction_duration_seconds",
            "Vectorize + predict duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["model"]
    ).expect("Failed to create PREDICTION_DURATION_SECONDS metric");

    // ============================================================================
    // System Metrics
    // ============================================================================

    /// Build information
    ///
    /// Labels: version
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Build information").namespace(NAMESPACE),
        &["version"]
    ).expect("Failed to create BUILD_INFO metric");

    /// Size of the loaded vectorizer vocabulary
    pub static ref MODEL_VOCABULARY_SIZE: Gauge = Gauge::with_opts(
        Opts::new("model_vocabulary_size", "Number of features produced by the vectorizer")
            .namespace(NAMESPACE)
    ).expect("Failed to create MODEL_VOCABULARY_SIZE metric");
}

static METRICS_INIT: OnceCell<()> = OnceCell::new();

/// Register all metrics with the global registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    METRICS_INIT.get_or_try_init(|| -> Result<(), prometheus::Error> {
        PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
        PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;
        PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))?;
        PROMETHEUS_REGISTRY.register(Box::new(PREDICTIONS_TOTAL.clone()))?;
        PROMETHEUS_REGISTRY.register(Box::new(PREDICTION_DURATION_SECONDS.clone()))?;
        PROMETHEUS_REGISTRY.register(Box::new(BUILD_INFO.clone()))?;
        PROMETHEUS_REGISTRY.register(Box::new(MODEL_VOCABULARY_SIZE.clone()))?;

        BUILD_INFO
            .with_label_values(&[env!("CARGO_PKG_VERSION")])
            .set(1.0);

        tracing::info!("Prometheus metrics initialized successfully");
        Ok(())
    })?;

    Ok(())
}

/// Record the outcome and latency of one prediction
pub fn record_prediction(model: &str, success: bool, duration_secs: f64) {
    let outcome = if success { "success" } else { "error" };
    PREDICTIONS_TOTAL.with_label_values(&[model, outcome]).inc();
    PREDICTION_DURATION_SECONDS
        .with_label_values(&[model])
        .observe(duration_secs);
}

/// Generate Prometheus text format metrics for the `/metrics` endpoint
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_idempotent() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_record_prediction() {
        init_metrics().unwrap();
        record_prediction("severity", true, 0.002);

        let value = PREDICTIONS_TOTAL
            .with_label_values(&["severity", "success"])
            .get();
        assert!(value >= 1.0);
    }

    #[test]
    fn test_gather_metrics() {
        init_metrics().unwrap();
        let metrics = gather_metrics();

        assert!(!metrics.is_empty());
        assert!(metrics.contains("emergency_ai_build_info"));
    }
}
