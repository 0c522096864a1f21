//! Configuration for HTTP metrics collection

use crate::config::ObservabilityConfig;

/// Configuration for metrics collection
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Mount the metrics middleware and the `/metrics` route
    pub enabled: bool,

    /// Record request duration histograms
    pub enable_histograms: bool,

    /// Paths to exclude from HTTP metrics
    pub excluded_paths: Vec<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_histograms: true,
            excluded_paths: vec!["/metrics".to_string()],
        }
    }
}

impl From<&ObservabilityConfig> for MetricsConfig {
    fn from(observability: &ObservabilityConfig) -> Self {
        Self {
            enabled: observability.prometheus_enabled,
            enable_histograms: observability.metrics_histograms,
            ..Default::default()
        }
    }
}

impl MetricsConfig {
    /// Check if a path should be excluded from metrics
    pub fn is_path_excluded(&self, path: &str) -> bool {
        self.excluded_paths.iter().any(|excluded| excluded == path)
    }
}
