use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Model artifact locations
    #[serde(default)]
    pub models: ModelsConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        let config: Self = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: EMERGENCY_AI_)
            .add_source(
                config::Environment::with_prefix("EMERGENCY_AI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Socket address string the HTTP listener binds to
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.http_port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

/// Where the four model artifacts live on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding the artifacts
    #[serde(default = "default_models_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_vectorizer_file")]
    pub vectorizer_file: String,

    #[serde(default = "default_severity_model_file")]
    pub severity_model_file: String,

    #[serde(default = "default_department_model_file")]
    pub department_model_file: String,

    #[serde(default = "default_department_classes_file")]
    pub department_classes_file: String,
}

impl ModelsConfig {
    /// Use `dir` with the default artifact filenames
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.dir.join(&self.vectorizer_file)
    }

    pub fn severity_model_path(&self) -> PathBuf {
        self.dir.join(&self.severity_model_file)
    }

    pub fn department_model_path(&self) -> PathBuf {
        self.dir.join(&self.department_model_file)
    }

    pub fn department_classes_path(&self) -> PathBuf {
        self.dir.join(&self.department_classes_file)
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: default_models_dir(),
            vectorizer_file: default_vectorizer_file(),
            severity_model_file: default_severity_model_file(),
            department_model_file: default_department_model_file(),
            department_classes_file: default_department_classes_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,

    /// Record request and prediction duration histograms
    #[serde(default = "default_true")]
    pub metrics_histograms: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
            prometheus_enabled: true,
            metrics_histograms: true,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_models_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_vectorizer_file() -> String {
    "vectorizer.json".to_string()
}

fn default_severity_model_file() -> String {
    "severity_model.json".to_string()
}

fn default_department_model_file() -> String {
    "department_model.json".to_string()
}

fn default_department_classes_file() -> String {
    "dept_classes.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "emergency-ai-service".to_string()
}

fn default_true() -> bool {
    true
}
