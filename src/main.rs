use emergency_ai_service::{
    api::{build_router, AppState},
    config::Config,
    metrics::MetricsConfig,
    ml::{ModelBundle, TriageService},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "emergency_ai_service={},tower_http={}",
            config.observability.log_level, config.observability.log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        "Starting {} v{}",
        config.observability.service_name,
        env!("CARGO_PKG_VERSION")
    );

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = emergency_ai_service::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("✅ Prometheus metrics initialized");
        }
    } else {
        tracing::info!("⚠️  Prometheus metrics disabled in configuration");
    }

    // Load model artifacts; the service cannot run without them
    tracing::info!("Loading models from {}", config.models.dir.display());
    let bundle = ModelBundle::load(&config.models).map_err(|e| {
        tracing::error!("Failed to load models: {}", e);
        e
    })?;
    let service = Arc::new(TriageService::from_bundle(bundle));
    tracing::info!(
        "✅ Models loaded ({} features, {} departments)",
        service.n_features(),
        service.department_classes().len()
    );

    let metrics_config = MetricsConfig::from(&config.observability);
    let app = build_router(AppState::new(service), &metrics_config);

    // Start HTTP server
    let http_addr = config.http_addr();
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Severity: POST http://{}/severity", http_addr);
    tracing::info!("   Department: POST http://{}/department", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
