use crate::api::{handlers, AppState};
use crate::metrics::{MetricsConfig, MetricsMiddleware};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Build the main API router
///
/// Metrics middleware and the `/metrics` route are only mounted when
/// `metrics.enabled` is set.
pub fn build_router(state: AppState, metrics: &MetricsConfig) -> Router {
    let mut router = Router::new()
        // Liveness
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health_check))
        // Classification
        .route("/severity", post(handlers::severity))
        .route("/department", post(handlers::department));

    if metrics.enabled {
        router = router
            .route("/metrics", get(handlers::metrics))
            .route_layer(MetricsMiddleware::layer_with_config(metrics.clone()));
    }

    router
        // Add state
        .with_state(state)
        // Reports are accepted at any length
        .layer(DefaultBodyLimit::disable())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
}
