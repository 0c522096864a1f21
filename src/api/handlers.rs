use crate::api::AppState;
use crate::error::Result;
use crate::ml::{BundleSummary, Label};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Plain-text liveness string
pub const LIVENESS_MESSAGE: &str = "🔥 AI Emergency Service Running";

/// Liveness endpoint
pub async fn home() -> &'static str {
    LIVENESS_MESSAGE
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
        vocabulary_size: state.service.n_features(),
        department_classes: state.service.department_classes().to_vec(),
        models: state.service.summary().cloned(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
    pub vocabulary_size: usize,
    pub department_classes: Vec<String>,

    /// Artifact description, present when the service was loaded from disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<BundleSummary>,
}

/// Body accepted by both classification endpoints
#[derive(Debug, Default, Deserialize)]
pub struct TextRequest {
    /// Missing key is treated as empty text
    #[serde(default)]
    pub text: String,
}

/// Predict incident severity
pub async fn severity(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<SeverityResponse>> {
    let Json(request) = payload?;
    let severity = state.service.predict_severity(&request.text).await?;
    Ok(Json(SeverityResponse { severity }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeverityResponse {
    pub severity: Label,
}

/// Predict responding departments
pub async fn department(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<DepartmentResponse>> {
    let Json(request) = payload?;
    let departments = state.service.predict_departments(&request.text).await?;
    Ok(Json(DepartmentResponse { departments }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepartmentResponse {
    pub departments: Vec<String>,
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        crate::metrics::gather_metrics(),
    )
}
