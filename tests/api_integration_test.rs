/// Integration tests for the HTTP API
///
/// Models are replaced with stand-ins so every response can be checked
/// against exactly what the model returned.
mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use emergency_ai_service::{
    api::{build_router, AppState},
    metrics::MetricsConfig,
    ml::{
        DepartmentClasses, Label, LabelClassifier, MultiLabelClassifier, TriageService, Vectorizer,
    },
    Result,
};
use ndarray::{array, Array2};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Records every document it sees and emits a single constant feature
#[derive(Default)]
struct RecordingVectorizer {
    seen: Mutex<Vec<String>>,
}

impl Vectorizer for RecordingVectorizer {
    fn transform(&self, docs: &[&str]) -> Result<Array2<f64>> {
        self.seen
            .lock()
            .unwrap()
            .extend(docs.iter().map(|d| d.to_string()));
        Ok(Array2::ones((docs.len(), 1)))
    }

    fn n_features(&self) -> usize {
        1
    }
}

struct FixedSeverity(Label);

impl LabelClassifier for FixedSeverity {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<Label>> {
        Ok(vec![self.0.clone(); features.nrows()])
    }

    fn n_features(&self) -> usize {
        1
    }
}

struct FixedDepartments(Array2<u8>);

impl MultiLabelClassifier for FixedDepartments {
    fn predict(&self, _features: &Array2<f64>) -> Result<Array2<u8>> {
        Ok(self.0.clone())
    }

    fn n_features(&self) -> usize {
        1
    }

    fn n_labels(&self) -> usize {
        self.0.ncols()
    }
}

struct TestApp {
    router: Router,
    vectorizer: Arc<RecordingVectorizer>,
}

fn test_app(severity: Label, indicator: Array2<u8>) -> TestApp {
    test_app_with_metrics(severity, indicator, &MetricsConfig::default())
}

fn test_app_with_metrics(
    severity: Label,
    indicator: Array2<u8>,
    metrics: &MetricsConfig,
) -> TestApp {
    let vectorizer = Arc::new(RecordingVectorizer::default());
    let service = TriageService::new(
        vectorizer.clone(),
        Arc::new(FixedSeverity(severity)),
        Arc::new(FixedDepartments(indicator)),
        DepartmentClasses::new(common::DEPARTMENTS.iter().map(|d| d.to_string()).collect()),
    );

    TestApp {
        router: build_router(AppState::new(Arc::new(service)), metrics),
        vectorizer,
    }
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_home_liveness() {
    let app = test_app(json!("low"), array![[0u8, 0, 0]]);

    let response = app.router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "🔥 AI Emergency Service Running"
    );
}

#[tokio::test]
async fn test_severity_passes_label_through() {
    let app = test_app(json!("critical"), array![[0u8, 0, 0]]);

    let response = app
        .router
        .oneshot(post_json("/severity", r#"{"text": "building on fire"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "severity": "critical" }));
    assert_eq!(
        *app.vectorizer.seen.lock().unwrap(),
        vec!["building on fire".to_string()]
    );
}

#[tokio::test]
async fn test_numeric_severity_label() {
    let app = test_app(json!(3), array![[0u8, 0, 0]]);

    let response = app
        .router
        .oneshot(post_json("/severity", r#"{"text": "x"}"#))
        .await
        .unwrap();

    assert_eq!(body_json(response).await, json!({ "severity": 3 }));
}

#[tokio::test]
async fn test_department_names_in_class_order() {
    let app = test_app(json!("low"), array![[1u8, 0, 1]]);

    let response = app
        .router
        .oneshot(post_json("/department", r#"{"text": "crash on highway"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "departments": ["ambulance", "police"] })
    );
}

#[tokio::test]
async fn test_department_none_selected() {
    let app = test_app(json!("low"), array![[0u8, 0, 0]]);

    let response = app
        .router
        .oneshot(post_json("/department", r#"{"text": "all quiet"}"#))
        .await
        .unwrap();

    assert_eq!(body_json(response).await, json!({ "departments": [] }));
}

#[tokio::test]
async fn test_missing_text_is_empty_string() {
    let app = test_app(json!("low"), array![[0u8, 1, 0]]);

    let response = app
        .router
        .oneshot(post_json("/severity", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*app.vectorizer.seen.lock().unwrap(), vec![String::new()]);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = test_app(json!("low"), array![[0u8, 0, 0]]);

    let response = app
        .router
        .oneshot(post_json("/department", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["status"], 400);
    assert!(app.vectorizer.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_string_text_rejected() {
    let app = test_app(json!("low"), array![[0u8, 0, 0]]);

    let response = app
        .router
        .oneshot(post_json("/severity", r#"{"text": 42}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_indicator_wider_than_classes_is_inference_error() {
    let app = test_app(json!("low"), array![[0u8, 0, 0, 1]]);

    let response = app
        .router
        .oneshot(post_json("/department", r#"{"text": "x"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"]["code"], "INFERENCE_ERROR");
}

#[tokio::test]
async fn test_wrong_method_not_allowed() {
    let app = test_app(json!("low"), array![[0u8, 0, 0]]);

    let response = app.router.oneshot(get("/severity")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_reports_models() {
    let app = test_app(json!("low"), array![[0u8, 0, 0]]);

    let response = app.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["vocabulary_size"], 1);
    assert_eq!(body["department_classes"], json!(["ambulance", "fire", "police"]));    assert!(body.get("models").is_none());
}

#[tokio::test]
async fn test_health_reports_loaded_bundle() {
    let bundle = common::fixture_bundle();
    let vocabulary_size = bundle.vectorizer.vocab_size();
    let service = TriageService::from_bundle(bundle);
    let router = build_router(
        AppState::new(Arc::new(service)),
        &MetricsConfig::default(),
    );

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["vocabulary_size"], vocabulary_size);
    assert_eq!(body["models"]["vocabulary_size"], vocabulary_size);
    assert_eq!(body["models"]["severity_kind"], "linear");
    assert_eq!(body["models"]["severity_classes"], json!(["high", "medium", "low"]));
    assert_eq!(body["models"]["department_kind"], "one_vs_rest");
}

#[tokio::test]
async fn test_long_report_accepted() {
    let app = test_app(json!("high"), array![[0u8, 1, 0]]);
    let text = "fire ".repeat(300_000);
    let body = json!({ "text": text }).to_string();
    assert!(body.len() > 1024 * 1024);

    let response = app
        .router
        .oneshot(post_json("/severity", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "severity": "high" }));
    assert_eq!(app.vectorizer.seen.lock().unwrap()[0].len(), text.len());
}

#[tokio::test]
async fn test_missing_content_type_keeps_status() {
    let app = test_app(json!("low"), array![[0u8, 0, 0]]);

    let request = Request::builder()
        .method("POST")
        .uri("/severity")
        .body(Body::from(r#"{"text": "x"}"#))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "REQUEST_REJECTED");
    assert_eq!(body["error"]["status"], 415);
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let metrics = MetricsConfig {
        enabled: false,
        ..Default::default()
    };
    let app = test_app_with_metrics(json!("low"), array![[0u8, 0, 0]], &metrics);

    let response = app.router.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .router
        .oneshot(post_json("/severity", r#"{"text": "x"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    emergency_ai_service::metrics::init_metrics().unwrap();
    let app = test_app(json!("low"), array![[0u8, 0, 0]]);

    app.router
        .clone()
        .oneshot(post_json("/severity", r#"{"text": "x"}"#))
        .await
        .unwrap();

    let response = app.router.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("emergency_ai_predictions_total"));
    assert!(text.contains("emergency_ai_http_requests_total"));
}
