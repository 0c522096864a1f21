use crate::error::{AppError, Result};
use crate::metrics;
use crate::ml::artifacts::ModelBundle;
use crate::ml::classes::DepartmentClasses;
use crate::ml::classifier::{LabelClassifier, MultiLabelClassifier};
use crate::ml::models::{BundleSummary, Label};
use crate::ml::vectorizer::Vectorizer;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Prediction service shared by all request handlers.
///
/// Everything it holds is immutable after construction, so it is shared
/// across tasks behind an `Arc` with no locking.
pub struct TriageService {
    vectorizer: Arc<dyn Vectorizer>,
    severity: Arc<dyn LabelClassifier>,
    department: Arc<dyn MultiLabelClassifier>,
    department_classes: Arc<DepartmentClasses>,
    summary: Option<BundleSummary>,
}

impl TriageService {
    /// Create a service from individual components
    pub fn new(
        vectorizer: Arc<dyn Vectorizer>,
        severity: Arc<dyn LabelClassifier>,
        department: Arc<dyn MultiLabelClassifier>,
        department_classes: DepartmentClasses,
    ) -> Self {
        Self {
            vectorizer,
            severity,
            department,
            department_classes: Arc::new(department_classes),
            summary: None,
        }
    }

    /// Create a service from artifacts loaded off disk
    pub fn from_bundle(bundle: ModelBundle) -> Self {
        let summary = bundle.summary();
        metrics::MODEL_VOCABULARY_SIZE.set(summary.vocabulary_size as f64);

        Self {
            vectorizer: Arc::new(bundle.vectorizer),
            severity: Arc::new(bundle.severity),
            department: Arc::new(bundle.department),
            department_classes: Arc::new(bundle.department_classes),
            summary: Some(summary),
        }
    }

    /// Predict the severity label for one piece of text
    pub async fn predict_severity(&self, text: &str) -> Result<Label> {
        let start = Instant::now();
        let result = self.severity_label(text);
        Self::observe("severity", &result, start);
        result
    }

    /// Predict the departments that should respond to one piece of text
    pub async fn predict_departments(&self, text: &str) -> Result<Vec<String>> {
        let start = Instant::now();
        let result = self.department_names(text);
        Self::observe("department", &result, start);
        result
    }

    fn severity_label(&self, text: &str) -> Result<Label> {
        let features = self.vectorizer.transform(&[text])?;
        self.severity
            .predict(&features)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Inference("severity model returned no prediction".to_string()))
    }

    fn department_names(&self, text: &str) -> Result<Vec<String>> {
        let features = self.vectorizer.transform(&[text])?;
        let indicator = self.department.predict(&features)?;

        if indicator.nrows() == 0 {
            return Err(AppError::Inference(
                "department model returned no prediction".to_string(),
            ));
        }

        self.department_classes.decode(indicator.row(0))
    }

    fn observe<T: std::fmt::Debug>(model: &str, result: &Result<T>, start: Instant) {
        let elapsed = start.elapsed();
        metrics::record_prediction(model, result.is_ok(), elapsed.as_secs_f64());

        match result {
            Ok(prediction) => debug!(
                model,
                prediction = ?prediction,
                elapsed_us = elapsed.as_micros() as u64,
                "Prediction complete"
            ),
            Err(e) => warn!(model, error = %e, "Prediction failed"),
        }
    }

    /// Description of the loaded artifacts, when built from a bundle
    pub fn summary(&self) -> Option<&BundleSummary> {
        self.summary.as_ref()
    }

    pub fn n_features(&self) -> usize {
        self.vectorizer.n_features()
    }

    pub fn department_classes(&self) -> &[String] {
        self.department_classes.names()
    }
}
