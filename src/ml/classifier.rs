use crate::error::{AppError, Result};
use crate::ml::models::{matrix_from_rows, rows_from_matrix, Label, ModelKind};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Single-label classifier over feature rows
pub trait LabelClassifier: Send + Sync {
    /// Predict one label per row
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<Label>>;

    /// Number of input columns the model was trained on
    fn n_features(&self) -> usize;
}

/// Multi-label classifier producing a 0/1 indicator per label
pub trait MultiLabelClassifier: Send + Sync {
    /// Predict an (n_rows × n_labels) indicator matrix
    fn predict(&self, features: &Array2<f64>) -> Result<Array2<u8>>;

    /// Number of input columns the model was trained on
    fn n_features(&self) -> usize;

    /// Number of output positions per row
    fn n_labels(&self) -> usize;
}

fn check_features(features: &Array2<f64>, expected: usize) -> Result<()> {
    if features.ncols() != expected {
        return Err(AppError::Inference(format!(
            "feature matrix has {} columns but model expects {}",
            features.ncols(),
            expected
        )));
    }
    Ok(())
}

/// Row-wise `features · weightsᵀ + offsets`
fn linear_scores(
    features: &Array2<f64>,
    weights: &Array2<f64>,
    offsets: &Array1<f64>,
) -> Array2<f64> {
    let mut scores = features.dot(&weights.t());
    for mut row in scores.rows_mut() {
        row += offsets;
    }
    scores
}

/// Index of the largest score; the first one wins ties
fn argmax(row: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (idx, &value) in row.iter().enumerate().skip(1) {
        if value > row[best] {
            best = idx;
        }
    }
    best
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| AppError::model_load(path, e))?;
    serde_json::from_str(&contents).map_err(|e| AppError::model_load(path, e))
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Linear classifier (logistic regression, linear SVM, ridge, ...)
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    classes: Vec<Label>,

    /// (n_rows × n_features); a single row with two classes is the binary case
    coef: Array2<f64>,

    intercept: Array1<f64>,
}

impl LinearClassifier {
    pub fn new(classes: Vec<Label>, coef: Array2<f64>, intercept: Array1<f64>) -> Result<Self> {
        let binary = coef.nrows() == 1 && classes.len() == 2;

        if classes.len() < 2 {
            return Err(AppError::Validation(
                "linear classifier needs at least two classes".to_string(),
            ));
        }
        if !binary && coef.nrows() != classes.len() {
            return Err(AppError::Validation(format!(
                "coef has {} rows for {} classes",
                coef.nrows(),
                classes.len()
            )));
        }
        if intercept.len() != coef.nrows() {
            return Err(AppError::Validation(format!(
                "intercept has {} values for {} coef rows",
                intercept.len(),
                coef.nrows()
            )));
        }

        Ok(Self {
            classes,
            coef,
            intercept,
        })
    }

    /// Raw decision scores, one column per coef row
    pub fn decision_function(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        check_features(features, self.coef.ncols())?;
        Ok(linear_scores(features, &self.coef, &self.intercept))
    }

    pub fn classes(&self) -> &[Label] {
        &self.classes
    }
}

impl LabelClassifier for LinearClassifier {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<Label>> {
        let scores = self.decision_function(features)?;

        let predictions = if scores.ncols() == 1 {
            scores
                .column(0)
                .iter()
                .map(|&score| self.classes[usize::from(score > 0.0)].clone())
                .collect()
        } else {
            scores
                .rows()
                .into_iter()
                .map(|row| self.classes[argmax(row)].clone())
                .collect()
        };

        Ok(predictions)
    }

    fn n_features(&self) -> usize {
        self.coef.ncols()
    }
}

/// Multinomial naive Bayes over term weights
#[derive(Debug, Clone)]
pub struct MultinomialNb {
    classes: Vec<Label>,
    class_log_prior: Array1<f64>,

    /// (n_classes × n_features)
    feature_log_prob: Array2<f64>,
}

impl MultinomialNb {
    pub fn new(
        classes: Vec<Label>,
        class_log_prior: Array1<f64>,
        feature_log_prob: Array2<f64>,
    ) -> Result<Self> {
        if classes.is_empty()
            || class_log_prior.len() != classes.len()
            || feature_log_prob.nrows() != classes.len()
        {
            return Err(AppError::Validation(format!(
                "naive Bayes shapes disagree: {} classes, {} priors, {} probability rows",
                classes.len(),
                class_log_prior.len(),
                feature_log_prob.nrows()
            )));
        }

        Ok(Self {
            classes,
            class_log_prior,
            feature_log_prob,
        })
    }

    /// Unnormalized joint log likelihood per class
    pub fn joint_log_likelihood(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        check_features(features, self.feature_log_prob.ncols())?;
        Ok(linear_scores(
            features,
            &self.feature_log_prob,
            &self.class_log_prior,
        ))
    }
}

impl LabelClassifier for MultinomialNb {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<Label>> {
        let jll = self.joint_log_likelihood(features)?;
        Ok(jll
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(row)].clone())
            .collect())
    }

    fn n_features(&self) -> usize {
        self.feature_log_prob.ncols()
    }
}

/// On-disk layout of the severity model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SeverityModelFile {
    Linear {
        classes: Vec<Label>,
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    },
    MultinomialNb {
        classes: Vec<Label>,
        class_log_prior: Vec<f64>,
        feature_log_prob: Vec<Vec<f64>>,
    },
}

/// Severity predictor loaded from `severity_model.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SeverityModelFile", into = "SeverityModelFile")]
pub enum SeverityModel {
    Linear(LinearClassifier),
    NaiveBayes(MultinomialNb),
}

impl TryFrom<SeverityModelFile> for SeverityModel {
    type Error = AppError;

    fn try_from(file: SeverityModelFile) -> Result<Self> {
        match file {
            SeverityModelFile::Linear {
                classes,
                coef,
                intercept,
            } => Ok(SeverityModel::Linear(LinearClassifier::new(
                classes,
                matrix_from_rows(coef)?,
                Array1::from_vec(intercept),
            )?)),
            SeverityModelFile::MultinomialNb {
                classes,
                class_log_prior,
                feature_log_prob,
            } => Ok(SeverityModel::NaiveBayes(MultinomialNb::new(
                classes,
                Array1::from_vec(class_log_prior),
                matrix_from_rows(feature_log_prob)?,
            )?)),
        }
    }
}

impl From<SeverityModel> for SeverityModelFile {
    fn from(model: SeverityModel) -> Self {
        match model {
            SeverityModel::Linear(m) => SeverityModelFile::Linear {
                coef: rows_from_matrix(&m.coef),
                intercept: m.intercept.to_vec(),
                classes: m.classes,
            },
            SeverityModel::NaiveBayes(m) => SeverityModelFile::MultinomialNb {
                class_log_prior: m.class_log_prior.to_vec(),
                feature_log_prob: rows_from_matrix(&m.feature_log_prob),
                classes: m.classes,
            },
        }
    }
}

impl SeverityModel {
    pub fn from_file(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            SeverityModel::Linear(_) => ModelKind::Linear,
            SeverityModel::NaiveBayes(_) => ModelKind::MultinomialNb,
        }
    }

    pub fn classes(&self) -> &[Label] {
        match self {
            SeverityModel::Linear(m) => &m.classes,
            SeverityModel::NaiveBayes(m) => &m.classes,
        }
    }
}

impl LabelClassifier for SeverityModel {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<Label>> {
        match self {
            SeverityModel::Linear(m) => m.predict(features),
            SeverityModel::NaiveBayes(m) => m.predict(features),
        }
    }

    fn n_features(&self) -> usize {
        match self {
            SeverityModel::Linear(m) => m.n_features(),
            SeverityModel::NaiveBayes(m) => m.n_features(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum DepartmentModelFile {
    OneVsRest {
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
        #[serde(default)]
        threshold: f64,
    },
}

/// One-vs-rest department predictor loaded from `department_model.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DepartmentModelFile", into = "DepartmentModelFile")]
pub struct DepartmentModel {
    /// (n_labels × n_features)
    coef: Array2<f64>,
    intercept: Array1<f64>,

    /// A label is on when its score is strictly above this
    threshold: f64,
}

impl DepartmentModel {
    pub fn new(coef: Array2<f64>, intercept: Array1<f64>, threshold: f64) -> Result<Self> {
        if intercept.len() != coef.nrows() {
            return Err(AppError::Validation(format!(
                "intercept has {} values for {} labels",
                intercept.len(),
                coef.nrows()
            )));
        }

        Ok(Self {
            coef,
            intercept,
            threshold,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    pub fn kind(&self) -> ModelKind {
        ModelKind::OneVsRest
    }

    /// Per-label decision scores
    pub fn decision_function(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        check_features(features, self.coef.ncols())?;
        Ok(linear_scores(features, &self.coef, &self.intercept))
    }
}

impl TryFrom<DepartmentModelFile> for DepartmentModel {
    type Error = AppError;

    fn try_from(file: DepartmentModelFile) -> Result<Self> {
        let DepartmentModelFile::OneVsRest {
            coef,
            intercept,
            threshold,
        } = file;
        DepartmentModel::new(matrix_from_rows(coef)?, Array1::from_vec(intercept), threshold)
    }
}

impl From<DepartmentModel> for DepartmentModelFile {
    fn from(model: DepartmentModel) -> Self {
        DepartmentModelFile::OneVsRest {
            coef: rows_from_matrix(&model.coef),
            intercept: model.intercept.to_vec(),
            threshold: model.threshold,
        }
    }
}

impl MultiLabelClassifier for DepartmentModel {
    fn predict(&self, features: &Array2<f64>) -> Result<Array2<u8>> {
        let scores = self.decision_function(features)?;
        Ok(scores.mapv(|score| u8::from(score > self.threshold)))
    }

    fn n_features(&self) -> usize {
        self.coef.ncols()
    }

    fn n_labels(&self) -> usize {
        self.coef.nrows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    #[test]
    fn test_binary_linear_classifier() {
        let model = LinearClassifier::new(
            vec![json!("low"), json!("high")],
            array![[1.0, -1.0]],
            array![0.0],
        )
        .unwrap();

        let features = array![[2.0, 0.5], [0.0, 1.0], [0.0, 0.0]];
        let labels = model.predict(&features).unwrap();

        // A score of exactly zero stays on the negative class
        assert_eq!(labels, vec![json!("high"), json!("low"), json!("low")]);
    }

    #[test]
    fn test_multiclass_linear_classifier() {
        let model = LinearClassifier::new(
            vec![json!("critical"), json!("medium"), json!("low")],
            array![[3.0, 0.0], [0.0, 1.0], [0.0, 0.0]],
            array![0.0, 0.0, 0.5],
        )
        .unwrap();

        let labels = model
            .predict(&array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]])
            .unwrap();

        assert_eq!(labels, vec![json!("critical"), json!("medium"), json!("low")]);
    }

    #[test]
    fn test_argmax_first_max_wins() {
        let model = LinearClassifier::new(
            vec![json!(1), json!(2), json!(3)],
            array![[0.0], [0.0], [0.0]],
            array![1.0, 1.0, 0.0],
        )
        .unwrap();

        assert_eq!(model.predict(&array![[5.0]]).unwrap(), vec![json!(1)]);
    }

    #[test]
    fn test_linear_classifier_shape_validation() {
        assert!(LinearClassifier::new(vec![json!("a")], array![[1.0]], array![0.0]).is_err());
        assert!(LinearClassifier::new(
            vec![json!("a"), json!("b"), json!("c")],
            array![[1.0], [2.0]],
            array![0.0, 0.0]
        )
        .is_err());
        assert!(LinearClassifier::new(
            vec![json!("a"), json!("b")],
            array![[1.0]],
            array![0.0, 1.0]
        )
        .is_err());
    }

    #[test]
    fn test_feature_mismatch_is_inference_error() {
        let model = LinearClassifier::new(
            vec![json!("low"), json!("high")],
            array![[1.0, -1.0]],
            array![0.0],
        )
        .unwrap();

        let result = model.predict(&array![[1.0, 2.0, 3.0]]);
        assert!(matches!(result, Err(AppError::Inference(_))));
    }

    #[test]
    fn test_multinomial_nb() {
        let model = MultinomialNb::new(
            vec![json!("fire"), json!("flood")],
            array![(0.5f64).ln(), (0.5f64).ln()],
            array![[(0.9f64).ln(), (0.1f64).ln()], [(0.2f64).ln(), (0.8f64).ln()]],
        )
        .unwrap();

        let labels = model.predict(&array![[3.0, 0.0], [0.0, 2.0]]).unwrap();
        assert_eq!(labels, vec![json!("fire"), json!("flood")]);
        assert_eq!(model.n_features(), 2);
    }

    #[test]
    fn test_severity_model_from_json() {
        let model: SeverityModel = serde_json::from_value(json!({
            "kind": "linear",
            "classes": ["low", "high"],
            "coef": [[1.0, 0.0, -1.0]],
            "intercept": [0.1]
        }))
        .unwrap();

        assert_eq!(model.kind(), ModelKind::Linear);
        assert_eq!(model.n_features(), 3);
        assert_eq!(model.classes(), &[json!("low"), json!("high")]);
        assert_eq!(
            model.predict(&array![[0.0, 0.0, 0.0]]).unwrap(),
            vec![json!("high")]
        );
    }

    #[test]
    fn test_severity_model_rejects_bad_json() {
        let ragged = serde_json::from_value::<SeverityModel>(json!({
            "kind": "linear",
            "classes": ["low", "high"],
            "coef": [[1.0, 0.0], [1.0]],
            "intercept": [0.0, 0.0]
        }));
        assert!(ragged.is_err());

        let unknown = serde_json::from_value::<SeverityModel>(json!({
            "kind": "random_forest",
            "classes": ["low", "high"]
        }));
        assert!(unknown.is_err());
    }

    #[test]
    fn test_department_model_threshold() {
        let model = DepartmentModel::new(
            array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            array![0.0, 0.0, -1.5],
            0.0,
        )
        .unwrap();

        let indicator = model.predict(&array![[1.0, 0.0], [1.0, 1.0]]).unwrap();

        assert_eq!(indicator, array![[1u8, 0, 0], [1, 1, 1]]);
        assert_eq!(model.n_labels(), 3);
    }

    #[test]
    fn test_department_model_json() {
        let model: DepartmentModel = serde_json::from_value(json!({
            "kind": "one_vs_rest",
            "coef": [[1.0], [-1.0]],
            "intercept": [0.0, 0.0]
        }))
        .unwrap();

        assert_eq!(model.n_features(), 1);
        assert_eq!(model.predict(&array![[2.0]]).unwrap(), array![[1u8, 0]]);

        let value = serde_json::to_value(&model).unwrap();
        assert_eq!(value["kind"], json!("one_vs_rest"));
        assert_eq!(value["threshold"], json!(0.0));
    }
}
