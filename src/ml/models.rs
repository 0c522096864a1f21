use crate::error::{AppError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// A predicted class label exactly as stored in the model artifact.
///
/// Severity models may be trained on string labels ("high") or integer
/// labels (3); the service passes whichever it finds through untouched.
pub type Label = serde_json::Value;

/// Vector normalization applied to each transformed row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// Text analysis settings stored alongside a fitted vocabulary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Lowercase text before tokenizing
    pub lowercase: bool,

    /// N-gram range (min, max), inclusive
    pub ngram_range: (usize, usize),

    /// Regex whose matches are the tokens
    pub token_pattern: String,

    /// Tokens dropped before n-gram generation
    pub stop_words: Vec<String>,

    /// Row normalization (`None` keeps raw weights)
    pub norm: Option<Norm>,

    /// Replace tf with 1 + ln(tf)
    pub sublinear_tf: bool,

    /// Count presence instead of occurrences
    pub binary: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            ngram_range: (1, 1),
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
            stop_words: Vec::new(),
            norm: Some(Norm::L2),
            sublinear_tf: false,
            binary: false,
        }
    }
}

/// Tokens of two or more word characters
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Options that only matter while building a vocabulary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitOptions {
    /// Weight terms by smoothed inverse document frequency
    pub use_idf: bool,

    /// Minimum number of documents a term must appear in
    pub min_doc_freq: usize,

    /// Keep only the most frequent terms
    pub max_features: Option<usize>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            use_idf: true,
            min_doc_freq: 1,
            max_features: None,
        }
    }
}

/// Model family of a loaded artifact
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelKind {
    /// Linear decision function (logistic regression, linear SVM, ...)
    Linear,

    /// Multinomial naive Bayes
    MultinomialNb,

    /// One binary linear estimator per label
    OneVsRest,
}

/// Description of the loaded models, reported by `/health` and the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleSummary {
    pub vocabulary_size: usize,
    pub severity_kind: ModelKind,
    pub severity_classes: Vec<Label>,
    pub department_kind: ModelKind,
    pub department_classes: Vec<String>,
}

/// Build a dense matrix from the row-major nested arrays used in artifacts
pub(crate) fn matrix_from_rows(rows: Vec<Vec<f64>>) -> Result<Array2<f64>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map(Vec::len).unwrap_or(0);

    if n_rows == 0 || n_cols == 0 {
        return Err(AppError::Validation("matrix must not be empty".to_string()));
    }

    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
        return Err(AppError::Validation(format!(
            "ragged matrix: row {} has {} columns, expected {}",
            idx,
            row.len(),
            n_cols
        )));
    }

    let data: Vec<f64> = rows.into_iter().flatten().collect();
    Ok(Array2::from_shape_vec((n_rows, n_cols), data)?)
}

pub(crate) fn rows_from_matrix(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}
