//! Text classification for emergency reports
//!
//! This module provides:
//! - TF-IDF vectorization of free text
//! - Severity prediction (linear or multinomial naive Bayes)
//! - Multi-label department prediction (one-vs-rest)
//! - Loading and cross-checking the on-disk model artifacts

pub mod artifacts;
pub mod classes;
pub mod classifier;
pub mod models;
pub mod service;
pub mod vectorizer;

pub use artifacts::ModelBundle;
pub use classes::DepartmentClasses;
pub use classifier::{
    DepartmentModel, LabelClassifier, LinearClassifier, MultiLabelClassifier, MultinomialNb,
    SeverityModel,
};
pub use models::{BundleSummary, FitOptions, Label, ModelKind, Norm, VectorizerConfig};
pub use service::TriageService;
pub use vectorizer::{TfidfVectorizer, Vectorizer};
