//! Shared fixtures for integration tests
//!
//! Builds a small but real set of artifacts: a TF-IDF vectorizer fitted on a
//! handful of reports, a linear severity model and a one-vs-rest department
//! model whose weights key off single terms.

#![allow(dead_code)]

use emergency_ai_service::ml::{
    DepartmentClasses, DepartmentModel, FitOptions, LinearClassifier, ModelBundle, SeverityModel,
    TfidfVectorizer, VectorizerConfig,
};
use ndarray::{Array1, Array2};
use serde_json::json;

pub const DEPARTMENTS: [&str; 3] = ["ambulance", "fire", "police"];

pub const CORPUS: [&str; 4] = [
    "fire in the building",
    "car accident with injured driver",
    "robbery at the store",
    "smoke and fire near school",
];

pub fn fixture_bundle() -> ModelBundle {
    let vectorizer =
        TfidfVectorizer::fit(&CORPUS, VectorizerConfig::default(), &FitOptions::default())
            .unwrap();
    let n_features = vectorizer.vocab_size();
    let col = |term: &str| vectorizer.column_of(term).unwrap();

    // high <- fire, medium <- accident/injured, low wins on empty input
    let mut severity_coef = Array2::zeros((3, n_features));
    severity_coef[[0, col("fire")]] = 1.0;
    severity_coef[[1, col("accident")]] = 1.0;
    severity_coef[[1, col("injured")]] = 1.0;
    let severity = SeverityModel::Linear(
        LinearClassifier::new(
            vec![json!("high"), json!("medium"), json!("low")],
            severity_coef,
            Array1::from_vec(vec![0.0, 0.0, 0.1]),
        )
        .unwrap(),
    );

    let mut department_coef = Array2::zeros((3, n_features));
    department_coef[[0, col("injured")]] = 1.0;
    department_coef[[1, col("fire")]] = 1.0;
    department_coef[[1, col("smoke")]] = 1.0;
    department_coef[[2, col("robbery")]] = 1.0;
    department_coef[[2, col("accident")]] = 1.0;
    let department =
        DepartmentModel::new(department_coef, Array1::from_elem(3, -0.1), 0.0).unwrap();

    ModelBundle {
        vectorizer,
        severity,
        department,
        department_classes: DepartmentClasses::new(
            DEPARTMENTS.iter().map(|d| d.to_string()).collect(),
        ),
    }
}
