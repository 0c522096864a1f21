use crate::config::ModelsConfig;
use crate::error::{AppError, Result};
use crate::ml::classes::DepartmentClasses;
use crate::ml::classifier::{DepartmentModel, LabelClassifier, MultiLabelClassifier, SeverityModel};
use crate::ml::models::BundleSummary;
use crate::ml::vectorizer::{TfidfVectorizer, Vectorizer};
use tracing::info;

/// The four artifacts the service needs, loaded and cross-checked
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub vectorizer: TfidfVectorizer,
    pub severity: SeverityModel,
    pub department: DepartmentModel,
    pub department_classes: DepartmentClasses,
}

impl ModelBundle {
    /// Load every artifact named in `config`
    pub fn load(config: &ModelsConfig) -> Result<Self> {
        let vectorizer_path = config.vectorizer_path();
        let vectorizer = TfidfVectorizer::from_file(&vectorizer_path)?;
        info!(
            path = %vectorizer_path.display(),
            vocabulary_size = vectorizer.vocab_size(),
            idf = vectorizer.uses_idf(),
            "Loaded vectorizer"
        );

        let severity_path = config.severity_model_path();
        let severity = SeverityModel::from_file(&severity_path)?;
        info!(
            path = %severity_path.display(),
            kind = %severity.kind(),
            classes = severity.classes().len(),
            "Loaded severity model"
        );

        let department_path = config.department_model_path();
        let department = DepartmentModel::from_file(&department_path)?;
        info!(
            path = %department_path.display(),
            kind = %department.kind(),
            labels = department.n_labels(),
            "Loaded department model"
        );

        let classes_path = config.department_classes_path();
        let department_classes = DepartmentClasses::from_file(&classes_path)?;
        info!(
            path = %classes_path.display(),
            classes = ?department_classes.names(),
            "Loaded department classes"
        );

        let bundle = Self {
            vectorizer,
            severity,
            department,
            department_classes,
        };

        bundle.check_consistency(config)?;
        Ok(bundle)
    }

    /// Verify every model agrees with the vectorizer's feature space and
    /// the department model agrees with the class array
    pub fn check_consistency(&self, config: &ModelsConfig) -> Result<()> {
        let n_features = self.vectorizer.n_features();

        if self.severity.n_features() != n_features {
            return Err(AppError::model_load(
                config.severity_model_path(),
                format!(
                    "model expects {} features but vectorizer produces {}",
                    self.severity.n_features(),
                    n_features
                ),
            ));
        }

        if self.department.n_features() != n_features {
            return Err(AppError::model_load(
                config.department_model_path(),
                format!(
                    "model expects {} features but vectorizer produces {}",
                    self.department.n_features(),
                    n_features
                ),
            ));
        }

        if self.department.n_labels() != self.department_classes.len() {
            return Err(AppError::model_load(
                config.department_classes_path(),
                format!(
                    "{} class names for a model with {} labels",
                    self.department_classes.len(),
                    self.department.n_labels()
                ),
            ));
        }

        Ok(())
    }

    pub fn summary(&self) -> BundleSummary {
        BundleSummary {
            vocabulary_size: self.vectorizer.vocab_size(),
            severity_kind: self.severity.kind(),
            severity_classes: self.severity.classes().to_vec(),
            department_kind: self.department.kind(),
            department_classes: self.department_classes.names().to_vec(),
        }
    }

    /// Write all four artifacts into the directory described by `config`
    pub fn save(&self, config: &ModelsConfig) -> Result<()> {
        std::fs::create_dir_all(&config.dir)?;
        self.vectorizer.save(&config.vectorizer_path())?;
        self.severity.save(&config.severity_model_path())?;
        self.department.save(&config.department_model_path())?;
        self.department_classes
            .save(&config.department_classes_path())?;
        Ok(())
    }
}
