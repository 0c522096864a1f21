use crate::error::{AppError, Result};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Department names parallel to the department model's output positions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepartmentClasses {
    classes: Vec<String>,
}

impl DepartmentClasses {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| AppError::model_load(path, e))?;
        serde_json::from_str(&contents).map_err(|e| AppError::model_load(path, e))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Names of every position holding 1, in class-index order
    pub fn decode(&self, indicator: ArrayView1<u8>) -> Result<Vec<String>> {
        if indicator.len() > self.classes.len() {
            return Err(AppError::Inference(format!(
                "indicator has {} positions but only {} department classes are known",
                indicator.len(),
                self.classes.len()
            )));
        }

        Ok(indicator
            .iter()
            .zip(&self.classes)
            .filter(|(flag, _)| **flag == 1)
            .map(|(_, name)| name.clone())
            .collect())
    }

    pub fn names(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
