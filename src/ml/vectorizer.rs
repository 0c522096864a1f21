use crate::error::{AppError, Result};
use crate::ml::models::{FitOptions, Norm, VectorizerConfig};
use ndarray::{Array1, Array2};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Turns raw text into feature rows
pub trait Vectorizer: Send + Sync {
    /// Transform a batch of documents into an (n_docs × n_features) matrix
    fn transform(&self, docs: &[&str]) -> Result<Array2<f64>>;

    /// Number of output columns
    fn n_features(&self) -> usize;
}

/// On-disk layout of a fitted vectorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorizerFile {
    vocabulary: HashMap<String, usize>,
    #[serde(default)]
    idf: Option<Vec<f64>>,
    #[serde(flatten)]
    config: VectorizerConfig,
}

/// Fitted TF-IDF (or plain count, when no IDF weights are stored) vectorizer
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    /// Vocabulary mapping (term -> column)
    vocabulary: HashMap<String, usize>,

    /// Inverse document frequency per column
    idf: Option<Array1<f64>>,

    /// Analysis settings
    config: VectorizerConfig,

    token_regex: Regex,
    stop_words: HashSet<String>,
}

impl TfidfVectorizer {
    /// Assemble a vectorizer from an existing vocabulary
    pub fn from_parts(
        vocabulary: HashMap<String, usize>,
        idf: Option<Vec<f64>>,
        config: VectorizerConfig,
    ) -> Result<Self> {
        let n_features = vocabulary.len();
        let mut seen = vec![false; n_features];

        for (term, &idx) in &vocabulary {
            if idx >= n_features || seen[idx] {
                return Err(AppError::Validation(format!(
                    "vocabulary index {} for term '{}' is out of range or duplicated",
                    idx, term
                )));
            }
            seen[idx] = true;
        }

        if let Some(ref weights) = idf {
            if weights.len() != n_features {
                return Err(AppError::Validation(format!(
                    "idf has {} weights but vocabulary has {} terms",
                    weights.len(),
                    n_features
                )));
            }
        }

        let (min_n, max_n) = config.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(AppError::Validation(format!(
                "invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }

        let token_regex = Regex::new(&config.token_pattern).map_err(|e| {
            AppError::Validation(format!("invalid token_pattern: {}", e))
        })?;

        // Matched against tokens exactly as stored
        let stop_words = config.stop_words.iter().cloned().collect();

        Ok(Self {
            vocabulary,
            idf: idf.map(Array1::from_vec),
            config,
            token_regex,
            stop_words,
        })
    }

    /// Build a vocabulary (and IDF weights) from a corpus
    pub fn fit(docs: &[&str], config: VectorizerConfig, options: &FitOptions) -> Result<Self> {
        // Analyze with an empty vocabulary to reuse tokenization settings
        let analyzer = Self::from_parts(HashMap::new(), None, config.clone())?;

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut term_freq: HashMap<String, usize> = HashMap::new();

        for doc in docs {
            let terms = analyzer.analyze(doc);
            let unique: HashSet<&String> = terms.iter().collect();
            for term in unique {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            for term in terms {
                *term_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut kept: Vec<String> = doc_freq
            .iter()
            .filter(|(_, df)| **df >= options.min_doc_freq)
            .map(|(term, _)| term.clone())
            .collect();

        if let Some(max_features) = options.max_features {
            kept.sort_by(|a, b| term_freq[b].cmp(&term_freq[a]).then_with(|| a.cmp(b)));
            kept.truncate(max_features);
        }

        if kept.is_empty() {
            return Err(AppError::Validation(
                "empty vocabulary; documents may contain only stop words".to_string(),
            ));
        }

        // Columns are ordered alphabetically by term
        kept.sort();

        let n_docs = docs.len() as f64;
        let idf = options.use_idf.then(|| {
            kept.iter()
                .map(|term| ((1.0 + n_docs) / (1.0 + doc_freq[term] as f64)).ln() + 1.0)
                .collect::<Vec<f64>>()
        });

        let vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();

        Self::from_parts(vocabulary, idf, config)
    }

    /// Load a fitted vectorizer from a JSON artifact
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| AppError::model_load(path, e))?;
        let file: VectorizerFile =
            serde_json::from_str(&contents).map_err(|e| AppError::model_load(path, e))?;

        Self::from_parts(file.vocabulary, file.idf, file.config)
            .map_err(|e| AppError::model_load(path, e))
    }

    /// Write the vectorizer as a JSON artifact
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = VectorizerFile {
            vocabulary: self.vocabulary.clone(),
            idf: self.idf.as_ref().map(|idf| idf.to_vec()),
            config: self.config.clone(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Split a document into the terms looked up in the vocabulary
    fn analyze(&self, doc: &str) -> Vec<String> {
        let text = if self.config.lowercase {
            doc.to_lowercase()
        } else {
            doc.to_string()
        };

        let tokens: Vec<&str> = self
            .token_regex
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .collect();

        let (min_n, max_n) = self.config.ngram_range;
        let mut terms = Vec::new();

        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }

        terms
    }

    /// Column index of a term, if it is in the vocabulary
    pub fn column_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Get vocabulary size
    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn uses_idf(&self) -> bool {
        self.idf.is_some()
    }
}

impl Vectorizer for TfidfVectorizer {
    fn transform(&self, docs: &[&str]) -> Result<Array2<f64>> {
        let mut matrix = Array2::zeros((docs.len(), self.vocabulary.len()));

        for (row_idx, doc) in docs.iter().enumerate() {
            let mut counts: HashMap<usize, f64> = HashMap::new();
            for term in self.analyze(doc) {
                if let Some(&col) = self.vocabulary.get(&term) {
                    *counts.entry(col).or_insert(0.0) += 1.0;
                }
            }

            let mut row = matrix.row_mut(row_idx);
            for (col, count) in counts {
                let tf = if self.config.binary {
                    1.0
                } else if self.config.sublinear_tf {
                    1.0 + count.ln()
                } else {
                    count
                };

                row[col] = match self.idf {
                    Some(ref idf) => tf * idf[col],
                    None => tf,
                };
            }

            let length = match self.config.norm {
                Some(Norm::L2) => row.iter().map(|v| v * v).sum::<f64>().sqrt(),
                Some(Norm::L1) => row.iter().map(|v| v.abs()).sum::<f64>(),
                None => 0.0,
            };

            // All-zero rows (empty or out-of-vocabulary text) stay zero
            if length > 0.0 {
                row.mapv_inplace(|v| v / length);
            }
        }

        Ok(matrix)
    }

    fn n_features(&self) -> usize {
        self.vocabulary.len()
    }
}
