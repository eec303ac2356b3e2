//! JSON configuration for condition assembly.

use crate::assembly::ConditionTag;
use crate::error::{ConditionError, Result};
use crate::preprocessing::DirichletStyle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Settings for the user embedding model.
///
/// Both blocks are passed through to the model untouched; only
/// `fit.lda.doc_topic_prior` is read here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserEmbeddingConfig {
    #[serde(default)]
    pub model: Value,
    pub fit: Value,
}

impl UserEmbeddingConfig {
    pub fn new(model: Value, fit: Value) -> Self {
        Self { model, fit }
    }

    /// Lower bound of the Dirichlet document length support.
    pub fn doc_topic_prior(&self) -> Result<f64> {
        self.fit
            .pointer("/lda/doc_topic_prior")
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                ConditionError::InvalidParameter(
                    "fit.lda.doc_topic_prior must be a number".to_string(),
                )
            })
    }
}

/// Which conditions to assemble and where their data lives.
///
/// ```json
/// {
///   "tags": ["months", "is_weekend", "users"],
///   "dataset_path": "data/spain",
///   "user_embedding": { "model": { "num_topics": 8 }, "fit": { "lda": { "doc_topic_prior": 0.1 } } },
///   "dirichlet_style": "mean"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionsConfig {
    pub tags: Vec<String>,
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,
    #[serde(default)]
    pub user_embedding: Option<UserEmbeddingConfig>,
    #[serde(default)]
    pub dirichlet_style: DirichletStyle,
}

impl ConditionsConfig {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            dataset_path: None,
            user_embedding: None,
            dirichlet_style: DirichletStyle::default(),
        }
    }

    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = Some(path.into());
        self
    }

    pub fn with_user_embedding(mut self, config: UserEmbeddingConfig) -> Self {
        self.user_embedding = Some(config);
        self
    }

    pub fn with_dirichlet_style(mut self, style: DirichletStyle) -> Self {
        self.dirichlet_style = style;
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse the requested tags, failing on the first unknown one.
    pub fn condition_tags(&self) -> Result<Vec<ConditionTag>> {
        self.tags.iter().map(|t| t.parse()).collect()
    }
}
