use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use serde::Deserialize;

use super::error::ClassifierError;
use super::utils::{sigmoid, softmax};

/// How raw logits become per-label confidences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFunction {
    /// Scores sum to one across labels
    Softmax,
    /// Each label is scored independently
    Sigmoid,
}

impl ScoreFunction {
    pub fn apply(&self, logits: &[f32]) -> Vec<f32> {
        match self {
            Self::Softmax => softmax(logits),
            Self::Sigmoid => sigmoid(logits),
        }
    }
}

impl fmt::Display for ScoreFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Softmax => write!(f, "softmax"),
            Self::Sigmoid => write!(f, "sigmoid"),
        }
    }
}

/// The subset of a Hugging Face `config.json` needed to interpret logits.
#[derive(Debug, Deserialize)]
struct ClassificationConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
    #[serde(default)]
    problem_type: Option<String>,
}

/// Labels discovered from the model's configuration, in logit order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSet {
    labels: Vec<String>,
    score_function: ScoreFunction,
}

impl LabelSet {
    pub fn new(labels: Vec<String>, score_function: ScoreFunction) -> Result<Self, ClassifierError> {
        if labels.is_empty() {
            return Err(ClassifierError::BuildError("Model declares no labels".into()));
        }
        {
            let mut seen = HashSet::new();
            if let Some(dup) = labels.iter().find(|label| !seen.insert(label.as_str())) {
                return Err(ClassifierError::BuildError(format!("Duplicate label '{}'", dup)));
            }
        }
        Ok(Self { labels, score_function })
    }

    pub fn from_config_file(path: &Path) -> Result<Self, ClassifierError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ClassifierError::BuildError(format!("Failed to read {:?}: {}", path, e)))?;
        Self::from_config_str(&raw)
    }

    pub fn from_config_str(raw: &str) -> Result<Self, ClassifierError> {
        let config: ClassificationConfig = serde_json::from_str(raw)
            .map_err(|e| ClassifierError::BuildError(format!("Invalid model config: {}", e)))?;

        let mut by_id = BTreeMap::new();
        for (id, label) in config.id2label {
            let id: usize = id.parse()
                .map_err(|_| ClassifierError::BuildError(format!("Non-numeric label id '{}'", id)))?;
            by_id.insert(id, label);
        }
        if let Some((pos, id)) = by_id.keys().enumerate().find(|(pos, id)| pos != *id) {
            return Err(ClassifierError::BuildError(
                format!("Label ids must be contiguous from 0, found id {} at position {}", id, pos)
            ));
        }
        let labels: Vec<String> = by_id.into_values().collect();

        let score_function = match config.problem_type.as_deref() {
            Some("multi_label_classification") => ScoreFunction::Sigmoid,
            _ if labels.len() == 1 => ScoreFunction::Sigmoid,
            _ => ScoreFunction::Softmax,
        };

        Self::new(labels, score_function)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn score_function(&self) -> ScoreFunction {
        self.score_function
    }

    /// Pairs each label with its confidence for one row of logits.
    pub fn score(&self, logits: &[f32]) -> Result<Vec<(String, f32)>, ClassifierError> {
        if logits.len() != self.labels.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Model produced {} logits for {} labels",
                logits.len(),
                self.labels.len()
            )));
        }
        let scores = self.score_function.apply(logits);
        Ok(self.labels.iter().cloned().zip(scores).collect())
    }
}
