use std::sync::Arc;
use serde::Serialize;

use crate::classifier::ClassifierError;

/// One (label, confidence) pair as returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionPrediction {
    pub label: String,
    /// Confidence in `[0, 1]`, full precision
    pub score: f32,
}

impl EmotionPrediction {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Scores for every label the model supports, in the model's own order.
pub type PredictionSet = Vec<EmotionPrediction>;

/// Anything that can score a text against a fixed set of emotion labels.
///
/// Implementations are shared read-only across requests, so `classify` takes
/// `&self` and the trait requires `Send + Sync`.
pub trait EmotionModel: Send + Sync {
    /// The labels this model scores, in output order
    fn labels(&self) -> &[String];

    /// Returns one prediction per label for `text`
    fn classify(&self, text: &str) -> Result<PredictionSet, ClassifierError>;

    /// Tokens the model would see for `text`, when the model can tell
    fn token_count(&self, _text: &str) -> Option<usize> {
        None
    }
}

/// The process-wide model handle.
pub type SharedModel = Arc<dyn EmotionModel>;
