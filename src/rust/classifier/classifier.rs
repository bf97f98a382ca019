use std::sync::Arc;
use ort::session::Session;
use tokenizers::Tokenizer;

use super::error::ClassifierError;
use super::encoding::SequenceScoring;
use super::labels::LabelSet;
use crate::prediction::{EmotionModel, EmotionPrediction, PredictionSet};

/// An emotion classifier backed by an ONNX sequence-classification model.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync`: the tokenizer and session are
/// wrapped in `Arc` and never mutated after construction, so one instance can
/// serve every request in the process.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use emotion_detector::{BuiltinModel, EmotionClassifier};
///
/// let classifier = EmotionClassifier::builder()
///     .with_model(BuiltinModel::EmotionDistilRoberta)?
///     .build()?;
///
/// for prediction in classifier.predict("I am so happy today!")? {
///     println!("{}: {:.4}", prediction.label, prediction.score);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EmotionClassifier {
    pub model_path: String,
    pub tokenizer_path: String,
    pub config_path: String,
    pub tokenizer: Arc<Tokenizer>,
    pub session: Arc<Session>,
    pub labels: LabelSet,
    pub max_sequence_length: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<EmotionClassifier>();
    }
};

impl SequenceScoring for EmotionClassifier {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }
}

impl EmotionClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            config_path: self.config_path.clone(),
            num_classes: self.labels.len(),
            class_labels: self.labels.labels().to_vec(),
            score_function: self.labels.score_function(),
            max_sequence_length: self.max_sequence_length,
        }
    }

    /// Scores `text` against every label, in the model's label order.
    ///
    /// # Errors
    /// - `ValidationError` for empty input, `InputTooLong` past the token limit
    /// - `TokenizerError` / `ModelError` / `PredictionError` when inference fails
    pub fn predict(&self, text: &str) -> Result<PredictionSet, ClassifierError> {
        if text.is_empty() {
            return Err(ClassifierError::ValidationError("Input text cannot be empty".into()));
        }

        let encoded = self.tokenize(text)?;
        log::debug!("Running model on {} tokens", encoded.len());
        let logits = self.logits(&encoded)?;

        Ok(self.labels.score(&logits)?
            .into_iter()
            .map(|(label, score)| EmotionPrediction::new(label, score))
            .collect())
    }
}

impl EmotionModel for EmotionClassifier {
    fn labels(&self) -> &[String] {
        self.labels.labels()
    }

    fn classify(&self, text: &str) -> Result<PredictionSet, ClassifierError> {
        self.predict(text)
    }

    fn token_count(&self, text: &str) -> Option<usize> {
        self.count_tokens(text).ok()
    }
}
