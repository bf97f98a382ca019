mod error;
mod encoding;
mod labels;
#[allow(clippy::module_inception)]
mod classifier;
pub mod builder;
mod utils;

pub use error::ClassifierError;
pub use classifier::EmotionClassifier;
pub use builder::ClassifierBuilder;
pub use labels::{LabelSet, ScoreFunction};

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the tokenizer file
    pub tokenizer_path: String,
    /// Path to the model configuration the labels were read from
    pub config_path: String,
    /// Number of classes the model scores
    pub num_classes: usize,
    /// Labels of the classes, in model output order
    pub class_labels: Vec<String>,
    /// How logits are turned into confidences
    pub score_function: ScoreFunction,
    /// Longest input the model accepts, in tokens
    pub max_sequence_length: usize,
}
