use ort::Error as OrtError;
use std::fmt;

/// Failures while loading the emotion model or scoring a text with it.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// `tokenizer.json` could not be loaded, or a text could not be encoded
    TokenizerError(String),
    /// The ONNX session could not be created or run
    ModelError(String),
    /// Model files, labels or structure are unusable
    BuildError(String),
    /// The model ran but its output cannot be read as one row of logits
    PredictionError(String),
    /// Bad caller input, such as an empty text
    ValidationError(String),
    /// The text encodes to more tokens than the model accepts
    InputTooLong { tokens: usize, max: usize },
}

impl ClassifierError {
    /// True when the text itself was rejected, as opposed to the model failing.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::ValidationError(_) | Self::InputTooLong { .. })
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenizerError(msg) => write!(f, "Tokenizer error: {}", msg),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::InputTooLong { tokens, max } => write!(
                f,
                "Input text too long: {} tokens (max: {}). Try a shorter passage.",
                tokens, max
            ),
        }
    }
}

impl std::error::Error for ClassifierError {}

// Session construction is the only place ort errors reach `?` unmapped.
impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::BuildError(err.to_string())
    }
}

impl From<tokenizers::Error> for ClassifierError {
    fn from(err: tokenizers::Error) -> Self {
        ClassifierError::TokenizerError(err.to_string())
    }
}
