/// Represents the available built-in models in the library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// DistilRoBERTa fine-tuned for English emotion classification
    ///
    /// Characteristics:
    /// - Labels: anger, disgust, fear, joy, neutral, sadness, surprise
    /// - Max sequence length: 512
    /// - Size: ~330MB
    EmotionDistilRoberta,
}

/// Characteristics of a model including its capabilities and requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCharacteristics {
    /// Maximum sequence length the model can handle, special tokens included
    pub max_sequence_length: usize,
    /// Number of classes the model scores
    pub num_labels: usize,
    /// Approximate size of the model in memory
    pub model_size_mb: usize,
}

/// Where a model's files live and the digests they are expected to hash to.
///
/// A `None` digest skips verification for that file.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub repo: String,
    pub model_url: String,
    pub tokenizer_url: String,
    pub config_url: String,
    pub model_hash: Option<String>,
    pub tokenizer_hash: Option<String>,
    pub config_hash: Option<String>,
}

const HF_BASE: &str = "https://huggingface.co";

impl ModelInfo {
    /// Builds the info for a Hugging Face repository using the conventional file layout.
    pub fn from_hf_repo(name: impl Into<String>, repo: impl Into<String>, revision: &str) -> Self {
        let repo = repo.into();
        let url = |file: &str| format!("{HF_BASE}/{repo}/resolve/{revision}/{file}");
        Self {
            name: name.into(),
            model_url: url("onnx/model.onnx"),
            tokenizer_url: url("tokenizer.json"),
            config_url: url("config.json"),
            repo,
            model_hash: None,
            tokenizer_hash: None,
            config_hash: None,
        }
    }
}

impl BuiltinModel {
    /// Get the characteristics of the model
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::EmotionDistilRoberta => ModelCharacteristics {
                max_sequence_length: 512,
                num_labels: 7,
                model_size_mb: 330,
            },
        }
    }

    /// Get the download locations for the model files
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            Self::EmotionDistilRoberta => ModelInfo::from_hf_repo(
                "emotion-english-distilroberta-base",
                "j-hartmann/emotion-english-distilroberta-base",
                "main",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_urls() {
        let info = BuiltinModel::EmotionDistilRoberta.get_model_info();
        assert_eq!(info.name, "emotion-english-distilroberta-base");
        assert!(info.model_url.starts_with("https://huggingface.co/j-hartmann/"));
        assert!(info.model_url.ends_with("/onnx/model.onnx"));
        assert!(info.tokenizer_url.ends_with("/resolve/main/tokenizer.json"));
        assert!(info.config_url.ends_with("/resolve/main/config.json"));
    }

    #[test]
    fn test_characteristics() {
        let characteristics = BuiltinModel::EmotionDistilRoberta.characteristics();
        assert_eq!(characteristics.max_sequence_length, 512);
        assert_eq!(characteristics.num_labels, 7);
    }
}
