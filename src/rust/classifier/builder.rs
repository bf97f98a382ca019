use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;
use ort::session::Session;
use log::{info, error, warn};

use super::error::ClassifierError;
use super::encoding::SequenceScoring;
use super::classifier::EmotionClassifier;
use super::labels::LabelSet;
use crate::model_manager::{ModelFile, ModelManager};
use crate::runtime::{RuntimeConfig, create_session_builder};
use crate::BuiltinModel;

/// Sequence length assumed for custom models when none is given
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 512;

/// A builder for constructing an EmotionClassifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    config_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    session: Option<Session>,
    labels: Option<LabelSet>,
    max_sequence_length: Option<usize>,
    runtime_config: RuntimeConfig,
}

impl SequenceScoring for ClassifierBuilder {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn max_sequence_length(&self) -> usize {
        self.max_sequence_length.unwrap_or(DEFAULT_MAX_SEQUENCE_LENGTH)
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution.
    ///
    /// Must be called before a model is loaded to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Loads a built-in model from the default cache directory.
    ///
    /// # Errors
    /// `BuildError` if a model is already set, the model is not downloaded,
    /// or any of its files fail to load
    pub fn with_model(self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        let manager = ModelManager::new_default()
            .map_err(|e| ClassifierError::BuildError(format!("Failed to create model manager: {}", e)))?;
        self.with_model_from(&manager, model)
    }

    /// Loads a built-in model from the given manager's cache directory.
    pub fn with_model_from(self, manager: &ModelManager, model: BuiltinModel) -> Result<Self, ClassifierError> {
        let info = model.get_model_info();
        if !manager.is_model_downloaded(&info.name) {
            return Err(ClassifierError::BuildError(format!(
                "Model '{:?}' is not downloaded. Please download it first using ModelManager::download_model()",
                model
            )));
        }

        let characteristics = model.characteristics();
        let builder = self.with_model_dir(
            manager.get_model_dir(&info.name),
            Some(characteristics.max_sequence_length),
        )?;
        if let Some(labels) = &builder.labels {
            check_label_count(model, characteristics.num_labels, labels);
        }
        Ok(builder)
    }

    /// Loads a model from a directory containing `model.onnx`,
    /// `tokenizer.json` and `config.json`.
    ///
    /// `max_sequence_length` defaults to 512 tokens when not provided.
    ///
    /// # Example
    /// ```no_run
    /// use emotion_detector::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_model_dir("path/to/exported-model", Some(256));
    /// ```
    pub fn with_model_dir(
        mut self,
        dir: impl AsRef<Path>,
        max_sequence_length: Option<usize>,
    ) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() {
            return Err(ClassifierError::BuildError("Model already set".to_string()));
        }
        if max_sequence_length == Some(0) {
            return Err(ClassifierError::ValidationError("Max sequence length must be positive".into()));
        }

        let dir = dir.as_ref();
        let model_path = dir.join(ModelFile::Model.file_name());
        let tokenizer_path = dir.join(ModelFile::Tokenizer.file_name());
        let config_path = dir.join(ModelFile::Config.file_name());
        for path in [&model_path, &tokenizer_path, &config_path] {
            if !path.exists() {
                return Err(ClassifierError::BuildError(format!("Model file not found: {:?}", path)));
            }
        }

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| {
                error!("Failed to load tokenizer: {}", e);
                ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
            })?;
        info!("Tokenizer loaded successfully");

        let labels = LabelSet::from_config_file(&config_path)?;
        info!("Discovered {} labels: {:?}", labels.len(), labels.labels());

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(&model_path)?;
        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string_lossy().to_string());
        self.config_path = Some(config_path.to_string_lossy().to_string());
        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        self.labels = Some(labels);
        self.max_sequence_length = max_sequence_length;
        Ok(self)
    }

    /// Builds and returns the final EmotionClassifier instance.
    ///
    /// A probe input is run through the model to check that it emits one
    /// logit per discovered label.
    ///
    /// # Errors
    /// `BuildError` if no model is set or the probe output does not match the labels
    pub fn build(mut self) -> Result<EmotionClassifier, ClassifierError> {
        let labels = self.labels.take()
            .ok_or_else(|| ClassifierError::BuildError("Model must be set before building".to_string()))?;

        let probe = self.tokenize("Probe input to check the classification head")?;
        let logits = self.logits(&probe)?;
        if logits.len() != labels.len() {
            return Err(ClassifierError::BuildError(format!(
                "Model emits {} logits but its config declares {} labels",
                logits.len(),
                labels.len()
            )));
        }

        let max_sequence_length = SequenceScoring::max_sequence_length(&self);
        let missing = |what: &str| ClassifierError::BuildError(format!("No {} loaded", what));

        Ok(EmotionClassifier {
            model_path: self.model_path.take().ok_or_else(|| missing("model path"))?,
            tokenizer_path: self.tokenizer_path.take().ok_or_else(|| missing("tokenizer path"))?,
            config_path: self.config_path.take().ok_or_else(|| missing("config path"))?,
            tokenizer: Arc::new(self.tokenizer.take().ok_or_else(|| missing("tokenizer"))?),
            session: Arc::new(self.session.take().ok_or_else(|| missing("ONNX model"))?),
            labels,
            max_sequence_length,
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        if !session.inputs.iter().any(|input| input.name == "input_ids") {
            return Err(ClassifierError::ModelError(
                "Model must declare an 'input_ids' input".to_string()
            ));
        }

        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for logits".to_string()
            ));
        }

        Ok(())
    }
}

/// Warns when a built-in model's `config.json` disagrees with its catalog entry.
/// The discovered labels still win; returns whether the counts agree.
fn check_label_count(model: BuiltinModel, expected: usize, labels: &LabelSet) -> bool {
    if labels.len() == expected {
        return true;
    }
    warn!(
        "{:?} is catalogued with {} labels but its config declares {}: {:?}",
        model,
        expected,
        labels.len(),
        labels.labels()
    );
    false
}
