use tokenizers::Tokenizer;
use ort::session::Session;
use ort::value::Tensor;
use ndarray::Array2;
use std::collections::HashMap;

use super::error::ClassifierError;

/// A tokenized input ready to be turned into model tensors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EncodedText {
    pub ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub type_ids: Vec<i64>,
}

impl EncodedText {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    fn tensor_for(&self, input_name: &str) -> Result<Tensor<i64>, ClassifierError> {
        let values = match input_name {
            "input_ids" => &self.ids,
            "attention_mask" => &self.attention_mask,
            "token_type_ids" => &self.type_ids,
            other => {
                return Err(ClassifierError::ModelError(format!("Unsupported model input '{}'", other)));
            }
        };
        let array = Array2::from_shape_vec((1, values.len()), values.clone())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create {} array: {}", input_name, e)))?;
        Tensor::from_array(array)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create {} tensor: {}", input_name, e)))
    }
}

/// Runs text through a sequence-classification ONNX model.
///
/// The process is:
/// 1. Tokenize the input with the model's special tokens
/// 2. Validate the token count against `max_sequence_length`
/// 3. Feed every input the session declares (`input_ids`, `attention_mask`,
///    optionally `token_type_ids`)
/// 4. Read the first output as a `[1, num_labels]` row of logits
pub(crate) trait SequenceScoring {
    /// Returns the initialized tokenizer if available
    fn tokenizer(&self) -> Option<&Tokenizer>;

    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Returns the maximum sequence length the model can handle
    fn max_sequence_length(&self) -> usize;

    /// Counts the tokens the model would see for `text`, special tokens included.
    fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        let tokenizer = self.tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;

        Ok(tokenizer.encode(text, true)?.get_ids().len())
    }

    /// Tokenizes `text`, rejecting inputs longer than the model accepts.
    ///
    /// # Errors
    /// - `TokenizerError` if the tokenizer is not initialized or encoding fails
    /// - `InputTooLong` if the token count exceeds `max_sequence_length`
    fn tokenize(&self, text: &str) -> Result<EncodedText, ClassifierError> {
        let tokenizer = self.tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;

        let encoding = tokenizer.encode(text, true)?;

        let tokens = encoding.get_ids().len();
        let max = self.max_sequence_length();
        if tokens > max {
            return Err(ClassifierError::InputTooLong { tokens, max });
        }

        let widen = |values: &[u32]| values.iter().map(|&v| i64::from(v)).collect::<Vec<_>>();
        Ok(EncodedText {
            ids: widen(encoding.get_ids()),
            attention_mask: widen(encoding.get_attention_mask()),
            type_ids: widen(encoding.get_type_ids()),
        })
    }

    /// Runs the model and returns the raw logits for a single input.
    ///
    /// # Errors
    /// - `ModelError` if the session is missing, tensor creation fails or
    ///   the model cannot be run
    /// - `PredictionError` if the output is not a single row of logits
    fn logits(&self, encoded: &EncodedText) -> Result<Vec<f32>, ClassifierError> {
        let session = self.session()
            .ok_or_else(|| ClassifierError::ModelError("Session not initialized".into()))?;

        let mut input_tensors = HashMap::new();
        for input in &session.inputs {
            input_tensors.insert(input.name.as_str(), encoded.tensor_for(&input.name)?);
        }

        let outputs = session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        let shape = output_tensor.shape();
        if shape.len() != 2 || shape[0] != 1 {
            return Err(ClassifierError::PredictionError(
                format!("Expected logits of shape [1, num_labels], got {:?}", shape)
            ));
        }

        Ok(output_tensor.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // Whitespace-split word-level vocabulary, no special tokens.
    const WORD_TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": { "[UNK]": 0, "i": 1, "am": 2, "so": 3, "happy": 4 },
            "unk_token": "[UNK]"
        }
    }"#;

    struct TokenizerOnly {
        tokenizer: Option<Tokenizer>,
        max: usize,
    }

    impl SequenceScoring for TokenizerOnly {
        fn tokenizer(&self) -> Option<&Tokenizer> {
            self.tokenizer.as_ref()
        }

        fn session(&self) -> Option<&Session> {
            None
        }

        fn max_sequence_length(&self) -> usize {
            self.max
        }
    }

    fn scorer(max: usize) -> TokenizerOnly {
        TokenizerOnly {
            tokenizer: Some(Tokenizer::from_str(WORD_TOKENIZER).unwrap()),
            max,
        }
    }

    #[test]
    fn test_count_tokens() {
        let scorer = scorer(8);
        assert_eq!(scorer.count_tokens("i am so happy").unwrap(), 4);
        assert_eq!(scorer.count_tokens("i am").unwrap(), 2);
    }

    #[test]
    fn test_tokenize_widens_ids_and_mask() {
        let encoded = scorer(8).tokenize("i am happy").unwrap();
        assert_eq!(encoded.ids, vec![1, 2, 4]);
        assert_eq!(encoded.attention_mask, vec![1, 1, 1]);
        assert_eq!(encoded.type_ids.len(), 3);
        assert_eq!(encoded.len(), 3);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let encoded = scorer(8).tokenize("i am ecstatic").unwrap();
        assert_eq!(encoded.ids, vec![1, 2, 0]);
    }

    #[test]
    fn test_over_long_input_is_rejected() {
        let result = scorer(3).tokenize("i am so happy");
        assert_eq!(result, Err(ClassifierError::InputTooLong { tokens: 4, max: 3 }));
    }

    #[test]
    fn test_missing_tokenizer_and_session() {
        let scorer = TokenizerOnly { tokenizer: None, max: 8 };
        assert!(matches!(scorer.count_tokens("hi"), Err(ClassifierError::TokenizerError(_))));

        let encoded = EncodedText { ids: vec![1], attention_mask: vec![1], type_ids: vec![0] };
        assert!(matches!(scorer.logits(&encoded), Err(ClassifierError::ModelError(_))));
    }

    #[test]
    fn test_unsupported_model_input() {
        let encoded = EncodedText { ids: vec![1], attention_mask: vec![1], type_ids: vec![0] };
        assert!(matches!(encoded.tensor_for("pixel_values"), Err(ClassifierError::ModelError(_))));
    }
}
