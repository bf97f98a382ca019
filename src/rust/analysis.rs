//! The request boundary between a user submission and the model.

use std::collections::HashSet;
use tokio::task::JoinError;

use crate::prediction::{EmotionModel, PredictionSet, SharedModel};

/// Why a submission produced no result. Both kinds leave the page usable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// Nothing but whitespace was submitted; the model was not called
    #[error("Please enter some text first.")]
    EmptyInput,
    /// The model failed on this input
    #[error("An error occurred: {0}")]
    Inference(String),
}

impl AnalysisError {
    /// Validation problems are shown as warnings, failures as errors.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }
}

/// Scores `text` with `model`.
///
/// Whitespace-only input is rejected without invoking the model. Any model
/// failure, or output that breaks the prediction-set invariants, becomes
/// [`AnalysisError::Inference`].
pub fn analyze(model: &dyn EmotionModel, text: &str) -> Result<PredictionSet, AnalysisError> {
    if text.trim().is_empty() {
        log::debug!("Rejected empty submission");
        return Err(AnalysisError::EmptyInput);
    }

    let predictions = model.classify(text).map_err(|e| {
        if e.is_input_error() {
            log::warn!("Input rejected by model: {}", e);
        } else {
            log::error!("Inference failed: {}", e);
        }
        AnalysisError::Inference(e.to_string())
    })?;
    check_predictions(&predictions, model.labels())?;

    if let Some(top) = predictions.iter().max_by(|a, b| a.score.total_cmp(&b.score)) {
        let tokens = model.token_count(text)
            .map_or_else(|| "?".to_string(), |n| n.to_string());
        log::info!(
            "Analyzed {} chars ({} tokens): {} labels, top '{}' ({:.4})",
            text.chars().count(),
            tokens,
            predictions.len(),
            top.label,
            top.score
        );
    }
    Ok(predictions)
}

/// Runs [`analyze`] on the blocking pool so inference never stalls the
/// async runtime. A panic inside the model is reported as an inference error.
pub async fn analyze_shared(model: SharedModel, text: String) -> Result<PredictionSet, AnalysisError> {
    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    tokio::task::spawn_blocking(move || analyze(model.as_ref(), &text))
        .await
        .unwrap_or_else(|e| Err(AnalysisError::Inference(describe_join_error(e))))
}

fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    log::error!("Inference panicked: {}", message);
    format!("inference panicked: {}", message)
}

/// The set must be a permutation of `declared`: every label exactly once.
fn check_predictions(predictions: &PredictionSet, declared: &[String]) -> Result<(), AnalysisError> {
    let fail = |msg: String| Err(AnalysisError::Inference(msg));

    if predictions.is_empty() {
        return fail("model returned no predictions".to_string());
    }
    if predictions.len() != declared.len() {
        return fail(format!(
            "model returned {} scores for {} labels",
            predictions.len(),
            declared.len()
        ));
    }
    if let Some(foreign) = predictions.iter().find(|p| !declared.contains(&p.label)) {
        return fail(format!("label '{}' is not one the model declares", foreign.label));
    }
    if let Some(bad) = predictions.iter().find(|p| !(0.0..=1.0).contains(&p.score)) {
        return fail(format!("score {} for '{}' is outside [0, 1]", bad.score, bad.label));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = predictions.iter().find(|p| !seen.insert(p.label.as_str())) {
        return fail(format!("label '{}' returned twice", dup.label));
    }
    Ok(())
}
