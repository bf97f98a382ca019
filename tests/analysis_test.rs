use emotion_detector::{
    analyze, analyze_shared, format, AnalysisError, ClassifierError, EmotionModel,
    EmotionPrediction, PredictionSet, SharedModel,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const LABELS: [&str; 7] = ["anger", "disgust", "fear", "joy", "neutral", "sadness", "surprise"];

/// Puts most of the mass on whichever label's keyword appears in the text.
struct KeywordModel {
    labels: Vec<String>,
    calls: AtomicUsize,
}

impl KeywordModel {
    fn new() -> Self {
        Self {
            labels: LABELS.iter().map(|l| l.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmotionModel for KeywordModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, text: &str) -> Result<PredictionSet, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        let hit = if lower.contains("happy") {
            "joy"
        } else if lower.contains("furious") {
            "anger"
        } else {
            "neutral"
        };
        let rest = 0.1 / (self.labels.len() - 1) as f32;
        Ok(self
            .labels
            .iter()
            .map(|l| EmotionPrediction::new(l.clone(), if l == hit { 0.9 } else { rest }))
            .collect())
    }
}

/// Fails on its first call only.
struct FlakyModel {
    inner: KeywordModel,
}

impl EmotionModel for FlakyModel {
    fn labels(&self) -> &[String] {
        self.inner.labels()
    }

    fn classify(&self, text: &str) -> Result<PredictionSet, ClassifierError> {
        if self.inner.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(ClassifierError::PredictionError("session exploded".into()));
        }
        self.inner.classify(text)
    }
}

/// Declares the seven emotions but returns a fixed, possibly mismatched, set.
struct FixedOutputModel {
    labels: Vec<String>,
    output: Vec<(&'static str, f32)>,
}

impl FixedOutputModel {
    fn new(output: Vec<(&'static str, f32)>) -> Self {
        Self {
            labels: LABELS.iter().map(|l| l.to_string()).collect(),
            output,
        }
    }
}

impl EmotionModel for FixedOutputModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, _text: &str) -> Result<PredictionSet, ClassifierError> {
        Ok(self.output.iter().map(|&(l, s)| EmotionPrediction::new(l, s)).collect())
    }
}

#[test]
fn test_partial_label_set_is_an_inference_error() {
    let model = FixedOutputModel::new(vec![("joy", 0.7), ("anger", 0.2), ("sadness", 0.1)]);
    match analyze(&model, "I am so happy today!") {
        Err(AnalysisError::Inference(msg)) => assert!(msg.contains("3 scores for 7 labels")),
        other => panic!("expected inference error, got {:?}", other),
    }
}

#[test]
fn test_undeclared_label_is_an_inference_error() {
    let mut output: Vec<_> = LABELS[..6].iter().map(|&l| (l, 0.1)).collect();
    output.push(("optimism", 0.4));
    let model = FixedOutputModel::new(output);
    match analyze(&model, "I am so happy today!") {
        Err(AnalysisError::Inference(msg)) => assert!(msg.contains("optimism")),
        other => panic!("expected inference error, got {:?}", other),
    }
}

#[test]
fn test_empty_input_is_rejected_without_inference() {
    let model = KeywordModel::new();
    for text in ["", "   ", "\n\t  \n"] {
        assert_eq!(analyze(&model, text), Err(AnalysisError::EmptyInput));
    }
    assert_eq!(model.calls(), 0);
}

#[test]
fn test_happy_text_ranks_joy_first() -> Result<(), AnalysisError> {
    let model = KeywordModel::new();
    let predictions = analyze(&model, "I am so happy today!")?;
    let result = format(&predictions);

    let top = result.top().expect("at least one row");
    assert_eq!(top.label, "joy");
    assert_eq!(top.glyph, "😄");
    assert_eq!(model.calls(), 1);
    Ok(())
}

#[test]
fn test_every_label_scored_once() -> Result<(), AnalysisError> {
    let model = KeywordModel::new();
    let predictions = analyze(&model, "I am absolutely furious")?;

    let mut labels: Vec<_> = predictions.iter().map(|p| p.label.as_str()).collect();
    labels.sort_unstable();
    assert_eq!(labels, LABELS.to_vec());
    assert!(predictions.iter().all(|p| (0.0..=1.0).contains(&p.score)));

    let result = format(&predictions);
    assert_eq!(result.table.len(), LABELS.len());
    assert_eq!(result.top().map(|r| r.label.as_str()), Some("anger"));
    Ok(())
}

#[test]
fn test_failure_then_recovery() {
    let model = FlakyModel { inner: KeywordModel::new() };

    match analyze(&model, "I am so happy today!") {
        Err(AnalysisError::Inference(msg)) => assert!(msg.contains("session exploded")),
        other => panic!("expected inference error, got {:?}", other),
    }

    let predictions = analyze(&model, "I am so happy today!").unwrap();
    assert_eq!(format(&predictions).top().unwrap().label, "joy");
}

#[tokio::test]
async fn test_shared_model_across_tasks() {
    let model: SharedModel = Arc::new(KeywordModel::new());
    let texts = ["happy happy", "so furious", "just a table", "   "];

    let mut handles = Vec::new();
    for text in texts {
        handles.push(tokio::spawn(analyze_shared(Arc::clone(&model), text.to_string())));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    let tops: Vec<_> = outcomes[..3]
        .iter()
        .map(|r| format(r.as_ref().unwrap()).top().unwrap().label.clone())
        .collect();
    assert_eq!(tops, vec!["joy", "anger", "neutral"]);
    assert_eq!(outcomes[3], Err(AnalysisError::EmptyInput));
}
