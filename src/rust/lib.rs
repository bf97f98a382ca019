//! A single-page emotion detector: free text in, ranked per-emotion
//! confidences out, scored by a pretrained ONNX classifier.
//!
//! # Basic Usage
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emotion_detector::{analyze, format, shared_model, ModelSettings};
//!
//! let model = shared_model(&ModelSettings::default()).await?;
//! let predictions = analyze(model.as_ref(), "I am so happy today!")?;
//! for row in format(&predictions).table {
//!     println!("{} {:<10} {:.4}", row.glyph, row.label, row.confidence);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The model handle is loaded once per process and shared as an
//! `Arc<dyn EmotionModel>`; every request reads it without mutation.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emotion_detector::{analyze_shared, shared_model, ModelSettings};
//! use std::sync::Arc;
//!
//! let model = shared_model(&ModelSettings::default()).await?;
//! let mut handles = vec![];
//! for text in ["what a lovely day", "this is outrageous"] {
//!     handles.push(tokio::spawn(analyze_shared(Arc::clone(&model), text.to_string())));
//! }
//! for handle in handles {
//!     handle.await??;
//! }
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod analysis;
pub mod classifier;
pub mod format;
pub mod glyphs;
pub mod model_manager;
pub mod models;
pub mod prediction;
mod runtime;
pub mod web;

pub use accessor::{load_model, shared_model, LoadError, ModelAccessor, ModelSettings};
pub use analysis::{analyze, analyze_shared, AnalysisError};
pub use classifier::{ClassifierBuilder, ClassifierError, ClassifierInfo, EmotionClassifier, LabelSet, ScoreFunction};
pub use format::{format, ChartBar, FormattedResult, TableRow};
pub use glyphs::{glyph_for, FALLBACK_GLYPH};
pub use model_manager::{ModelError, ModelFile, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use prediction::{EmotionModel, EmotionPrediction, PredictionSet, SharedModel};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use web::{build_router, serve, AppState, WebConfig, WebError};

/// Initializes `env_logger`, defaulting to `info` unless `RUST_LOG` is set.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
