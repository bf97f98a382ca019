//! One-time model loading.
//!
//! The model handle is expensive to build, so it is created once per process
//! and handed out as a shared read-only [`SharedModel`] afterwards.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use lazy_static::lazy_static;
use tokio::sync::OnceCell;

use crate::classifier::{ClassifierError, EmotionClassifier};
use crate::model_manager::{ModelError, ModelManager};
use crate::models::BuiltinModel;
use crate::prediction::SharedModel;
use crate::runtime::RuntimeConfig;

/// Loading the model failed; the page cannot be served without it.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch model files: {0}")]
    Download(#[from] ModelError),
    #[error("failed to build classifier: {0}")]
    Build(#[from] ClassifierError),
    #[error("failed to open model cache: {0}")]
    Io(#[from] io::Error),
    #[error("model loading task failed: {0}")]
    Task(String),
}

/// Where the model comes from and how it runs.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: BuiltinModel,
    /// Use this directory instead of downloading `model`
    pub model_dir: Option<PathBuf>,
    /// Cache root for downloads, defaults to [`ModelManager::get_default_models_dir`]
    pub cache_dir: Option<PathBuf>,
    pub max_sequence_length: Option<usize>,
    /// Remove cached files before downloading
    pub fresh: bool,
    pub runtime: RuntimeConfig,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: BuiltinModel::EmotionDistilRoberta,
            model_dir: None,
            cache_dir: None,
            max_sequence_length: None,
            fresh: false,
            runtime: RuntimeConfig::default(),
        }
    }
}

/// A lazily initialized model handle.
///
/// Concurrent first callers of [`get_or_load`](Self::get_or_load) are
/// serialized: exactly one loader runs, and every caller receives the same
/// `Arc`. A failed load leaves the accessor empty.
#[derive(Default)]
pub struct ModelAccessor {
    cell: OnceCell<SharedModel>,
}

impl ModelAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already built model.
    pub fn with_model(model: SharedModel) -> Self {
        Self {
            cell: OnceCell::new_with(Some(model)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// The cached handle, if a load has completed
    pub fn get(&self) -> Option<SharedModel> {
        self.cell.get().map(Arc::clone)
    }

    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<SharedModel, LoadError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SharedModel, LoadError>>,
    {
        self.cell.get_or_try_init(load).await.map(Arc::clone)
    }
}

lazy_static! {
    static ref SHARED: ModelAccessor = ModelAccessor::new();
}

/// Returns the process-wide model, loading it on first use.
///
/// Only the first call's `settings` are used.
pub async fn shared_model(settings: &ModelSettings) -> Result<SharedModel, LoadError> {
    SHARED.get_or_load(|| load_model(settings)).await
}

/// Downloads (if needed) and builds the ONNX emotion classifier.
pub async fn load_model(settings: &ModelSettings) -> Result<SharedModel, LoadError> {
    let (dir, max_sequence_length) = match &settings.model_dir {
        Some(dir) => {
            log::info!("Loading model from {:?}", dir);
            (dir.clone(), settings.max_sequence_length)
        }
        None => {
            let manager = match &settings.cache_dir {
                Some(cache) => ModelManager::new(cache)?,
                None => ModelManager::new_default()?,
            };
            let info = settings.model.get_model_info();
            if settings.fresh {
                log::info!("Fresh download requested - removing any existing model files...");
                manager.remove_download(&info.name)?;
            }
            manager.ensure_model_downloaded(&info).await?;
            let max = settings.max_sequence_length
                .unwrap_or(settings.model.characteristics().max_sequence_length);
            (manager.get_model_dir(&info.name), Some(max))
        }
    };

    let runtime = settings.runtime.clone();
    let classifier = tokio::task::spawn_blocking(move || {
        EmotionClassifier::builder()
            .with_runtime_config(runtime)
            .with_model_dir(dir, max_sequence_length)?
            .build()
    })
    .await
    .map_err(|e| LoadError::Task(e.to_string()))??;

    let info = classifier.info();
    log::info!(
        "Model ready: {} labels ({}), max {} tokens",
        info.num_classes,
        info.score_function,
        info.max_sequence_length
    );
    Ok(Arc::new(classifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::{EmotionModel, EmotionPrediction, PredictionSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed(Vec<String>);

    impl EmotionModel for Fixed {
        fn labels(&self) -> &[String] {
            &self.0
        }

        fn classify(&self, _text: &str) -> Result<PredictionSet, ClassifierError> {
            Ok(self.0.iter().map(|l| EmotionPrediction::new(l.clone(), 0.5)).collect())
        }
    }

    fn fixed() -> SharedModel {
        Arc::new(Fixed(vec!["joy".into()]))
    }

    #[tokio::test]
    async fn test_loads_once() {
        let accessor = ModelAccessor::new();
        let counter = AtomicUsize::new(0);
        let loads = &counter;
        let load = move || async move {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(fixed())
        };

        let first = accessor.get_or_load(load).await.unwrap();
        let second = accessor.get_or_load(load).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_access() {
        let accessor = Arc::new(ModelAccessor::new());
        let loads = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let accessor = Arc::clone(&accessor);
            let loads = Arc::clone(&loads);
            handles.push(tokio::spawn(async move {
                accessor
                    .get_or_load(|| async move {
                        loads.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok(fixed())
                    })
                    .await
                    .unwrap()
            }));
        }

        let mut models = Vec::new();
        for handle in handles {
            models.push(handle.await.unwrap());
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(models.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_failed_load_is_reported() {
        let accessor = ModelAccessor::new();
        let result = accessor
            .get_or_load(|| async {
                Err(LoadError::Build(ClassifierError::BuildError("corrupt cache".into())))
            })
            .await;
        assert!(matches!(result, Err(LoadError::Build(_))));
        assert!(!accessor.is_loaded());
        assert!(accessor.get().is_none());
    }

    #[test]
    fn test_with_model_is_preloaded() {
        let accessor = ModelAccessor::with_model(fixed());
        assert!(accessor.is_loaded());
        let model = tokio_test::block_on(accessor.get_or_load(|| async {
            Err(LoadError::Task("must not run".into()))
        }))
        .unwrap();
        assert_eq!(model.labels().to_vec(), vec!["joy".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_model_dir_fails() {
        let settings = ModelSettings {
            model_dir: Some(std::env::temp_dir().join("emotion-detector-no-such-model")),
            ..ModelSettings::default()
        };
        let result = load_model(&settings).await;
        assert!(matches!(result, Err(LoadError::Build(ClassifierError::BuildError(_)))));
    }
}
