use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use std::fmt;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::ModelInfo;

/// Environment variable overriding the cache root
pub const CACHE_ENV_VAR: &str = "EMOTION_DETECTOR_CACHE";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download of {file} failed with HTTP status {status}")]
    HttpStatus {
        file: ModelFile,
        status: reqwest::StatusCode,
    },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file} file")]
    HashMismatch {
        file: ModelFile,
        expected: String,
        actual: String,
    },
}

/// The files a text-classification model needs on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFile {
    Model,
    Tokenizer,
    Config,
}

impl ModelFile {
    pub const ALL: [ModelFile; 3] = [ModelFile::Model, ModelFile::Tokenizer, ModelFile::Config];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Model => "model.onnx",
            Self::Tokenizer => "tokenizer.json",
            Self::Config => "config.json",
        }
    }

    fn url<'a>(&self, info: &'a ModelInfo) -> &'a str {
        match self {
            Self::Model => &info.model_url,
            Self::Tokenizer => &info.tokenizer_url,
            Self::Config => &info.config_url,
        }
    }

    fn expected_hash<'a>(&self, info: &'a ModelInfo) -> Option<&'a str> {
        match self {
            Self::Model => info.model_hash.as_deref(),
            Self::Tokenizer => info.tokenizer_hash.as_deref(),
            Self::Config => info.config_hash.as_deref(),
        }
    }
}

impl fmt::Display for ModelFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Tokenizer => write!(f, "tokenizer"),
            Self::Config => write!(f, "config"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        if let Ok(path) = env::var(CACHE_ENV_VAR) {
            return PathBuf::from(path).join("models");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("emotion-detector").join("models");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("emotion-detector").join("models");
        }

        env::temp_dir().join("emotion-detector").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Directory holding every file of the named model
    pub fn get_model_dir(&self, name: &str) -> PathBuf {
        self.models_dir.join(name)
    }

    pub fn get_file_path(&self, name: &str, file: ModelFile) -> PathBuf {
        self.get_model_dir(name).join(file.file_name())
    }

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.get_file_path(name, ModelFile::Model)
    }

    pub fn get_tokenizer_path(&self, name: &str) -> PathBuf {
        self.get_file_path(name, ModelFile::Tokenizer)
    }

    pub fn get_config_path(&self, name: &str) -> PathBuf {
        self.get_file_path(name, ModelFile::Config)
    }

    pub fn is_model_downloaded(&self, name: &str) -> bool {
        ModelFile::ALL.iter().all(|&file| {
            let path = self.get_file_path(name, file);
            let exists = path.exists();
            log::debug!("  {} path: {:?} (exists: {})", file, path, exists);
            exists
        })
    }

    pub async fn download_model(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.get_model_dir(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        for file in ModelFile::ALL {
            if let Err(e) = self.ensure_file(info, file).await {
                log::error!("Failed to set up {} file: {}", file, e);
                let _ = self.remove_download(&info.name);
                return Err(e);
            }
        }

        log::info!("Model '{}' ready to use", info.name);
        Ok(())
    }

    async fn ensure_file(&self, info: &ModelInfo, file: ModelFile) -> Result<(), ModelError> {
        let path = self.get_file_path(&info.name, file);
        if path.exists() {
            match file.expected_hash(info) {
                Some(expected) if !self.verify_file(&path, expected)? => {
                    log::warn!("{} file verification failed, redownloading", file);
                }
                _ => {
                    log::info!("Existing {} file at {:?} accepted", file, path);
                    return Ok(());
                }
            }
        } else {
            log::info!("{} file does not exist, downloading...", file);
        }
        self.download_and_verify_file(file.url(info), &path, file.expected_hash(info), file)
            .await
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("Verifying {:?}: calculated {} expected {}", path, hash, expected_hash);
        Ok(hash == expected_hash)
    }

    /// Returns true when every file exists and matches its digest, if one is known.
    pub fn verify_model(&self, info: &ModelInfo) -> Result<bool, ModelError> {
        if !self.is_model_downloaded(&info.name) {
            log::info!("Model '{}' is missing one or more files", info.name);
            return Ok(false);
        }

        for file in ModelFile::ALL {
            if let Some(expected) = file.expected_hash(info) {
                let path = self.get_file_path(&info.name, file);
                if !self.verify_file(&path, expected)? {
                    log::info!("{} hash verification failed for {:?}", file, path);
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file: ModelFile,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file, url, path);
        let response = reqwest::get(url).await?;
        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::NOT_FOUND {
                log::error!(
                    "{} is not published at {}; export the model to ONNX locally and pass --model-dir",
                    file, url
                );
            }
            return Err(ModelError::HttpStatus { file, status });
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = expected_hash {
            let hash = sha256_hex(&bytes);
            if hash != expected {
                log::error!("{} hash mismatch: expected {}, got {}", file, expected, hash);
                return Err(ModelError::HashMismatch {
                    file,
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        if let Some(expected) = expected_hash {
            if !self.verify_file(path, expected)? {
                return Err(ModelError::VerificationFailed);
            }
        }

        log::info!("{} file downloaded successfully", file);
        Ok(())
    }

    pub fn remove_download(&self, name: &str) -> Result<(), ModelError> {
        for file in ModelFile::ALL {
            let path = self.get_file_path(name, file);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, info: &ModelInfo) -> Result<(), ModelError> {
        log::info!("Checking if model '{}' is downloaded...", info.name);
        if !self.is_model_downloaded(&info.name) {
            log::info!("Model not found, downloading...");
            self.download_model(info).await?;
        } else if !self.verify_model(info)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(&info.name)?;
            self.download_model(info).await?;
        } else {
            log::info!("Model verification successful");
        }
        Ok(())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn scratch_manager(tag: &str) -> ModelManager {
        let dir = env::temp_dir()
            .join("emotion-detector-tests")
            .join(format!("{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        ModelManager::new(dir).unwrap()
    }

    fn write_all_files(manager: &ModelManager, name: &str) {
        fs::create_dir_all(manager.get_model_dir(name)).unwrap();
        for file in ModelFile::ALL {
            fs::write(manager.get_file_path(name, file), "hello").unwrap();
        }
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(sha256_hex(b"hello"), HELLO_SHA256);
    }

    #[test]
    fn test_download_state_and_removal() -> Result<(), ModelError> {
        let manager = scratch_manager("state");
        assert!(!manager.is_model_downloaded("tiny"));

        write_all_files(&manager, "tiny");
        assert!(manager.is_model_downloaded("tiny"));

        manager.remove_download("tiny")?;
        assert!(!manager.is_model_downloaded("tiny"));
        Ok(())
    }

    #[test]
    fn test_verify_model_with_digests() -> Result<(), ModelError> {
        let manager = scratch_manager("verify");
        let mut info = ModelInfo::from_hf_repo("tiny", "someone/tiny", "main");
        assert!(!manager.verify_model(&info)?);

        write_all_files(&manager, "tiny");
        assert!(manager.verify_model(&info)?);

        info.model_hash = Some(HELLO_SHA256.to_string());
        assert!(manager.verify_model(&info)?);

        fs::write(manager.get_model_path("tiny"), "corrupted data")?;
        assert!(!manager.verify_model(&info)?);
        Ok(())
    }

    #[test]
    fn test_default_models_dir() {
        env::set_var(CACHE_ENV_VAR, "/tmp/test-cache");
        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("/tmp/test-cache/models"));
        env::remove_var(CACHE_ENV_VAR);

        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("emotion-detector"));
    }
}
