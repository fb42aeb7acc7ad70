//! Model persistence for trained regressors
//!
//! Trained networks are written to disk together with the geometry and
//! training metadata needed to decide whether a stored artifact is still
//! usable. Files ending in `.json` are written as pretty-printed JSON for
//! inspection; everything else uses compact bincode.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::models::regressor::SequenceRegressor;

/// Metadata stored alongside a trained network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub key: String,
    pub version: String,
    pub created_at: String,
    pub lookback: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub dense_size: usize,
    pub total_epochs: usize,
    pub final_loss: Option<f64>,
    pub description: Option<String>,
}

/// A trained network plus its metadata, as serialized to disk
#[derive(Serialize, Deserialize)]
pub struct SavedModel {
    pub network: SequenceRegressor,
    pub metadata: ModelMetadata,
}

/// Write a model to `path`, choosing the format from the extension.
pub fn save_model_file<P: AsRef<Path>>(model: &SavedModel, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::to_vec_pretty(model)?,
        _ => bincode::serialize(model)?,
    };
    fs::write(path, bytes)?;
    debug!(path = %path.display(), "saved model artifact");
    Ok(())
}

/// Read a model from `path`, choosing the format from the extension.
pub fn load_model_file<P: AsRef<Path>>(path: P) -> Result<SavedModel> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let model = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_slice(&bytes)?,
        _ => bincode::deserialize(&bytes)?,
    };
    Ok(model)
}

/// Directory-backed store of model artifacts keyed by ticker
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(ArtifactStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for a key. Non-alphanumeric characters are replaced so a
    /// key can never escape the store directory.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{}.bin", sanitized))
    }

    pub fn save(&self, key: &str, model: &SavedModel) -> Result<()> {
        save_model_file(model, self.path_for(key))
    }

    /// Load the artifact for `key`, or `None` if nothing is stored.
    pub fn load(&self, key: &str) -> Result<Option<SavedModel>> {
        match load_model_file(self.path_for(key)) {
            Ok(model) => Ok(Some(model)),
            Err(ForecastError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Remove the artifact for `key`. Returns whether a file was deleted.
    pub fn invalidate(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(ForecastError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_model() -> SavedModel {
        SavedModel {
            network: SequenceRegressor::new(1, 4, 2, 3, 0.2),
            metadata: ModelMetadata {
                key: "TEST".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: "2024-01-01T00:00:00Z".to_string(),
                lookback: 10,
                hidden_size: 4,
                num_layers: 2,
                dense_size: 3,
                total_epochs: 5,
                final_loss: Some(0.01),
                description: None,
            },
        }
    }

    #[test]
    fn test_store_round_trip_preserves_predictions() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let mut model = sample_model();
        model.network.eval();

        let window = vec![0.1; 10];
        let before = model.network.forward_window(&window);

        store.save("TEST", &model).unwrap();
        let mut loaded = store.load("TEST").unwrap().unwrap();
        loaded.network.eval();

        let after = loaded.network.forward_window(&window);
        assert!((before - after).abs() < 1e-12);
        assert_eq!(loaded.metadata.lookback, 10);
    }

    #[test]
    fn test_json_extension_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut model = sample_model();
        model.network.eval();

        let window = vec![0.2; 10];
        let before = model.network.forward_window(&window);

        save_model_file(&model, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with('{'));

        let mut loaded = load_model_file(&path).unwrap();
        loaded.network.eval();
        assert!((before - loaded.network.forward_window(&window)).abs() < 1e-12);
    }

    #[test]
    fn test_missing_key_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        assert!(store.load("ABSENT").unwrap().is_none());
    }

    #[test]
    fn test_invalidate_reports_whether_file_existed() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        store.save("GONE", &sample_model()).unwrap();

        assert!(store.invalidate("GONE").unwrap());
        assert!(!store.invalidate("GONE").unwrap());
        assert!(store.load("GONE").unwrap().is_none());
    }

    #[test]
    fn test_keys_do_not_collide() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();

        let mut apple = sample_model();
        apple.metadata.key = "AAPL".to_string();
        let mut microsoft = sample_model();
        microsoft.metadata.key = "MSFT".to_string();

        store.save("AAPL", &apple).unwrap();
        store.save("MSFT", &microsoft).unwrap();

        assert_eq!(store.load("AAPL").unwrap().unwrap().metadata.key, "AAPL");
        assert_eq!(store.load("MSFT").unwrap().unwrap().metadata.key, "MSFT");
    }

    #[test]
    fn test_path_sanitizes_hostile_keys() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let path = store.path_for("../../etc/passwd");
        assert!(path.starts_with(dir.path()));
        assert!(!path.to_string_lossy().contains(".."));
    }
}
