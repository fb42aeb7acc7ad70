use chrono::Utc;
use tracing::{info, warn};

use crate::config::ModelConfig;
use crate::error::{ForecastError, Result};
use crate::models::regressor::SequenceRegressor;
use crate::persistence::{ArtifactStore, ModelMetadata, SavedModel};
use crate::training::{create_adam_trainer, TrainingConfig, TrainingMetrics};
use crate::window::TrainingSet;

/// Summary of a completed training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub epochs: usize,
    pub final_loss: f64,
    pub history: Vec<TrainingMetrics>,
}

/// A per-ticker forecasting model
///
/// Owns the network for one ticker and the store it persists to. The model
/// starts empty; callers either [`load`](PriceModel::load) a stored artifact
/// or [`train`](PriceModel::train) a fresh network before predicting.
pub struct PriceModel {
    config: ModelConfig,
    store: ArtifactStore,
    network: Option<SequenceRegressor>,
}

impl PriceModel {
    pub fn new(config: ModelConfig, store: ArtifactStore) -> Self {
        PriceModel {
            config,
            store,
            network: None,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Whether a network is in memory and ready to predict.
    pub fn is_ready(&self) -> bool {
        self.network.is_some()
    }

    /// Train a fresh network on `set` and persist it under `key`.
    ///
    /// Any previously held network is replaced. The training set's window
    /// length must match the configured lookback.
    pub fn train(&mut self, set: &TrainingSet, key: &str) -> Result<TrainingReport> {
        if set.lookback() != self.config.lookback {
            return Err(ForecastError::WindowLength {
                expected: self.config.lookback,
                actual: set.lookback(),
            });
        }

        let mut network = SequenceRegressor::new(
            1,
            self.config.hidden_size,
            self.config.num_layers,
            self.config.dense_size,
            self.config.dropout,
        );

        let mut trainer = create_adam_trainer(self.config.learning_rate).with_config(TrainingConfig {
            epochs: self.config.epochs,
            batch_size: self.config.batch_size,
            shuffle: true,
            clip_gradient: self.config.clip_gradient,
            log_every: 5,
        });

        let final_loss = trainer.train(&mut network, set)?;
        info!(key, final_loss, epochs = self.config.epochs, "training complete");

        let metadata = ModelMetadata {
            key: key.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now().to_rfc3339(),
            lookback: self.config.lookback,
            hidden_size: self.config.hidden_size,
            num_layers: self.config.num_layers,
            dense_size: self.config.dense_size,
            total_epochs: self.config.epochs,
            final_loss: Some(final_loss),
            description: None,
        };

        let saved = SavedModel { network, metadata };
        self.store.save(key, &saved)?;
        self.network = Some(saved.network);

        Ok(TrainingReport {
            epochs: self.config.epochs,
            final_loss,
            history: trainer.metrics_history().to_vec(),
        })
    }

    /// Try to load a stored artifact for `key`.
    ///
    /// Returns `Ok(false)` when nothing usable is stored: either no file
    /// exists, or the stored geometry no longer matches the configuration,
    /// in which case the artifact is treated as a miss rather than an error.
    pub fn load(&mut self, key: &str) -> Result<bool> {
        let saved = match self.store.load(key)? {
            Some(saved) => saved,
            None => return Ok(false),
        };

        let meta = &saved.metadata;
        if meta.lookback != self.config.lookback
            || meta.hidden_size != self.config.hidden_size
            || meta.num_layers != self.config.num_layers
            || meta.dense_size != self.config.dense_size
        {
            warn!(
                key,
                stored_lookback = meta.lookback,
                configured_lookback = self.config.lookback,
                "stored model geometry does not match configuration, retraining"
            );
            return Ok(false);
        }

        let mut network = saved.network;
        network.eval();
        self.network = Some(network);
        Ok(true)
    }

    /// Predict the next scaled value from one window of scaled history.
    pub fn predict_one(&mut self, window: &[f64]) -> Result<f64> {
        if window.len() != self.config.lookback {
            return Err(ForecastError::WindowLength {
                expected: self.config.lookback,
                actual: window.len(),
            });
        }
        let network = self.network.as_mut().ok_or(ForecastError::ModelNotReady)?;
        network.eval();
        Ok(network.forward_window(window))
    }
}
