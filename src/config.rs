//! Service and model configuration.
//!
//! Defaults mirror the production pipeline: a 60-day lookback feeding a
//! 2-layer LSTM (50 hidden units, 0.2 dropout) with a 25-unit dense stage,
//! trained for 25 epochs with Adam at 0.001. Every knob can be overridden
//! through a `STOCKCAST_*` environment variable.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ForecastError, Result};

/// Full configuration for [`crate::service::PredictionService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub lookback: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub dense_size: usize,
    pub dropout: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub clip_gradient: Option<f64>,
    pub artifact_dir: PathBuf,
    pub max_prediction_days: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            lookback: 60,
            hidden_size: 50,
            num_layers: 2,
            dense_size: 25,
            dropout: 0.2,
            epochs: 25,
            batch_size: 32,
            learning_rate: 0.001,
            clip_gradient: Some(5.0),
            artifact_dir: PathBuf::from("models"),
            max_prediction_days: 30,
        }
    }
}

impl ServiceConfig {
    /// Build a configuration from the environment, falling back to defaults
    /// for unset variables. An unparsable value is a hard error.
    pub fn from_env() -> Result<Self> {
        let defaults = ServiceConfig::default();

        Ok(ServiceConfig {
            lookback: env_parse("STOCKCAST_LOOKBACK", defaults.lookback)?,
            hidden_size: env_parse("STOCKCAST_HIDDEN_SIZE", defaults.hidden_size)?,
            num_layers: env_parse("STOCKCAST_NUM_LAYERS", defaults.num_layers)?,
            dense_size: env_parse("STOCKCAST_DENSE_SIZE", defaults.dense_size)?,
            dropout: env_parse("STOCKCAST_DROPOUT", defaults.dropout)?,
            epochs: env_parse("STOCKCAST_EPOCHS", defaults.epochs)?,
            batch_size: env_parse("STOCKCAST_BATCH_SIZE", defaults.batch_size)?,
            learning_rate: env_parse("STOCKCAST_LEARNING_RATE", defaults.learning_rate)?,
            clip_gradient: defaults.clip_gradient,
            artifact_dir: env::var("STOCKCAST_ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
            max_prediction_days: env_parse(
                "STOCKCAST_MAX_PREDICTION_DAYS",
                defaults.max_prediction_days,
            )?,
        })
    }

    /// The geometry and training subset handed to [`crate::models::price_model::PriceModel`].
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            lookback: self.lookback,
            hidden_size: self.hidden_size,
            num_layers: self.num_layers,
            dense_size: self.dense_size,
            dropout: self.dropout,
            epochs: self.epochs,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            clip_gradient: self.clip_gradient,
        }
    }
}

/// Network geometry and training hyperparameters.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub lookback: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub dense_size: usize,
    pub dropout: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub clip_gradient: Option<f64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ServiceConfig::default().model_config()
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| ForecastError::Config(format!("invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
