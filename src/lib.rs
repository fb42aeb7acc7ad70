//! # Stockcast
//!
//! A stock closing-price forecasting library built on a from-scratch LSTM,
//! with min-max scaling, sliding-window training sets, autoregressive
//! multi-day forecasts, and per-ticker model persistence.
//!
//! ## Core Components
//!
//! - **Scaler**: Min-max normalization with exact inverse transforms
//! - **Windower**: Sliding lookback windows over a close series
//! - **Sequence Model**: Stacked LSTM with dropout and a dense head, trained
//!   end-to-end with BPTT, gradient clipping, and Adam
//! - **Forecaster**: Autoregressive multi-step prediction on trading days,
//!   with a residual-based confidence score
//! - **Service**: Per-ticker orchestration over pluggable market data
//!   providers, with artifact caching on disk
//!
//! ## Quick Start
//!
//! ```rust
//! use stockcast::{PredictionService, ServiceConfig, SyntheticProvider};
//!
//! let mut config = ServiceConfig::default();
//! config.artifact_dir = std::env::temp_dir().join("stockcast-models");
//!
//! let service = PredictionService::new(SyntheticProvider::new(), config).unwrap();
//!
//! // Forecast five trading days for a catalog ticker
//! // let response = service.forecast(&request).unwrap();
//! ```

/// Main library module.
pub mod calendar;
pub mod config;
pub mod data;
pub mod error;
pub mod forecast;
pub mod layers;
pub mod loss;
pub mod models;
pub mod optimizers;
pub mod persistence;
pub mod provider;
pub mod scaler;
pub mod service;
pub mod training;
pub mod utils;
pub mod window;

// Re-export commonly used items
pub use config::{ModelConfig, ServiceConfig};
pub use data::{ticker_catalog, PricePoint, PriceSeries, TickerInfo};
pub use error::{ForecastError, Result};
pub use forecast::{Forecaster, PredictionPoint};
pub use models::price_model::{PriceModel, TrainingReport};
pub use models::regressor::SequenceRegressor;
pub use persistence::{ArtifactStore, ModelMetadata, SavedModel};
pub use provider::{CsvProvider, MarketDataProvider, SyntheticProvider};
pub use scaler::{MinMaxScaler, ScalerState};
pub use service::{ForecastRequest, ForecastResponse, PredictionService};
pub use training::{create_adam_trainer, Trainer, TrainingConfig};
pub use window::{make_windows, TrainingSet};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_integration() {
        let mut network = SequenceRegressor::new(1, 4, 2, 3, 0.2);
        network.eval();

        let window = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let output = network.forward_window(&window);

        assert!(output.is_finite());
        assert_eq!(network.forward_window(&window), output);
    }
}
