//! Forecast orchestration
//!
//! [`PredictionService`] wires the pieces together: it validates a request,
//! pulls history from the provider, fits a fresh scaler, trains or loads the
//! per-ticker model, then runs the autoregressive forecast and scores its
//! confidence. Models are cached in memory per ticker behind a mutex so
//! concurrent requests for the same symbol serialize on one network while
//! different symbols proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ServiceConfig;
use crate::data::{ticker_catalog, PricePoint, TickerInfo};
use crate::error::{ForecastError, Result};
use crate::forecast::{Forecaster, PredictionPoint};
use crate::models::price_model::PriceModel;
use crate::persistence::ArtifactStore;
use crate::provider::MarketDataProvider;
use crate::scaler::MinMaxScaler;
use crate::window::make_windows;

/// Windows of recent history replayed when scoring confidence
const CONFIDENCE_WINDOWS: usize = 20;

/// A forecast request as received from the outside
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub prediction_days: u32,
}

impl ForecastRequest {
    /// Validate the request against service limits.
    pub fn validate(&self, max_prediction_days: u32) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(ForecastError::MissingParameter { name: "ticker" });
        }
        if self.start_date > self.end_date {
            return Err(ForecastError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.prediction_days < 1 || self.prediction_days > max_prediction_days {
            return Err(ForecastError::OutOfRange {
                field: "prediction_days",
                min: 1,
                max: max_prediction_days as i64,
                actual: self.prediction_days as i64,
            });
        }
        Ok(())
    }
}

/// The full forecast payload returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub ticker: String,
    pub historical: Vec<PricePoint>,
    pub predictions: Vec<PredictionPoint>,
    pub current_price: f64,
    pub predicted_price: f64,
    pub change: f64,
    pub confidence: f64,
}

/// Orchestrates data fetching, training, and forecasting per ticker
pub struct PredictionService<P: MarketDataProvider> {
    provider: P,
    config: ServiceConfig,
    store: ArtifactStore,
    models: RwLock<HashMap<String, Arc<Mutex<PriceModel>>>>,
}

impl<P: MarketDataProvider> PredictionService<P> {
    pub fn new(provider: P, config: ServiceConfig) -> Result<Self> {
        let store = ArtifactStore::open(config.artifact_dir.clone())?;
        Ok(PredictionService {
            provider,
            config,
            store,
            models: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The tickers this service advertises.
    pub fn tickers(&self) -> Vec<TickerInfo> {
        ticker_catalog()
    }

    /// Produce a forecast for one request.
    ///
    /// History is fetched for the requested range and scaled fresh each
    /// call. The per-ticker model is reused when already in memory, loaded
    /// from the artifact store when stored, and trained from scratch
    /// otherwise. Predictions start on the first trading day after today.
    pub fn forecast(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        request.validate(self.config.max_prediction_days)?;
        let ticker = request.ticker.trim().to_uppercase();

        info!(
            ticker = %ticker,
            start = %request.start_date,
            end = %request.end_date,
            days = request.prediction_days,
            "forecast requested"
        );

        let series = self
            .provider
            .fetch(&ticker, request.start_date, request.end_date)?;
        if series.is_empty() {
            return Err(ForecastError::NotFound { ticker });
        }

        let closes = series.closes();
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&closes)?;

        let slot = self.model_slot(&ticker);
        let mut model = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if !model.is_ready() && !model.load(&ticker)? {
            let set = make_windows(&scaled, self.config.lookback)?;
            let report = model.train(&set, &ticker)?;
            info!(
                ticker = %ticker,
                final_loss = report.final_loss,
                samples = set.len(),
                "trained fresh model"
            );
        }

        let anchor = Utc::now().date_naive();
        let forecaster = Forecaster::new(self.config.lookback);
        let predictions =
            forecaster.run(&mut model, &scaler, &scaled, request.prediction_days, anchor)?;
        let confidence = forecaster.confidence(&mut model, &scaled, CONFIDENCE_WINDOWS)?;

        let current_price = series
            .last()
            .map(|point| point.close)
            .ok_or_else(|| ForecastError::Internal("empty series after fetch".to_string()))?;
        let predicted_price = match predictions.last() {
            Some(point) => point.price,
            None => {
                return Err(ForecastError::Internal(
                    "forecaster returned no predictions".to_string(),
                ))
            }
        };

        Ok(ForecastResponse {
            ticker,
            historical: series.points().to_vec(),
            predictions,
            current_price,
            predicted_price,
            change: predicted_price - current_price,
            confidence,
        })
    }

    /// Drop the cached model and stored artifact for a ticker.
    ///
    /// Returns whether a stored artifact was deleted. The next forecast for
    /// the ticker retrains from scratch.
    pub fn invalidate(&self, ticker: &str) -> Result<bool> {
        let ticker = ticker.trim().to_uppercase();
        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&ticker);
        self.store.invalidate(&ticker)
    }

    fn model_slot(&self, ticker: &str) -> Arc<Mutex<PriceModel>> {
        {
            let models = self.models.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = models.get(ticker) {
                return Arc::clone(slot);
            }
        }

        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        let slot = models.entry(ticker.to_string()).or_insert_with(|| {
            Arc::new(Mutex::new(PriceModel::new(
                self.config.model_config(),
                self.store.clone(),
            )))
        });
        Arc::clone(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(days: u32) -> ForecastRequest {
        ForecastRequest {
            ticker: "AAPL".to_string(),
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            prediction_days: days,
        }
    }

    #[test]
    fn test_validate_accepts_bounds() {
        assert!(request(1).validate(30).is_ok());
        assert!(request(30).validate(30).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_bounds_days() {
        let err = request(0).validate(30).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::OutOfRange {
                field: "prediction_days",
                actual: 0,
                ..
            }
        ));

        let err = request(31).validate(30).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_validate_rejects_blank_ticker() {
        let mut req = request(5);
        req.ticker = "   ".to_string();
        let err = req.validate(30).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::MissingParameter { name: "ticker" }
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut req = request(5);
        req.start_date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        req.end_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = req.validate(30).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidDateRange { .. }));
    }
}
