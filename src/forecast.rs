//! Autoregressive multi-day forecasting
//!
//! The forecaster slides a lookback window over scaled history, asks the
//! model for one step ahead, converts that step back to price space, then
//! feeds the re-scaled prediction into the window for the next step.
//! Predicted dates skip weekends so day `i` lands on the i-th trading day
//! after the anchor.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::add_trading_days;
use crate::error::{ForecastError, Result};
use crate::models::price_model::PriceModel;
use crate::scaler::MinMaxScaler;
use crate::utils::root_mean_square;

/// One predicted closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Multi-step forecaster over a fitted scaler and a ready model
#[derive(Debug, Clone)]
pub struct Forecaster {
    lookback: usize,
}

impl Forecaster {
    pub fn new(lookback: usize) -> Self {
        Forecaster { lookback }
    }

    /// Predict `horizon` trading days past `anchor`.
    ///
    /// `scaled_history` is the full scaled close series; the window starts
    /// as its last `lookback` values. Each step inverse-transforms the
    /// model output to a price before re-scaling it into the window, so
    /// rounding in the scaler feeds forward exactly as it would in
    /// production.
    pub fn run(
        &self,
        model: &mut PriceModel,
        scaler: &MinMaxScaler,
        scaled_history: &[f64],
        horizon: u32,
        anchor: NaiveDate,
    ) -> Result<Vec<PredictionPoint>> {
        if scaled_history.len() < self.lookback {
            return Err(ForecastError::InsufficientHistory {
                needed: self.lookback,
                actual: scaled_history.len(),
            });
        }

        let mut window = scaled_history[scaled_history.len() - self.lookback..].to_vec();
        let mut predictions = Vec::with_capacity(horizon as usize);

        for step in 0..horizon {
            let scaled = model.predict_one(&window)?;
            let price = scaler.inverse_one(scaled)?;
            let date = add_trading_days(anchor, step + 1);
            predictions.push(PredictionPoint { date, price });

            window.remove(0);
            window.push(scaler.transform_one(price)?);
        }

        Ok(predictions)
    }

    /// Confidence in [0, 1] from one-step residuals over recent history.
    ///
    /// Replays up to `max_windows` of the latest windows through the model
    /// and compares each prediction against the actual next value, both in
    /// scaled space. Confidence is `1 / (1 + rms)`, so a perfect fit gives
    /// 1.0 and larger errors decay toward 0.
    pub fn confidence(
        &self,
        model: &mut PriceModel,
        scaled_history: &[f64],
        max_windows: usize,
    ) -> Result<f64> {
        let n = scaled_history.len();
        if n <= self.lookback {
            return Err(ForecastError::InsufficientHistory {
                needed: self.lookback + 1,
                actual: n,
            });
        }

        let count = (n - self.lookback).min(max_windows.max(1));
        let mut residuals = Vec::with_capacity(count);

        for target_index in (n - count)..n {
            let window = &scaled_history[target_index - self.lookback..target_index];
            let predicted = model.predict_one(window)?;
            residuals.push(predicted - scaled_history[target_index]);
        }

        let rms = root_mean_square(&residuals);
        Ok((1.0 / (1.0 + rms)).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::persistence::ArtifactStore;
    use crate::window::make_windows;
    use chrono::{Datelike, Weekday};
    use tempfile::tempdir;

    fn trained_model(dir: &std::path::Path) -> PriceModel {
        let config = ModelConfig {
            lookback: 5,
            hidden_size: 4,
            num_layers: 1,
            dense_size: 3,
            dropout: 0.0,
            epochs: 3,
            batch_size: 8,
            learning_rate: 0.01,
            clip_gradient: Some(5.0),
        };
        let store = ArtifactStore::open(dir).unwrap();
        let mut model = PriceModel::new(config, store);

        let series: Vec<f64> = (0..40).map(|i| 0.2 + 0.6 * (i as f64) / 40.0).collect();
        let set = make_windows(&series, 5).unwrap();
        model.train(&set, "TEST").unwrap();
        model
    }

    fn fitted_scaler() -> (MinMaxScaler, Vec<f64>) {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&prices).unwrap();
        (scaler, scaled)
    }

    #[test]
    fn test_run_produces_horizon_points_on_trading_days() {
        let dir = tempdir().unwrap();
        let mut model = trained_model(dir.path());
        let (scaler, scaled) = fitted_scaler();

        let anchor = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let forecaster = Forecaster::new(5);
        let points = forecaster.run(&mut model, &scaler, &scaled, 4, anchor).unwrap();

        assert_eq!(points.len(), 4);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        for pair in points.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
        for point in &points {
            assert!(point.price.is_finite());
            assert_ne!(point.date.weekday(), Weekday::Sat);
            assert_ne!(point.date.weekday(), Weekday::Sun);
        }
    }

    #[test]
    fn test_run_rejects_short_history() {
        let dir = tempdir().unwrap();
        let mut model = trained_model(dir.path());
        let (scaler, _) = fitted_scaler();

        let anchor = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let err = Forecaster::new(5)
            .run(&mut model, &scaler, &[0.1, 0.2], 3, anchor)
            .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientHistory {
                needed: 5,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_confidence_is_in_unit_interval() {
        let dir = tempdir().unwrap();
        let mut model = trained_model(dir.path());
        let (_, scaled) = fitted_scaler();

        let confidence = Forecaster::new(5)
            .confidence(&mut model, &scaled, 20)
            .unwrap();
        assert!((0.0..=1.0).contains(&confidence));
    }

    #[test]
    fn test_confidence_needs_one_target_past_lookback() {
        let dir = tempdir().unwrap();
        let mut model = trained_model(dir.path());

        let err = Forecaster::new(5)
            .confidence(&mut model, &[0.1; 5], 20)
            .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientHistory {
                needed: 6,
                actual: 5
            }
        ));
    }
}
