//! Min-max normalization of closing prices into the unit interval.

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Parameters captured by a fit, round-trippable for persistence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    pub min: f64,
    pub max: f64,
}

/// Stateful min-max scaler mapping observed values into [0, 1].
///
/// A constant series would divide by zero, so that case degrades to a
/// constant mapping instead: `transform` yields 0.5 for every input and
/// `inverse_transform` yields the observed value. Using the scaler before
/// fitting is a sequencing bug and reports [`ForecastError::ScalerNotFitted`].
#[derive(Debug, Clone, Default)]
pub struct MinMaxScaler {
    state: Option<ScalerState>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        MinMaxScaler { state: None }
    }

    /// Rebuild a scaler from previously captured parameters.
    pub fn from_state(state: ScalerState) -> Self {
        MinMaxScaler { state: Some(state) }
    }

    pub fn state(&self) -> Option<&ScalerState> {
        self.state.as_ref()
    }

    /// Record min/max over `values` and return the scaled series.
    pub fn fit_transform(&mut self, values: &[f64]) -> Result<Vec<f64>> {
        if values.is_empty() {
            return Err(ForecastError::InsufficientData {
                needed: 1,
                actual: 0,
            });
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &value in values {
            if !value.is_finite() {
                return Err(ForecastError::InvalidData {
                    reason: "non-finite value in price series".to_string(),
                });
            }
            min = min.min(value);
            max = max.max(value);
        }

        self.state = Some(ScalerState { min, max });
        self.transform(values)
    }

    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        values.iter().map(|&v| self.transform_one(v)).collect()
    }

    pub fn transform_one(&self, value: f64) -> Result<f64> {
        let state = self.state.as_ref().ok_or(ForecastError::ScalerNotFitted)?;
        if state.max == state.min {
            return Ok(0.5);
        }
        Ok((value - state.min) / (state.max - state.min))
    }

    pub fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        values.iter().map(|&v| self.inverse_one(v)).collect()
    }

    pub fn inverse_one(&self, value: f64) -> Result<f64> {
        let state = self.state.as_ref().ok_or(ForecastError::ScalerNotFitted)?;
        if state.max == state.min {
            return Ok(state.min);
        }
        Ok(value * (state.max - state.min) + state.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_transform_maps_extremes_to_unit_interval() {
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&[10.0, 15.0, 20.0]).unwrap();

        assert!((scaled[0] - 0.0).abs() < 1e-12);
        assert!((scaled[1] - 0.5).abs() < 1e-12);
        assert!((scaled[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_recovers_original_values() {
        let values = vec![103.2, 98.7, 110.4, 99.9, 104.1];
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&values).unwrap();
        let recovered = scaler.inverse_transform(&scaled).unwrap();

        for (original, back) in values.iter().zip(recovered.iter()) {
            assert!((original - back).abs() < 1e-9);
        }
    }

    #[test]
    fn test_flat_series_fallback() {
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&[42.0, 42.0, 42.0]).unwrap();

        assert!(scaled.iter().all(|&v| (v - 0.5).abs() < 1e-12));
        let back = scaler.inverse_transform(&scaled).unwrap();
        assert!(back.iter().all(|&v| (v - 42.0).abs() < 1e-12));
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let scaler = MinMaxScaler::new();
        assert!(matches!(
            scaler.transform(&[1.0]),
            Err(ForecastError::ScalerNotFitted)
        ));
        assert!(matches!(
            scaler.inverse_one(0.5),
            Err(ForecastError::ScalerNotFitted)
        ));
    }

    #[test]
    fn test_fit_rejects_empty_and_non_finite_input() {
        let mut scaler = MinMaxScaler::new();
        assert!(matches!(
            scaler.fit_transform(&[]),
            Err(ForecastError::InsufficientData { .. })
        ));
        assert!(matches!(
            scaler.fit_transform(&[1.0, f64::NAN]),
            Err(ForecastError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_state_round_trip() {
        let mut scaler = MinMaxScaler::new();
        scaler.fit_transform(&[10.0, 20.0]).unwrap();
        let state = *scaler.state().unwrap();

        let rebuilt = MinMaxScaler::from_state(state);
        assert!((rebuilt.transform_one(15.0).unwrap() - 0.5).abs() < 1e-12);
    }
}
