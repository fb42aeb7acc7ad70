//! Sliding-window construction of supervised training pairs.

use crate::error::{ForecastError, Result};

/// Ordered collection of (window, next value) pairs over a scaled series.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    lookback: usize,
    samples: Vec<(Vec<f64>, f64)>,
}

impl TrainingSet {
    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[(Vec<f64>, f64)] {
        &self.samples
    }
}

/// Slice `series` into every contiguous window of `lookback` values paired
/// with the value that follows it.
///
/// A series of length L yields exactly `L - lookback` samples, in series
/// order. A series with no complete (window, target) pair is an
/// [`ForecastError::InsufficientData`] error carrying the minimum length.
pub fn make_windows(series: &[f64], lookback: usize) -> Result<TrainingSet> {
    if lookback == 0 {
        return Err(ForecastError::Config(
            "lookback must be at least 1".to_string(),
        ));
    }
    if series.len() <= lookback {
        return Err(ForecastError::InsufficientData {
            needed: lookback + 1,
            actual: series.len(),
        });
    }

    let mut samples = Vec::with_capacity(series.len() - lookback);
    for i in lookback..series.len() {
        samples.push((series[i - lookback..i].to_vec(), series[i]));
    }

    Ok(TrainingSet { lookback, samples })
}
