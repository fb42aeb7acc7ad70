use std::time::Instant;

use ndarray::Array2;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::loss::{LossFunction, MSELoss};
use crate::models::regressor::{RegressorGradients, SequenceRegressor};
use crate::optimizers::{Adam, Optimizer};
use crate::window::TrainingSet;

/// Configuration for training hyperparameters
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub shuffle: bool,
    pub clip_gradient: Option<f64>,
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 25,
            batch_size: 32,
            shuffle: true,
            clip_gradient: Some(5.0),
            log_every: 5,
        }
    }
}

/// Training metrics tracked per epoch
#[derive(Debug, Clone)]
pub struct TrainingMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub time_elapsed: f64,
}

/// Mini-batch trainer for [`SequenceRegressor`] with configurable loss and optimizer
///
/// Each epoch visits every (window, target) sample once, in shuffled order
/// when configured, accumulating per-sample BPTT gradients over a
/// mini-batch, averaging, clipping, and applying one optimizer step per
/// batch.
pub struct Trainer<L: LossFunction, O: Optimizer> {
    pub loss_function: L,
    pub optimizer: O,
    pub config: TrainingConfig,
    metrics_history: Vec<TrainingMetrics>,
}

impl<L: LossFunction, O: Optimizer> Trainer<L, O> {
    pub fn new(loss_function: L, optimizer: O) -> Self {
        Trainer {
            loss_function,
            optimizer,
            config: TrainingConfig::default(),
            metrics_history: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    /// Train the network on the whole set, returning the final epoch's mean loss.
    ///
    /// Leaves the network in evaluation mode. A non-finite epoch loss aborts
    /// with [`ForecastError::Training`]; divergence is not retried.
    pub fn train(&mut self, network: &mut SequenceRegressor, set: &TrainingSet) -> Result<f64> {
        if set.is_empty() {
            return Err(ForecastError::InsufficientData {
                needed: 1,
                actual: 0,
            });
        }

        let batch_size = self.config.batch_size.max(1);
        let log_every = self.config.log_every.max(1);
        let mut indices: Vec<usize> = (0..set.len()).collect();
        let mut final_loss = f64::INFINITY;

        network.train();

        for epoch in 0..self.config.epochs {
            let start_time = Instant::now();

            if self.config.shuffle {
                indices.shuffle(&mut rand::thread_rng());
            }

            let mut epoch_loss = 0.0;
            for batch in indices.chunks(batch_size) {
                epoch_loss += self.train_batch(network, set, batch)?;
            }
            epoch_loss /= set.len() as f64;

            if !epoch_loss.is_finite() {
                return Err(ForecastError::Training(format!(
                    "non-finite loss at epoch {}",
                    epoch
                )));
            }

            let time_elapsed = start_time.elapsed().as_secs_f64();
            self.metrics_history.push(TrainingMetrics {
                epoch,
                train_loss: epoch_loss,
                time_elapsed,
            });

            if epoch % log_every == 0 || epoch + 1 == self.config.epochs {
                debug!(epoch, train_loss = epoch_loss, time_elapsed, "epoch complete");
            }

            final_loss = epoch_loss;
        }

        network.eval();
        Ok(final_loss)
    }

    /// One gradient step over a mini-batch; returns the summed sample losses.
    fn train_batch(
        &mut self,
        network: &mut SequenceRegressor,
        set: &TrainingSet,
        batch: &[usize],
    ) -> Result<f64> {
        let mut batch_gradients = network.zero_gradients();
        let mut batch_loss = 0.0;

        for &index in batch {
            let (window, target) = &set.samples()[index];
            let (prediction, cache) = network.forward_window_with_cache(window);

            let prediction = Array2::from_elem((1, 1), prediction);
            let target = Array2::from_elem((1, 1), *target);

            batch_loss += self.loss_function.compute_loss(&prediction, &target);
            let d_output = self.loss_function.compute_gradient(&prediction, &target);

            let sample_gradients = network.backward_window(&d_output, &cache);
            batch_gradients.accumulate(&sample_gradients);
        }

        batch_gradients.scale(1.0 / batch.len() as f64);

        if let Some(max_norm) = self.config.clip_gradient {
            clip_gradients(&mut batch_gradients, max_norm);
        }

        network.update_parameters(&batch_gradients, &mut self.optimizer);

        Ok(batch_loss)
    }

    pub fn latest_metrics(&self) -> Option<&TrainingMetrics> {
        self.metrics_history.last()
    }

    pub fn metrics_history(&self) -> &[TrainingMetrics] {
        &self.metrics_history
    }
}

/// Clip each gradient matrix to `max_norm` to prevent exploding gradients
fn clip_gradients(gradients: &mut RegressorGradients, max_norm: f64) {
    for gradient in &mut gradients.cells {
        clip_gradient_matrix(&mut gradient.w_ih, max_norm);
        clip_gradient_matrix(&mut gradient.w_hh, max_norm);
        clip_gradient_matrix(&mut gradient.b, max_norm);
    }
    clip_gradient_matrix(&mut gradients.head_hidden.weight, max_norm);
    clip_gradient_matrix(&mut gradients.head_hidden.bias, max_norm);
    clip_gradient_matrix(&mut gradients.head_out.weight, max_norm);
    clip_gradient_matrix(&mut gradients.head_out.bias, max_norm);
}

fn clip_gradient_matrix(matrix: &mut Array2<f64>, max_norm: f64) {
    let norm = (&*matrix * &*matrix).sum().sqrt();
    if norm > max_norm {
        let scale = max_norm / norm;
        *matrix = matrix.map(|x| x * scale);
    }
}

/// Create a trainer with the Adam optimizer and MSE loss
pub fn create_adam_trainer(learning_rate: f64) -> Trainer<MSELoss, Adam> {
    Trainer::new(MSELoss, Adam::new(learning_rate))
}
