use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::layers::dense::{DenseGradients, DenseLayer};
use crate::layers::dropout::Dropout;
use crate::layers::lstm_cell::{LSTMCell, LSTMCellCache, LSTMCellGradients};
use crate::optimizers::Optimizer;

/// Everything recorded while running one window forward, enough to replay
/// the pass backwards: per-timestep per-layer cell caches plus the dropout
/// masks that were drawn.
#[derive(Clone)]
pub struct WindowCache {
    pub steps: Vec<Vec<LSTMCellCache>>, // [timestep][layer]
    pub inter_masks: Vec<Vec<Option<Array2<f64>>>>, // [timestep][gap between layer l and l+1]
    pub head_mask: Option<Array2<f64>>,
}

/// Gradients for every trainable parameter in the network, in layer order.
#[derive(Clone)]
pub struct RegressorGradients {
    pub cells: Vec<LSTMCellGradients>,
    pub head_hidden: DenseGradients,
    pub head_out: DenseGradients,
}

impl RegressorGradients {
    /// Elementwise accumulate `other` into `self`.
    pub fn accumulate(&mut self, other: &RegressorGradients) {
        for (total, step) in self.cells.iter_mut().zip(other.cells.iter()) {
            total.w_ih = &total.w_ih + &step.w_ih;
            total.w_hh = &total.w_hh + &step.w_hh;
            total.b = &total.b + &step.b;
        }
        self.head_hidden.weight = &self.head_hidden.weight + &other.head_hidden.weight;
        self.head_hidden.bias = &self.head_hidden.bias + &other.head_hidden.bias;
        self.head_out.weight = &self.head_out.weight + &other.head_out.weight;
        self.head_out.bias = &self.head_out.bias + &other.head_out.bias;
    }

    /// Scale every gradient by `factor` (used for mini-batch averaging).
    pub fn scale(&mut self, factor: f64) {
        for grad in &mut self.cells {
            grad.w_ih *= factor;
            grad.w_hh *= factor;
            grad.b *= factor;
        }
        self.head_hidden.weight *= factor;
        self.head_hidden.bias *= factor;
        self.head_out.weight *= factor;
        self.head_out.bias *= factor;
    }
}

/// Stacked LSTM regression network with a two-stage dense head
///
/// Layer l feeds layer l+1 through inter-layer dropout; the final hidden
/// state passes through one more dropout and then
/// `DenseLayer(hidden → dense)` and `DenseLayer(dense → 1)`, both with
/// linear activation. The network consumes a window one scalar per
/// timestep and emits a single scalar prediction for the step after the
/// window.
#[derive(Clone, Serialize, Deserialize)]
pub struct SequenceRegressor {
    cells: Vec<LSTMCell>,
    inter_dropouts: Vec<Dropout>,
    head_dropout: Dropout,
    head_hidden: DenseLayer,
    head_out: DenseLayer,
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub dense_size: usize,
    pub is_training: bool,
}

impl SequenceRegressor {
    /// Creates a new network; `num_layers` must be at least 1.
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        num_layers: usize,
        dense_size: usize,
        dropout_rate: f64,
    ) -> Self {
        assert!(num_layers >= 1, "network needs at least one LSTM layer");

        let mut cells = Vec::with_capacity(num_layers);
        for i in 0..num_layers {
            let layer_input_size = if i == 0 { input_size } else { hidden_size };
            cells.push(LSTMCell::new(layer_input_size, hidden_size));
        }

        let inter_dropouts = (0..num_layers.saturating_sub(1))
            .map(|_| Dropout::new(dropout_rate))
            .collect();

        SequenceRegressor {
            cells,
            inter_dropouts,
            head_dropout: Dropout::new(dropout_rate),
            head_hidden: DenseLayer::new(hidden_size, dense_size),
            head_out: DenseLayer::new(dense_size, 1),
            input_size,
            hidden_size,
            num_layers,
            dense_size,
            is_training: true,
        }
    }

    /// Set training mode (dropout active)
    pub fn train(&mut self) {
        self.is_training = true;
        for dropout in &mut self.inter_dropouts {
            dropout.train();
        }
        self.head_dropout.train();
    }

    /// Set evaluation mode (dropout disabled, forward passes deterministic)
    pub fn eval(&mut self) {
        self.is_training = false;
        for dropout in &mut self.inter_dropouts {
            dropout.eval();
        }
        self.head_dropout.eval();
    }

    /// Run one window through the network and return the scalar prediction
    pub fn forward_window(&mut self, window: &[f64]) -> f64 {
        let (output, _) = self.forward_window_with_cache(window);
        output
    }

    /// Forward pass that records everything needed for [`Self::backward_window`]
    pub fn forward_window_with_cache(&mut self, window: &[f64]) -> (f64, WindowCache) {
        let mut hx: Vec<Array2<f64>> = (0..self.num_layers)
            .map(|_| Array2::zeros((self.hidden_size, 1)))
            .collect();
        let mut cx = hx.clone();

        let mut steps = Vec::with_capacity(window.len());
        let mut inter_masks = Vec::with_capacity(window.len());

        for &value in window {
            let mut layer_input = Array2::from_elem((self.input_size, 1), value);
            let mut step_caches = Vec::with_capacity(self.num_layers);
            let mut step_masks = Vec::with_capacity(self.inter_dropouts.len());

            for l in 0..self.num_layers {
                let (hy, cy, cache) =
                    self.cells[l].forward_with_cache(&layer_input, &hx[l], &cx[l]);
                step_caches.push(cache);

                if l + 1 < self.num_layers {
                    layer_input = self.inter_dropouts[l].forward(&hy);
                    step_masks.push(self.inter_dropouts[l].last_mask().cloned());
                }

                hx[l] = hy;
                cx[l] = cy;
            }

            steps.push(step_caches);
            inter_masks.push(step_masks);
        }

        let final_hidden = hx[self.num_layers - 1].clone();
        let head_input = self.head_dropout.forward(&final_hidden);
        let head_mask = self.head_dropout.last_mask().cloned();

        let hidden_out = self.head_hidden.forward(&head_input);
        let output = self.head_out.forward(&hidden_out);

        let cache = WindowCache {
            steps,
            inter_masks,
            head_mask,
        };

        (output[[0, 0]], cache)
    }

    /// Backpropagation through time for one window
    ///
    /// The loss gradient enters through the dense head at the final
    /// timestep, then flows backwards across timesteps within each layer
    /// (through the hidden and cell states) and from each layer into the
    /// one below it at the same timestep. Dropout masks recorded during the
    /// forward pass are replayed. Must be called with the cache from the
    /// immediately preceding [`Self::forward_window_with_cache`].
    pub fn backward_window(
        &self,
        d_output: &Array2<f64>,
        cache: &WindowCache,
    ) -> RegressorGradients {
        let (head_out_grads, d_hidden_out) = self.head_out.backward(d_output);
        let (head_hidden_grads, d_head_input) = self.head_hidden.backward(&d_hidden_out);

        let d_final = self
            .head_dropout
            .backward_with_mask(&d_head_input, cache.head_mask.as_ref());

        let mut cell_grads: Vec<LSTMCellGradients> =
            self.cells.iter().map(|c| c.zero_gradients()).collect();
        let mut dh_next: Vec<Array2<f64>> = (0..self.num_layers)
            .map(|_| Array2::zeros((self.hidden_size, 1)))
            .collect();
        let mut dc_next = dh_next.clone();

        // The only loss contribution lands on the last hidden state.
        dh_next[self.num_layers - 1] = d_final;

        for t in (0..cache.steps.len()).rev() {
            let mut d_from_above: Option<Array2<f64>> = None;

            for l in (0..self.num_layers).rev() {
                let mut dhy = dh_next[l].clone();
                if let Some(dx_above) = d_from_above.take() {
                    // dx_above is w.r.t. the dropped output of this layer.
                    dhy = dhy
                        + self.inter_dropouts[l]
                            .backward_with_mask(&dx_above, cache.inter_masks[t][l].as_ref());
                }

                let (step_grads, dx, dhx, dcx) =
                    self.cells[l].backward(&dhy, &dc_next[l], &cache.steps[t][l]);

                cell_grads[l].w_ih = &cell_grads[l].w_ih + &step_grads.w_ih;
                cell_grads[l].w_hh = &cell_grads[l].w_hh + &step_grads.w_hh;
                cell_grads[l].b = &cell_grads[l].b + &step_grads.b;

                dh_next[l] = dhx;
                dc_next[l] = dcx;

                if l > 0 {
                    d_from_above = Some(dx);
                }
            }
        }

        RegressorGradients {
            cells: cell_grads,
            head_hidden: head_hidden_grads,
            head_out: head_out_grads,
        }
    }

    /// Initialize zero gradients matching this network's parameters
    pub fn zero_gradients(&self) -> RegressorGradients {
        RegressorGradients {
            cells: self.cells.iter().map(|c| c.zero_gradients()).collect(),
            head_hidden: self.head_hidden.zero_gradients(),
            head_out: self.head_out.zero_gradients(),
        }
    }

    /// Update all parameters using the provided optimizer
    pub fn update_parameters<O: Optimizer>(
        &mut self,
        gradients: &RegressorGradients,
        optimizer: &mut O,
    ) {
        for (i, (cell, cell_gradients)) in self
            .cells
            .iter_mut()
            .zip(gradients.cells.iter())
            .enumerate()
        {
            cell.update_parameters(cell_gradients, optimizer, &format!("lstm_{}", i));
        }
        self.head_hidden
            .update_parameters(&gradients.head_hidden, optimizer, "head_hidden");
        self.head_out
            .update_parameters(&gradients.head_out, optimizer, "head_out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_forward_window_returns_scalar() {
        let mut network = SequenceRegressor::new(1, 4, 2, 3, 0.2);
        network.eval();

        let window = vec![0.1, 0.3, 0.5, 0.7];
        let output = network.forward_window(&window);
        assert!(output.is_finite());
    }

    #[test]
    fn test_eval_forward_is_deterministic() {
        let mut network = SequenceRegressor::new(1, 5, 2, 3, 0.5);
        network.eval();

        let window = vec![0.2, 0.4, 0.6];
        let first = network.forward_window(&window);
        let second = network.forward_window(&window);

        assert_eq!(first, second);
    }

    #[test]
    fn test_backward_window_gradient_shapes() {
        let hidden = 4;
        let dense = 3;
        let mut network = SequenceRegressor::new(1, hidden, 2, dense, 0.2);
        network.train();

        let window = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let (_output, cache) = network.forward_window_with_cache(&window);
        let gradients = network.backward_window(&arr2(&[[1.0]]), &cache);

        assert_eq!(gradients.cells.len(), 2);
        assert_eq!(gradients.cells[0].w_ih.shape(), &[4 * hidden, 1]);
        assert_eq!(gradients.cells[1].w_ih.shape(), &[4 * hidden, hidden]);
        assert_eq!(gradients.head_hidden.weight.shape(), &[dense, hidden]);
        assert_eq!(gradients.head_out.weight.shape(), &[1, dense]);
    }

    #[test]
    fn test_backward_produces_nonzero_gradients() {
        let mut network = SequenceRegressor::new(1, 4, 2, 3, 0.0);
        network.train();

        let window = vec![0.9, 0.8, 0.7];
        let (_output, cache) = network.forward_window_with_cache(&window);
        let gradients = network.backward_window(&arr2(&[[1.0]]), &cache);

        let total: f64 = gradients
            .cells
            .iter()
            .map(|g| g.w_ih.map(|x| x.abs()).sum() + g.w_hh.map(|x| x.abs()).sum())
            .sum::<f64>()
            + gradients.head_out.weight.map(|x| x.abs()).sum();
        assert!(total > 0.0);
    }

    #[test]
    fn test_gradient_accumulation_and_scaling() {
        let mut network = SequenceRegressor::new(1, 3, 1, 2, 0.0);
        network.train();

        let window = vec![0.5, 0.6];
        let (_output, cache) = network.forward_window_with_cache(&window);
        let single = network.backward_window(&arr2(&[[1.0]]), &cache);

        let mut doubled = network.zero_gradients();
        doubled.accumulate(&single);
        doubled.accumulate(&single);
        doubled.scale(0.5);

        let diff = (&doubled.cells[0].w_ih - &single.cells[0].w_ih)
            .map(|x| x.abs())
            .sum();
        assert!(diff < 1e-12);
    }

    #[test]
    fn test_single_layer_network() {
        let mut network = SequenceRegressor::new(1, 3, 1, 2, 0.2);
        network.eval();

        let window = vec![0.1, 0.2, 0.3];
        let output = network.forward_window(&window);
        assert!(output.is_finite());

        network.train();
        let (_output, cache) = network.forward_window_with_cache(&window);
        let gradients = network.backward_window(&arr2(&[[0.5]]), &cache);
        assert_eq!(gradients.cells.len(), 1);
    }
}
