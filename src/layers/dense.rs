use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use serde::{Deserialize, Serialize};

use crate::optimizers::Optimizer;

/// Holds gradients for dense layer parameters during backpropagation
#[derive(Clone, Debug)]
pub struct DenseGradients {
    pub weight: Array2<f64>,
    pub bias: Array2<f64>,
}

/// A fully connected layer with linear activation
///
/// Performs the transformation: output = weight @ input + bias
/// where weight has shape (output_size, input_size) and bias has shape (output_size, 1)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weight: Array2<f64>, // (output_size, input_size)
    pub bias: Array2<f64>,   // (output_size, 1)
    pub input_size: usize,
    pub output_size: usize,
    #[serde(skip)]
    input_cache: Option<Array2<f64>>,
}

impl DenseLayer {
    /// Create a new dense layer with Xavier/Glorot uniform initialization
    pub fn new(input_size: usize, output_size: usize) -> Self {
        let scale = (2.0 / (input_size + output_size) as f64).sqrt();

        let weight = Array2::random((output_size, input_size), Uniform::new(-scale, scale));
        let bias = Array2::zeros((output_size, 1));

        Self {
            weight,
            bias,
            input_size,
            output_size,
            input_cache: None,
        }
    }

    /// Create a new dense layer with zero initialization
    pub fn new_zeros(input_size: usize, output_size: usize) -> Self {
        Self {
            weight: Array2::zeros((output_size, input_size)),
            bias: Array2::zeros((output_size, 1)),
            input_size,
            output_size,
            input_cache: None,
        }
    }

    /// Forward pass, caching the input for the following backward pass
    pub fn forward(&mut self, input: &Array2<f64>) -> Array2<f64> {
        let (input_features, _) = input.dim();
        assert_eq!(
            input_features, self.input_size,
            "Input size {} doesn't match layer input size {}",
            input_features, self.input_size
        );

        self.input_cache = Some(input.clone());

        &self.weight.dot(input) + &self.bias
    }

    /// Backward pass through the layer
    ///
    /// Returns (parameter_gradients, input_gradient). The forward pass must
    /// have run on this layer since the last parameter update.
    pub fn backward(&self, grad_output: &Array2<f64>) -> (DenseGradients, Array2<f64>) {
        let input = self
            .input_cache
            .as_ref()
            .expect("Input cache not found for backward pass");

        let weight_grad = grad_output.dot(&input.t());
        let bias_grad = grad_output
            .sum_axis(ndarray::Axis(1))
            .insert_axis(ndarray::Axis(1));
        let input_grad = self.weight.t().dot(grad_output);

        let gradients = DenseGradients {
            weight: weight_grad,
            bias: bias_grad,
        };

        (gradients, input_grad)
    }

    /// Initialize zero gradients for accumulation
    pub fn zero_gradients(&self) -> DenseGradients {
        DenseGradients {
            weight: Array2::zeros(self.weight.raw_dim()),
            bias: Array2::zeros(self.bias.raw_dim()),
        }
    }

    /// Update parameters using the provided optimizer
    pub fn update_parameters<O: Optimizer>(
        &mut self,
        gradients: &DenseGradients,
        optimizer: &mut O,
        prefix: &str,
    ) {
        optimizer.update(&format!("{}_weight", prefix), &mut self.weight, &gradients.weight);
        optimizer.update(&format!("{}_bias", prefix), &mut self.bias, &gradients.bias);
    }
}
