use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use serde::{Deserialize, Serialize};

/// Inverted dropout layer for regularization
///
/// In training mode each element is zeroed with probability `rate` and the
/// survivors are scaled by `1 / (1 - rate)`, so evaluation mode is a plain
/// identity. The mask from the most recent forward pass is kept so the
/// backward pass can replay it.
#[derive(Clone, Serialize, Deserialize)]
pub struct Dropout {
    pub rate: f64,
    pub is_training: bool,
    #[serde(skip)]
    mask: Option<Array2<f64>>,
}

impl Dropout {
    pub fn new(rate: f64) -> Self {
        assert!(
            (0.0..1.0).contains(&rate),
            "Dropout rate must be in [0.0, 1.0)"
        );

        Dropout {
            rate,
            is_training: true,
            mask: None,
        }
    }

    pub fn train(&mut self) {
        self.is_training = true;
    }

    pub fn eval(&mut self) {
        self.is_training = false;
        self.mask = None;
    }

    pub fn forward(&mut self, input: &Array2<f64>) -> Array2<f64> {
        if !self.is_training || self.rate == 0.0 {
            self.mask = None;
            return input.clone();
        }

        let keep_prob = 1.0 - self.rate;
        let dist = Uniform::new(0.0, 1.0);
        let mask = Array2::random(input.raw_dim(), dist)
            .mapv(|x| if x < keep_prob { 1.0 } else { 0.0 });

        let output = input * &mask / keep_prob;
        self.mask = Some(mask);
        output
    }

    /// The mask saved by the most recent training-mode forward pass.
    pub fn last_mask(&self) -> Option<&Array2<f64>> {
        self.mask.as_ref()
    }

    /// Route a gradient back through a saved mask.
    pub fn backward_with_mask(&self, grad_output: &Array2<f64>, mask: Option<&Array2<f64>>) -> Array2<f64> {
        match mask {
            Some(mask) => grad_output * mask / (1.0 - self.rate),
            None => grad_output.clone(),
        }
    }
}
