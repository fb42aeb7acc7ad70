use ndarray::Array2;

/// Loss function trait for training the regression network
pub trait LossFunction {
    /// Compute the loss between predictions and targets
    fn compute_loss(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> f64;

    /// Compute the gradient of the loss with respect to predictions
    fn compute_gradient(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> Array2<f64>;
}

/// Mean Squared Error loss function
pub struct MSELoss;

impl LossFunction for MSELoss {
    fn compute_loss(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> f64 {
        let diff = predictions - targets;
        let squared_diff = &diff * &diff;
        squared_diff.sum() / (predictions.len() as f64)
    }

    fn compute_gradient(&self, predictions: &Array2<f64>, targets: &Array2<f64>) -> Array2<f64> {
        let diff = predictions - targets;
        2.0 * diff / (predictions.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_mse_loss() {
        let loss_fn = MSELoss;
        let predictions = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let targets = arr2(&[[1.5, 2.5], [2.5, 3.5]]);

        let loss = loss_fn.compute_loss(&predictions, &targets);
        assert!((loss - 0.25).abs() < 1e-6);

        let gradient = loss_fn.compute_gradient(&predictions, &targets);
        assert_eq!(gradient.shape(), predictions.shape());
    }

    #[test]
    fn test_mse_loss_on_scalar_output() {
        let loss_fn = MSELoss;
        let prediction = arr2(&[[0.8]]);
        let target = arr2(&[[0.5]]);

        let loss = loss_fn.compute_loss(&prediction, &target);
        assert!((loss - 0.09).abs() < 1e-12);

        let gradient = loss_fn.compute_gradient(&prediction, &target);
        assert!((gradient[[0, 0]] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_mse_loss_zero_when_exact() {
        let loss_fn = MSELoss;
        let values = arr2(&[[0.3], [0.7]]);
        assert_eq!(loss_fn.compute_loss(&values, &values), 0.0);
    }
}
