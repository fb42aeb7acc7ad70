/// Module for the LSTM cell layer.
pub mod lstm_cell;

/// Module for fully connected layers.
pub mod dense;

/// Module for dropout regularization.
pub mod dropout;
