/// Module for the stacked LSTM regression network.
pub mod regressor;

/// Module for the trained price model facade.
pub mod price_model;
