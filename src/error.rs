use chrono::NaiveDate;
use thiserror::Error;

/// Errors produced by the forecasting pipeline and its service surface.
///
/// Every variant maps to an HTTP status through [`ForecastError::status_code`]
/// so a transport layer can translate failures without matching on variants.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: &'static str },

    #[error("{field} out of range: {actual} not in [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("No data found for ticker: {ticker}")]
    NotFound { ticker: String },

    #[error("Insufficient data: need at least {needed} points, got {actual}")]
    InsufficientData { needed: usize, actual: usize },

    #[error("Insufficient history: need at least {needed} points, got {actual}")]
    InsufficientHistory { needed: usize, actual: usize },

    #[error("Scaler used before fitting")]
    ScalerNotFitted,

    #[error("Model used before training or loading")]
    ModelNotReady,

    #[error("Window length mismatch: expected {expected}, got {actual}")]
    WindowLength { expected: usize, actual: usize },

    #[error("Invalid market data: {reason}")]
    InvalidData { reason: String },

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type with the crate-wide error.
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    /// HTTP status code an API boundary should report for this error.
    ///
    /// Request validation failures are 400, an unknown ticker is 404, a
    /// series too short to train on is 422, upstream data problems are
    /// 502/503, and everything else is a plain 500.
    pub fn status_code(&self) -> u16 {
        match self {
            ForecastError::MissingParameter { .. }
            | ForecastError::OutOfRange { .. }
            | ForecastError::InvalidDateRange { .. } => 400,
            ForecastError::NotFound { .. } => 404,
            ForecastError::InsufficientData { .. } | ForecastError::InsufficientHistory { .. } => {
                422
            }
            ForecastError::InvalidData { .. } => 502,
            ForecastError::Provider(_) => 503,
            ForecastError::ScalerNotFitted
            | ForecastError::ModelNotReady
            | ForecastError::WindowLength { .. }
            | ForecastError::Training(_)
            | ForecastError::Config(_)
            | ForecastError::Io(_)
            | ForecastError::Serialization(_)
            | ForecastError::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(error: serde_json::Error) -> Self {
        ForecastError::Serialization(error.to_string())
    }
}

impl From<bincode::Error> for ForecastError {
    fn from(error: bincode::Error) -> Self {
        ForecastError::Serialization(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_formatting() {
        let error = ForecastError::OutOfRange {
            field: "prediction_days",
            min: 1,
            max: 30,
            actual: 31,
        };

        let msg = error.to_string();
        assert!(msg.contains("prediction_days"));
        assert!(msg.contains("31"));
        assert!(msg.contains("[1, 30]"));
    }

    #[test]
    fn test_insufficient_data_formatting() {
        let error = ForecastError::InsufficientData {
            needed: 61,
            actual: 40,
        };

        let msg = error.to_string();
        assert!(msg.contains("61"));
        assert!(msg.contains("40"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ForecastError::MissingParameter { name: "ticker" }.status_code(),
            400
        );
        assert_eq!(
            ForecastError::NotFound {
                ticker: "ZZZZ".to_string()
            }
            .status_code(),
            404
        );
        assert_eq!(
            ForecastError::InsufficientData {
                needed: 61,
                actual: 10
            }
            .status_code(),
            422
        );
        assert_eq!(ForecastError::ModelNotReady.status_code(), 500);
        assert_eq!(
            ForecastError::Provider("connection refused".to_string()).status_code(),
            503
        );
        assert_eq!(
            ForecastError::InvalidData {
                reason: "bad row".to_string()
            }
            .status_code(),
            502
        );
    }
}
