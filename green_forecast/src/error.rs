//! Error types for the green_forecast crate

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by a [`Predictor`](crate::predictor::Predictor)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictorError {
    /// The underlying model rejected the input or failed internally
    #[error("Model error: {0}")]
    Model(String),

    /// The model produced NaN or an infinite value
    #[error("Model returned a non-finite value: {0}")]
    NonFinite(f64),

    /// The feature vector length does not match what the model was trained on
    #[error("Expected {expected} features, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// The feature names or their order differ from the trained schema
    #[error("Expected features {expected:?}, got {actual:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// Custom error types for the green_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// No historical record is available to act as the baseline template
    #[error("Insufficient history: at least one historical record is required")]
    InsufficientHistory,

    /// The requested forecast window ends before it starts
    #[error("Invalid range: start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// The predictor failed for a specific forecast day
    #[error("Prediction failed for {day}: {source}")]
    PredictionFailure {
        day: NaiveDate,
        #[source]
        source: PredictorError,
    },

    /// A feature required by the schema cannot be derived from the baseline
    #[error("Missing feature: {0}")]
    MissingFeature(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error reading runtime configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV reading or writing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from model artifact (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    /// The day a prediction failed on, if this is a prediction failure
    pub fn failed_day(&self) -> Option<NaiveDate> {
        match self {
            ForecastError::PredictionFailure { day, .. } => Some(*day),
            _ => None,
        }
    }
}
