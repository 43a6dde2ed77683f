//! Error types for the forecaster

use thiserror::Error;

/// Forecaster-wide error type
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ForecastError {
    pub fn api(msg: impl Into<String>) -> Self {
        ForecastError::Api(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        ForecastError::Network(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        ForecastError::Parse(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ForecastError::NotFound(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        ForecastError::RateLimited(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        ForecastError::Io(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ForecastError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ForecastError::Internal(msg.into())
    }

    /// Whether the failure is worth retrying on a later run (network hiccups, throttling)
    pub fn is_transient(&self) -> bool {
        matches!(self, ForecastError::Network(_) | ForecastError::RateLimited(_))
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Parse(err.to_string())
    }
}

/// Result type alias for forecaster operations
pub type ForecastResult<T> = Result<T, ForecastError>;
