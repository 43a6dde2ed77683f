//! Error types for the news module

use forecast_core::ForecastError;
use thiserror::Error;

/// Errors that can occur while fetching headlines
#[derive(Debug, Error)]
pub enum NewsError {
    /// HTTP request failed (includes timeouts)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// API returned an error response
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// Failed to parse API response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<NewsError> for ForecastError {
    fn from(err: NewsError) -> Self {
        match err {
            NewsError::RequestFailed(msg) => ForecastError::network(msg),
            NewsError::ApiError { status, message } => {
                ForecastError::api(format!("news API status {}: {}", status, message))
            }
            NewsError::ParseError(msg) => ForecastError::parse(msg),
            NewsError::RateLimited => ForecastError::rate_limited("news API"),
            NewsError::InvalidConfig(msg) => ForecastError::config(msg),
        }
    }
}
