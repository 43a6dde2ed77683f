//! Core types for the Stock Sentiment Forecaster
//!
//! This crate defines the shared data structures used across the forecaster,
//! including headlines, predictions, the accuracy history, and the capability
//! traits implemented by the news, sentiment, quote, and persistence adapters.

pub mod capability;
pub mod error;
pub mod evaluation;
pub mod news;
pub mod prediction;
pub mod watchlist;

pub use capability::{
    clamp_polarity, NewsSource, PersistenceSink, PriceQuoteSource, SentimentAssessment,
    SentimentOracle,
};
pub use error::{ForecastError, ForecastResult};
pub use evaluation::{ActualDirection, CalibrationMetric, CalibrationVerdict, EvaluationRecord};
pub use news::{MatchedHeadline, NewsArticle, SentimentInsight};
pub use prediction::{
    Confidence, ConfidenceLabel, Direction, PredictionBatch, PredictionRecord, Recommendation,
};
pub use watchlist::WatchlistEntry;
