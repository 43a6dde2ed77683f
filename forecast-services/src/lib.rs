//! Forecasting services for the Stock Sentiment Forecaster
//!
//! This crate holds the pipeline itself: headline relevance matching,
//! sentiment scoring, directional prediction, accuracy evaluation,
//! calibration, report rendering and the orchestration that ties them to the
//! news, sentiment, quote and persistence adapters.

pub mod calibration;
pub mod config;
pub mod discovery;
pub mod evaluator;
pub mod history;
pub mod persistence;
pub mod pipeline;
pub mod predictor;
pub mod relevance;
pub mod reports;
pub mod scorer;
pub mod similarity;
pub mod watchlist;

pub use calibration::{adjustment_report, analyze, analyze_log, DEFAULT_WINDOW_DAYS};
pub use config::{ForecastConfig, NewsProvider, SentimentProvider};
pub use discovery::{StockDiscovery, DEFAULT_DISCOVERY_QUERY};
pub use evaluator::AccuracyEvaluator;
pub use history::HistoryLog;
pub use persistence::{Committer, FileSink, GitCommitter, NoopCommitter};
pub use pipeline::{
    CalibrationOutcome, EvaluationOutcome, ForecastOutcome, ForecastPipeline, GatherOutcome,
};
pub use predictor::{
    classify, narrative, recommendation_and_turnover, sort_for_presentation,
    NARRATIVE_DEAD_BAND, PRIMARY_DIRECTION_THRESHOLD,
};
pub use relevance::{default_company, RelevanceMatcher, DEFAULT_KEYWORDS, DEFAULT_RELEVANCE_THRESHOLD};
pub use reports::{ReportStore, SymbolForecast};
pub use scorer::{confidence, weighted_score, weighted_score_at, SentimentScorer};
pub use similarity::sequence_ratio;
pub use watchlist::WatchlistStore;
