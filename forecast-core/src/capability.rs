//! Capability interfaces for the collaborators the pipeline depends on
//!
//! Each external concern (news retrieval, sentiment extraction, price quotes,
//! durable output) sits behind one narrow trait so the pipeline can be run
//! against fakes in tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ForecastResult;
use crate::evaluation::EvaluationRecord;
use crate::news::NewsArticle;

/// Source of news headlines
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Fetch up to `limit` articles matching `query`
    async fn fetch(&self, query: &str, limit: usize) -> ForecastResult<Vec<NewsArticle>>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Structured sentiment for one piece of text
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentAssessment {
    /// Polarity (-1.0 - 1.0)
    pub sentiment: f64,
    /// Oracle's own confidence in the reading (0 - 100), if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Companies or tickers the text affects
    #[serde(default)]
    pub affected_entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl SentimentAssessment {
    /// A bare polarity reading, clamped to [-1, 1]
    pub fn polarity(sentiment: f64) -> Self {
        Self {
            sentiment: clamp_polarity(sentiment),
            ..Self::default()
        }
    }
}

/// Clamp a polarity into [-1, 1]; NaN becomes neutral
pub fn clamp_polarity(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Extracts sentiment from headline text
#[async_trait]
pub trait SentimentOracle: Send + Sync {
    async fn assess(&self, text: &str) -> ForecastResult<SentimentAssessment>;

    fn name(&self) -> &str;
}

/// Daily closing prices
#[async_trait]
pub trait PriceQuoteSource: Send + Sync {
    /// Closing price for `symbol` on `date` as a decimal string, `None` when the
    /// market has no close for that day
    async fn closing_price(&self, symbol: &str, date: NaiveDate) -> ForecastResult<Option<String>>;
}

/// Durable output for reports and the accuracy history
pub trait PersistenceSink: Send + Sync {
    /// Write (or replace) a report at `relative_path`, returning its full path
    fn write_report(&self, relative_path: &Path, contents: &str) -> ForecastResult<PathBuf>;

    /// Append records to the accuracy history, one per line
    fn append_history(&self, records: &[EvaluationRecord]) -> ForecastResult<PathBuf>;
}
