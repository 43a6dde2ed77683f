//! Sentiment scoring
//!
//! Attaches oracle sentiment to matched headlines, then aggregates the
//! insights into a relevance and recency weighted score plus a confidence
//! percentage.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use forecast_core::{Confidence, MatchedHeadline, SentimentInsight, SentimentOracle};
use tracing::{debug, instrument, warn};

/// Headlines older than this many days stop losing weight
const RECENCY_HORIZON_DAYS: f64 = 7.0;
/// Floor for the recency weight of old headlines
const MIN_RECENCY_WEIGHT: f64 = 0.5;
/// Headline count at which the volume term of confidence saturates
const FULL_VOLUME_COUNT: f64 = 5.0;

const RELEVANCE_WEIGHT: f64 = 0.4;
const SENTIMENT_WEIGHT: f64 = 0.4;
const VOLUME_WEIGHT: f64 = 0.2;

/// Scores matched headlines with a sentiment oracle
pub struct SentimentScorer {
    oracle: Arc<dyn SentimentOracle>,
}

impl SentimentScorer {
    pub fn new(oracle: Arc<dyn SentimentOracle>) -> Self {
        Self { oracle }
    }

    /// One oracle call per headline, in input order
    ///
    /// A failed call is logged and contributes zero sentiment, so one bad
    /// response never drops the rest of the symbol's evidence.
    #[instrument(skip(self, headlines), fields(oracle = self.oracle.name(), count = headlines.len()))]
    pub async fn analyze(&self, headlines: &[MatchedHeadline]) -> Vec<SentimentInsight> {
        let mut insights = Vec::with_capacity(headlines.len());

        for headline in headlines {
            let insight = match self.oracle.assess(&headline.title).await {
                Ok(assessment) => SentimentInsight::from_match(headline, assessment.sentiment)
                    .with_rationale(assessment.rationale),
                Err(e) => {
                    warn!(
                        "Sentiment oracle failed for '{}': {}; using 0.0",
                        headline.title, e
                    );
                    SentimentInsight::from_match(headline, 0.0)
                }
            };
            insights.push(insight);
        }

        debug!("Scored {} headlines", insights.len());
        insights
    }
}

/// Recency weight for a headline published at `published_at`
///
/// Linear decay over a week, floored at 0.5. Missing timestamps count as fresh.
pub fn recency_weight(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match published_at {
        Some(published) => {
            let age_days = (now - published).num_milliseconds() as f64 / 86_400_000.0;
            (1.0 - age_days / RECENCY_HORIZON_DAYS).max(MIN_RECENCY_WEIGHT)
        }
        None => 1.0,
    }
}

/// Weighted sentiment as of now
pub fn weighted_score(insights: &[SentimentInsight]) -> f64 {
    weighted_score_at(insights, Utc::now())
}

/// `Σ(sentiment·w) / Σw` with `w = relevance · recency`; 0.0 when the weights sum to zero
pub fn weighted_score_at(insights: &[SentimentInsight], now: DateTime<Utc>) -> f64 {
    let (total, weight_sum) = insights.iter().fold((0.0, 0.0), |(total, sum), insight| {
        let weight = insight.relevance_score * recency_weight(insight.published_at, now);
        (total + insight.sentiment * weight, sum + weight)
    });

    if weight_sum == 0.0 {
        0.0
    } else {
        total / weight_sum
    }
}

/// Confidence from mean relevance, mean absolute sentiment and headline volume
pub fn confidence(insights: &[SentimentInsight]) -> Confidence {
    if insights.is_empty() {
        return Confidence::none();
    }

    let n = insights.len() as f64;
    let avg_relevance = insights.iter().map(|i| i.relevance_score).sum::<f64>() / n;
    let avg_abs_sentiment = insights.iter().map(|i| i.sentiment.abs()).sum::<f64>() / n;
    let volume = (n / FULL_VOLUME_COUNT).min(1.0);

    let value = (avg_relevance * RELEVANCE_WEIGHT
        + avg_abs_sentiment * SENTIMENT_WEIGHT
        + volume * VOLUME_WEIGHT)
        * 100.0;

    Confidence::new(value.clamp(0.0, 100.0))
}
