//! Wire types for LLM sentiment replies

use serde::{Deserialize, Serialize};

use forecast_core::{clamp_polarity, SentimentAssessment};

/// JSON object the sentiment prompt asks the model to return
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentReply {
    /// -1.0 (very bearish) to 1.0 (very bullish)
    pub sentiment: f64,
    /// Model's confidence in its reading, 0 - 100
    #[serde(default)]
    pub confidence_score: Option<f64>,
    /// Tickers or company names the headline affects
    #[serde(default)]
    pub affected_entities: Vec<String>,
    /// Expected impact horizon, e.g. "short-term" or "long-term"
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
}

impl From<SentimentReply> for SentimentAssessment {
    fn from(reply: SentimentReply) -> Self {
        let rationale = match (reply.rationale, reply.duration) {
            (Some(r), Some(d)) if !d.trim().is_empty() => Some(format!("{} ({})", r, d)),
            (r, _) => r,
        };
        SentimentAssessment {
            sentiment: clamp_polarity(reply.sentiment),
            confidence: reply.confidence_score.map(|c| c.clamp(0.0, 100.0)),
            affected_entities: reply
                .affected_entities
                .into_iter()
                .map(|e| e.trim().to_uppercase())
                .filter(|e| !e.is_empty())
                .collect(),
            rationale,
        }
    }
}
