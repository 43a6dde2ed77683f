//! Prediction data structures

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Predicted price direction for the next session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Banded confidence label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceLabel {
    Low,
    Medium,
    High,
}

impl ConfidenceLabel {
    /// Band a confidence percentage: High above 66, Medium from 33, Low below
    pub fn from_value(value: f64) -> Self {
        if value > 66.0 {
            ConfidenceLabel::High
        } else if value >= 33.0 {
            ConfidenceLabel::Medium
        } else {
            ConfidenceLabel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLabel::Low => "Low",
            ConfidenceLabel::Medium => "Medium",
            ConfidenceLabel::High => "High",
        }
    }
}

impl fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfidenceLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ConfidenceLabel::Low),
            "medium" => Ok(ConfidenceLabel::Medium),
            "high" => Ok(ConfidenceLabel::High),
            other => Err(format!("unknown confidence label: {}", other)),
        }
    }
}

/// Confidence percentage with its label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    /// 0.0 - 100.0
    pub value: f64,
    pub label: ConfidenceLabel,
}

impl Confidence {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            label: ConfidenceLabel::from_value(value),
        }
    }

    /// Zero confidence, used when a symbol has no usable headlines
    pub fn none() -> Self {
        Self {
            value: 0.0,
            label: ConfidenceLabel::Low,
        }
    }

    /// Confidence as a whole percentage, as stored in the accuracy history
    pub fn rounded(&self) -> u8 {
        self.value.round().clamp(0.0, 100.0) as u8
    }
}

/// Trading recommendation derived from sentiment and confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Hold,
    Avoid,
}

impl Recommendation {
    /// Presentation rank: BUY first, AVOID last
    pub fn rank(&self) -> u8 {
        match self {
            Recommendation::Buy => 0,
            Recommendation::Hold => 1,
            Recommendation::Avoid => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Avoid => "AVOID",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One symbol's prediction for a gather run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub symbol: String,
    /// Reference day the prediction was made on
    pub date: NaiveDate,
    #[serde(default)]
    pub company: String,
    /// Recency and relevance weighted sentiment
    pub score: f64,
    pub direction: Direction,
    pub confidence: Confidence,
    pub recommendation: Recommendation,
    /// Expected holding period label (e.g., "2-3 days")
    pub turnover: String,
    /// Matched headline titles, most relevant first
    #[serde(default)]
    pub headlines: Vec<String>,
    /// News retrieval failed, so the prediction is built on no evidence
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

/// All predictions written by one gather run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBatch {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub results: Vec<PredictionRecord>,
}

impl PredictionBatch {
    /// Find the prediction for a symbol (case-insensitive)
    pub fn find(&self, symbol: &str) -> Option<&PredictionRecord> {
        self.results
            .iter()
            .find(|r| r.symbol.eq_ignore_ascii_case(symbol))
    }
}
