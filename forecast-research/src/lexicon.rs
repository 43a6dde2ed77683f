//! Offline headline polarity scorer
//!
//! A small financial lexicon with negation and intensifier handling. Used when
//! no LLM is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use forecast_core::{ForecastResult, SentimentAssessment, SentimentOracle};

/// (word, polarity) pairs; polarity in [-1, 1]
const POLARITY_LEXICON: &[(&str, f64)] = &[
    // Bullish
    ("beat", 0.6),
    ("beats", 0.6),
    ("surge", 0.7),
    ("surges", 0.7),
    ("soar", 0.8),
    ("soars", 0.8),
    ("jump", 0.5),
    ("jumps", 0.5),
    ("rally", 0.6),
    ("rallies", 0.6),
    ("gain", 0.4),
    ("gains", 0.4),
    ("rise", 0.3),
    ("rises", 0.3),
    ("record", 0.4),
    ("growth", 0.4),
    ("profit", 0.4),
    ("profits", 0.4),
    ("strong", 0.4),
    ("upgrade", 0.6),
    ("upgraded", 0.6),
    ("outperform", 0.5),
    ("bullish", 0.7),
    ("boost", 0.5),
    ("boosts", 0.5),
    ("expands", 0.3),
    ("launch", 0.2),
    ("launches", 0.2),
    ("approval", 0.5),
    ("approved", 0.5),
    ("win", 0.5),
    ("wins", 0.5),
    ("partnership", 0.3),
    ("innovative", 0.5),
    ("positive", 0.4),
    ("good", 0.7),
    ("great", 0.8),
    ("best", 1.0),
    ("better", 0.5),
    ("higher", 0.25),
    // Bearish
    ("miss", -0.6),
    ("misses", -0.6),
    ("plunge", -0.8),
    ("plunges", -0.8),
    ("slump", -0.6),
    ("slumps", -0.6),
    ("fall", -0.4),
    ("falls", -0.4),
    ("drop", -0.4),
    ("drops", -0.4),
    ("decline", -0.4),
    ("declines", -0.4),
    ("loss", -0.5),
    ("losses", -0.5),
    ("weak", -0.4),
    ("downgrade", -0.6),
    ("downgraded", -0.6),
    ("lawsuit", -0.5),
    ("sued", -0.5),
    ("probe", -0.4),
    ("investigation", -0.4),
    ("recall", -0.5),
    ("layoffs", -0.5),
    ("cuts", -0.3),
    ("bearish", -0.7),
    ("warning", -0.4),
    ("warns", -0.4),
    ("fraud", -0.9),
    ("bankruptcy", -1.0),
    ("crash", -0.8),
    ("negative", -0.3),
    ("bad", -0.7),
    ("worst", -1.0),
    ("worse", -0.5),
    ("lower", -0.25),
    ("fears", -0.4),
];

/// Words that flip the polarity of the next sentiment word
const NEGATIONS: &[&str] = &["not", "no", "never", "without", "fails", "failed", "isn't", "doesn't", "didn't", "won't"];

/// (word, multiplier) applied to the next sentiment word
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("sharply", 1.4),
    ("strongly", 1.3),
    ("massive", 1.4),
    ("huge", 1.3),
    ("slightly", 0.5),
    ("modest", 0.6),
];

/// Flipped polarities are damped rather than mirrored: "not good" is mildly negative
const NEGATION_FACTOR: f64 = -0.5;

/// Lexicon-based sentiment oracle
pub struct LexiconSentimentOracle {
    polarity: HashMap<&'static str, f64>,
    intensifiers: HashMap<&'static str, f64>,
}

impl LexiconSentimentOracle {
    pub fn new() -> Self {
        Self {
            polarity: POLARITY_LEXICON.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }

    /// Mean polarity of the sentiment-bearing words in `text`, in [-1, 1]
    pub fn polarity(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .collect();

        let mut scores = Vec::new();
        let mut negate = false;
        let mut multiplier = 1.0;

        for token in tokens {
            if NEGATIONS.contains(&token) {
                negate = true;
                continue;
            }
            if let Some(m) = self.intensifiers.get(token) {
                multiplier *= m;
                continue;
            }
            if let Some(p) = self.polarity.get(token) {
                let mut score = p * multiplier;
                if negate {
                    score *= NEGATION_FACTOR;
                }
                scores.push(score.clamp(-1.0, 1.0));
            }
            negate = false;
            multiplier = 1.0;
        }

        if scores.is_empty() {
            return 0.0;
        }
        (scores.iter().sum::<f64>() / scores.len() as f64).clamp(-1.0, 1.0)
    }
}

impl Default for LexiconSentimentOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentOracle for LexiconSentimentOracle {
    async fn assess(&self, text: &str) -> ForecastResult<SentimentAssessment> {
        Ok(SentimentAssessment::polarity(self.polarity(text)))
    }

    fn name(&self) -> &str {
        "Lexicon"
    }
}
