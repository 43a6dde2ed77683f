//! Directional prediction and recommendations

use chrono::NaiveDate;
use forecast_core::{Direction, PredictionRecord, Recommendation, SentimentInsight};

use crate::scorer;

/// Scores strictly above (below) this are up (down)
pub const PRIMARY_DIRECTION_THRESHOLD: f64 = 0.0;

/// Dead-band used only for the narrative sentence in reports
pub const NARRATIVE_DEAD_BAND: f64 = 0.05;

/// Sentiment at or beyond this magnitude drives BUY / AVOID
const SENTIMENT_CUTOFF: f64 = 0.2;
/// Minimum confidence for a BUY
const BUY_MIN_CONFIDENCE: f64 = 60.0;
/// Below this confidence every call is AVOID
const AVOID_MAX_CONFIDENCE: f64 = 30.0;

/// Zero-crossing direction of a weighted score
pub fn classify(score: f64) -> Direction {
    if score > PRIMARY_DIRECTION_THRESHOLD {
        Direction::Up
    } else if score < -PRIMARY_DIRECTION_THRESHOLD {
        Direction::Down
    } else {
        Direction::Neutral
    }
}

/// Direction with a small neutral band, for report prose
pub fn narrative(score: f64) -> Direction {
    if score > NARRATIVE_DEAD_BAND {
        Direction::Up
    } else if score < -NARRATIVE_DEAD_BAND {
        Direction::Down
    } else {
        Direction::Neutral
    }
}

/// Recommendation and expected holding period
///
/// AVOID is checked first: strongly negative sentiment or weak confidence
/// overrides everything else.
pub fn recommendation_and_turnover(
    sentiment: f64,
    confidence_value: f64,
    confidence_label: &str,
) -> (Recommendation, String) {
    let recommendation =
        if sentiment <= -SENTIMENT_CUTOFF || confidence_value < AVOID_MAX_CONFIDENCE {
            Recommendation::Avoid
        } else if sentiment >= SENTIMENT_CUTOFF && confidence_value >= BUY_MIN_CONFIDENCE {
            Recommendation::Buy
        } else {
            Recommendation::Hold
        };

    let turnover = match confidence_label.to_lowercase().as_str() {
        "high" => "2-3 days",
        "medium" => "4-7 days",
        "low" => "7-10 days",
        _ => "Indeterminate",
    };

    (recommendation, turnover.to_string())
}

/// Stable sort into BUY, HOLD, AVOID order
pub fn sort_for_presentation(records: &mut [PredictionRecord]) {
    records.sort_by_key(|r| r.recommendation.rank());
}

/// Build a prediction from scored insights
///
/// `insights` are expected in relevance order; their titles become the record's
/// headlines. A degraded prediction has no evidence and scores 0.0.
pub fn predict(
    symbol: &str,
    company: &str,
    date: NaiveDate,
    insights: &[SentimentInsight],
    degraded: bool,
) -> PredictionRecord {
    let score = scorer::weighted_score(insights);
    let confidence = scorer::confidence(insights);
    let (recommendation, turnover) =
        recommendation_and_turnover(score, confidence.value, confidence.label.as_str());

    PredictionRecord {
        symbol: symbol.to_uppercase(),
        date,
        company: company.to_string(),
        score,
        direction: classify(score),
        confidence,
        recommendation,
        turnover,
        headlines: insights.iter().map(|i| i.title.clone()).collect(),
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_core::{Confidence, ConfidenceLabel};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 30).unwrap()
    }

    fn record(symbol: &str, recommendation: Recommendation) -> PredictionRecord {
        PredictionRecord {
            symbol: symbol.to_string(),
            date: day(),
            company: String::new(),
            score: 0.0,
            direction: Direction::Neutral,
            confidence: Confidence::none(),
            recommendation,
            turnover: "7-10 days".to_string(),
            headlines: vec![],
            degraded: false,
        }
    }

    #[test]
    fn test_classify_zero_crossing() {
        assert_eq!(classify(0.01), Direction::Up);
        assert_eq!(classify(-0.01), Direction::Down);
        assert_eq!(classify(0.0), Direction::Neutral);
    }

    #[test]
    fn test_narrative_dead_band() {
        assert_eq!(narrative(0.04), Direction::Neutral);
        assert_eq!(narrative(-0.05), Direction::Neutral);
        assert_eq!(narrative(0.06), Direction::Up);
        assert_eq!(narrative(-0.2), Direction::Down);
    }

    #[test]
    fn test_recommendation_and_turnover() {
        assert_eq!(
            recommendation_and_turnover(0.3, 70.0, "High"),
            (Recommendation::Buy, "2-3 days".to_string())
        );
        assert_eq!(
            recommendation_and_turnover(-0.3, 50.0, "Low"),
            (Recommendation::Avoid, "7-10 days".to_string())
        );
        assert_eq!(
            recommendation_and_turnover(0.0, 40.0, "Medium"),
            (Recommendation::Hold, "4-7 days".to_string())
        );
    }

    #[test]
    fn test_recommendation_edges() {
        // weak confidence overrides positive sentiment
        assert_eq!(recommendation_and_turnover(0.9, 29.9, "low").0, Recommendation::Avoid);
        assert_eq!(recommendation_and_turnover(0.2, 60.0, "medium").0, Recommendation::Buy);
        assert_eq!(recommendation_and_turnover(-0.2, 90.0, "HIGH").0, Recommendation::Avoid);
        assert_eq!(recommendation_and_turnover(0.5, 59.0, "Medium").0, Recommendation::Hold);
        assert_eq!(recommendation_and_turnover(0.5, 59.0, "unsure").1, "Indeterminate");
    }

    #[test]
    fn test_sort_for_presentation_is_stable() {
        let mut records = vec![
            record("A", Recommendation::Avoid),
            record("B", Recommendation::Hold),
            record("C", Recommendation::Buy),
            record("D", Recommendation::Hold),
        ];
        sort_for_presentation(&mut records);
        let order: Vec<_> = records.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "D", "A"]);
    }

    #[test]
    fn test_predict_without_evidence_is_avoid() {
        let record = predict("abc", "Abc Corp", day(), &[], true);
        assert_eq!(record.symbol, "ABC");
        assert_eq!(record.score, 0.0);
        assert_eq!(record.direction, Direction::Neutral);
        assert_eq!(record.confidence.label, ConfidenceLabel::Low);
        assert_eq!(record.recommendation, Recommendation::Avoid);
        assert_eq!(record.turnover, "7-10 days");
        assert!(record.degraded);
    }

    #[test]
    fn test_predict_positive_evidence() {
        let insights: Vec<SentimentInsight> = (0..5)
            .map(|i| SentimentInsight {
                title: format!("Apple headline {i}"),
                sentiment: 0.6,
                relevance_score: 1.0,
                keyword: "Apple".to_string(),
                published_at: None,
                rationale: None,
            })
            .collect();

        let record = predict("AAPL", "Apple", day(), &insights, false);
        assert!((record.score - 0.6).abs() < 1e-9);
        assert_eq!(record.direction, Direction::Up);
        // 40 + 24 + 20
        assert!((record.confidence.value - 84.0).abs() < 1e-9);
        assert_eq!(record.recommendation, Recommendation::Buy);
        assert_eq!(record.turnover, "2-3 days");
        assert_eq!(record.headlines.len(), 5);
        assert_eq!(record.headlines[0], "Apple headline 0");
    }
}
