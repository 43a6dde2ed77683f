//! Headline data structures flowing through the scoring pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news article as returned by a news source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Article headline
    pub title: String,
    /// Publication date, when the source provides a parsable one
    #[serde(rename = "publishedAt", default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Name of the publishing outlet (e.g., "Reuters")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    /// Article URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NewsArticle {
    /// Create an article with only a title and optional timestamp
    pub fn new(title: impl Into<String>, published_at: Option<DateTime<Utc>>) -> Self {
        Self {
            title: title.into(),
            published_at,
            source_name: None,
            url: None,
        }
    }
}

/// A headline that passed the relevance threshold for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedHeadline {
    pub title: String,
    /// Relevance to the symbol (0.0 - 1.0)
    pub relevance_score: f64,
    /// Keyword that produced the best relevance score
    pub keyword: String,
    #[serde(rename = "publishedAt", default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// A matched headline with its sentiment polarity attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentInsight {
    pub title: String,
    /// Polarity (-1.0 bearish to 1.0 bullish)
    pub sentiment: f64,
    pub relevance_score: f64,
    pub keyword: String,
    #[serde(rename = "publishedAt", default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Short explanation from the sentiment oracle, when it gives one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl SentimentInsight {
    /// Attach a sentiment value to a matched headline
    pub fn from_match(matched: &MatchedHeadline, sentiment: f64) -> Self {
        Self {
            title: matched.title.clone(),
            sentiment,
            relevance_score: matched.relevance_score,
            keyword: matched.keyword.clone(),
            published_at: matched.published_at,
            rationale: None,
        }
    }

    pub fn with_rationale(mut self, rationale: Option<String>) -> Self {
        self.rationale = rationale;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_published_at_field_name() {
        let json = r#"{"title":"Apple beats estimates","publishedAt":"2025-07-30T12:00:00Z"}"#;
        let article: NewsArticle = serde_json::from_str(json).unwrap();
        assert_eq!(article.title, "Apple beats estimates");
        assert!(article.published_at.is_some());

        let missing: NewsArticle = serde_json::from_str(r#"{"title":"No date"}"#).unwrap();
        assert!(missing.published_at.is_none());
    }

    #[test]
    fn test_insight_from_match() {
        let matched = MatchedHeadline {
            title: "Alpha launches product".to_string(),
            relevance_score: 0.8,
            keyword: "Alpha".to_string(),
            published_at: None,
        };
        let insight = SentimentInsight::from_match(&matched, -0.25);
        assert_eq!(insight.sentiment, -0.25);
        assert_eq!(insight.relevance_score, 0.8);
        assert_eq!(insight.keyword, "Alpha");
    }
}
