//! API-specific types for NewsAPI

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

/// NewsAPI `/v2/everything` response
#[derive(Debug, Deserialize)]
pub struct NewsApiResponse {
    /// "ok" or "error"
    pub status: String,
    #[serde(rename = "totalResults", default)]
    pub total_results: usize,
    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
    /// Error code when status is "error"
    pub code: Option<String>,
    /// Error message when status is "error"
    pub message: Option<String>,
}

/// A single NewsAPI article
#[derive(Debug, Deserialize)]
pub struct NewsApiArticle {
    pub source: Option<NewsApiSource>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    /// ISO 8601 publication timestamp
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
}

/// Outlet information attached to a NewsAPI article
#[derive(Debug, Deserialize)]
pub struct NewsApiSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Parse the timestamp formats news providers actually send
///
/// Accepts RFC 3339, RFC 2822, naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC), and
/// bare dates (midnight UTC). Anything else is `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| DateTime::parse_from_rfc2822(raw).map(|dt| dt.with_timezone(&Utc)))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc3339 = parse_timestamp("2025-07-30T14:05:00Z").unwrap();
        assert_eq!(rfc3339.hour(), 14);

        let rfc2822 = parse_timestamp("Wed, 30 Jul 2025 14:05:00 GMT").unwrap();
        assert_eq!(rfc2822, rfc3339);

        let naive = parse_timestamp("2025-07-30T14:05:00.123456").unwrap();
        assert_eq!(naive.minute(), 5);

        let bare = parse_timestamp("2025-07-30").unwrap();
        assert_eq!(bare.day(), 30);
        assert_eq!(bare.hour(), 0);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday-ish").is_none());
    }
}
