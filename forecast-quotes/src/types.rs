//! Alpha Vantage API response types

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

/// `TIME_SERIES_DAILY` response
///
/// Alpha Vantage answers throttled or invalid requests with HTTP 200 and one of
/// the message fields instead of a series.
#[derive(Debug, Deserialize)]
pub struct DailySeriesResponse {
    #[serde(rename = "Time Series (Daily)", default)]
    pub series: BTreeMap<String, DailyBar>,
    /// Rate limit notice (older API versions)
    #[serde(rename = "Note")]
    pub note: Option<String>,
    /// Rate limit or premium-endpoint notice
    #[serde(rename = "Information")]
    pub information: Option<String>,
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
}

/// One trading day of OHLCV data; prices are decimal strings
#[derive(Debug, Clone, Deserialize)]
pub struct DailyBar {
    #[serde(rename = "1. open")]
    pub open: Option<String>,
    #[serde(rename = "2. high")]
    pub high: Option<String>,
    #[serde(rename = "3. low")]
    pub low: Option<String>,
    #[serde(rename = "4. close")]
    pub close: Option<String>,
    #[serde(rename = "5. volume")]
    pub volume: Option<String>,
}

impl DailySeriesResponse {
    /// Closing prices keyed by trading day; rows with bad dates are skipped
    pub fn closes(&self) -> BTreeMap<NaiveDate, String> {
        self.series
            .iter()
            .filter_map(|(day, bar)| {
                let date = match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
                    Ok(date) => date,
                    Err(_) => {
                        debug!("Skipping series row with bad date: {}", day);
                        return None;
                    }
                };
                bar.close.clone().map(|close| (date, close))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closes_from_series() {
        let json = r#"{
            "Meta Data": {"2. Symbol": "ABC"},
            "Time Series (Daily)": {
                "2025-07-31": {"1. open": "100.5", "4. close": "101"},
                "2025-07-30": {"4. close": "100"},
                "bogus": {"4. close": "1"}
            }
        }"#;
        let response: DailySeriesResponse = serde_json::from_str(json).unwrap();
        let closes = response.closes();
        assert_eq!(closes.len(), 2);
        assert_eq!(
            closes.get(&NaiveDate::from_ymd_opt(2025, 7, 31).unwrap()).map(String::as_str),
            Some("101")
        );
    }

    #[test]
    fn test_rate_limit_payload() {
        let json = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"}"#;
        let response: DailySeriesResponse = serde_json::from_str(json).unwrap();
        assert!(response.note.is_some());
        assert!(response.series.is_empty());
    }
}
