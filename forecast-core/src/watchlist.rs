//! Watchlist entries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A tracked ticker symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub symbol: String,
    /// Extra relevance keywords; replaces the built-in list for this symbol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Company display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Headline that caused the symbol to be discovered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_at: Option<NaiveDate>,
}

impl WatchlistEntry {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            keywords: None,
            company: None,
            discovery_reason: None,
            discovered_at: None,
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }
}
