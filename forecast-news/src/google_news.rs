//! Google News RSS client
//!
//! Keyless headline search through the Google News RSS endpoint. Used when no
//! NewsAPI key is configured, or as an explicit `NEWS_PROVIDER=google` choice.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

use forecast_core::{ForecastResult, NewsArticle, NewsSource};

use crate::error::NewsError;
use crate::types::parse_timestamp;

const GOOGLE_NEWS_SEARCH_URL: &str = "https://news.google.com/rss/search";

/// Google News RSS client
pub struct GoogleNewsClient {
    client: Client,
    base_url: String,
}

impl GoogleNewsClient {
    /// Create a new Google News client
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .user_agent("Mozilla/5.0 (compatible; StockForecaster/1.0)")
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: GOOGLE_NEWS_SEARCH_URL.to_string(),
        }
    }

    /// Search Google News for a query
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<NewsArticle>, NewsError> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[("q", query), ("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")],
        )
        .map_err(|e| NewsError::InvalidConfig(format!("Invalid Google News URL: {}", e)))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NewsError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NewsError::ApiError {
                status: response.status().as_u16(),
                message: format!("Google News returned status {}", response.status()),
            });
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| NewsError::RequestFailed(e.to_string()))?;

        let channel = rss::Channel::read_from(&content[..]).map_err(|e| {
            NewsError::ParseError(format!("Failed to parse Google News RSS: {}", e))
        })?;

        let mut items = parse_channel(&channel);
        info!("Google News returned {} items for '{}'", items.len(), query);

        items.truncate(limit);
        Ok(items)
    }
}

impl Default for GoogleNewsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsSource for GoogleNewsClient {
    async fn fetch(&self, query: &str, limit: usize) -> ForecastResult<Vec<NewsArticle>> {
        Ok(self.search(query, limit).await?)
    }

    fn name(&self) -> &str {
        "Google News"
    }
}

fn parse_channel(channel: &rss::Channel) -> Vec<NewsArticle> {
    channel
        .items()
        .iter()
        .filter_map(|item| {
            let raw_title = item.title()?;
            let (title, source) = split_source_suffix(raw_title);
            if title.is_empty() {
                return None;
            }

            // Google News carries the outlet in <source>; the title suffix is the fallback
            let source_name = item
                .source()
                .and_then(|s| s.title())
                .map(str::to_string)
                .or(source);

            Some(NewsArticle {
                title,
                published_at: item.pub_date().and_then(parse_timestamp),
                source_name,
                url: item.link().map(str::to_string),
            })
        })
        .collect()
}

/// Google News titles look like "Headline text - Outlet"
fn split_source_suffix(title: &str) -> (String, Option<String>) {
    match title.rfind(" - ") {
        Some(pos) => (
            title[..pos].trim().to_string(),
            Some(title[pos + 3..].trim().to_string()),
        ),
        None => (title.trim().to_string(), None),
    }
}
