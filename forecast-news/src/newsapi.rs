//! NewsAPI client for headline search

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument};
use url::Url;

use forecast_core::{ForecastResult, NewsArticle, NewsSource};

use crate::error::NewsError;
use crate::types::{parse_timestamp, NewsApiArticle, NewsApiResponse};

/// Base URL for the NewsAPI "everything" endpoint
const NEWS_API_URL: &str = "https://newsapi.org/v2/everything";

/// NewsAPI caps `pageSize` at 100
const MAX_PAGE_SIZE: usize = 100;

/// Placeholder title NewsAPI uses for articles pulled by the publisher
const REMOVED_TITLE: &str = "[Removed]";

/// NewsAPI client
#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NewsApiClient {
    /// Create a new NewsAPI client
    pub fn new(api_key: impl Into<String>) -> Result<Self, NewsError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(NewsError::InvalidConfig("NEWS_API_KEY not set".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NewsError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: NEWS_API_URL.to_string(),
        })
    }

    /// Create a client from the `NEWS_API_KEY` environment variable
    pub fn from_env() -> Result<Self, NewsError> {
        let key = std::env::var("NEWS_API_KEY")
            .map_err(|_| NewsError::InvalidConfig("NEWS_API_KEY not set".to_string()))?;
        Self::new(key)
    }

    /// Point the client at a different endpoint (for proxies and tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search English-language articles for a query
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, page_size: usize) -> Result<Vec<NewsArticle>, NewsError> {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("q", query),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ],
        )
        .map_err(|e| NewsError::InvalidConfig(format!("Invalid NewsAPI URL: {}", e)))?;

        debug!("Fetching NewsAPI headlines: query='{}'", query);

        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| NewsError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(NewsError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NewsError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let payload: NewsApiResponse = response
            .json()
            .await
            .map_err(|e| NewsError::ParseError(e.to_string()))?;

        let articles = articles_from_response(payload)?;
        info!("NewsAPI returned {} articles for '{}'", articles.len(), query);
        Ok(articles)
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn fetch(&self, query: &str, limit: usize) -> ForecastResult<Vec<NewsArticle>> {
        Ok(self.search(query, limit).await?)
    }

    fn name(&self) -> &str {
        "NewsAPI"
    }
}

/// Convert a NewsAPI payload, dropping untitled and removed articles
fn articles_from_response(payload: NewsApiResponse) -> Result<Vec<NewsArticle>, NewsError> {
    if payload.status != "ok" {
        let code = payload.code.unwrap_or_else(|| "unknown".to_string());
        if code == "rateLimited" {
            return Err(NewsError::RateLimited);
        }
        return Err(NewsError::ApiError {
            status: 200,
            message: format!(
                "{}: {}",
                code,
                payload.message.unwrap_or_default()
            ),
        });
    }

    Ok(payload
        .articles
        .into_iter()
        .filter_map(convert_article)
        .collect())
}

fn convert_article(article: NewsApiArticle) -> Option<NewsArticle> {
    let title = article.title?.trim().to_string();
    if title.is_empty() || title == REMOVED_TITLE {
        return None;
    }

    Some(NewsArticle {
        title,
        published_at: article.published_at.as_deref().and_then(parse_timestamp),
        source_name: article.source.and_then(|s| s.name),
        url: article.url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_rejected() {
        assert!(matches!(
            NewsApiClient::new("  "),
            Err(NewsError::InvalidConfig(_))
        ));
        assert!(NewsApiClient::new("abc123").is_ok());
    }

    #[test]
    fn test_articles_from_response() {
        let json = r#"{
            "status": "ok",
            "totalResults": 3,
            "articles": [
                {"source": {"id": null, "name": "Reuters"}, "title": "Apple unveils new iPhone",
                 "url": "https://example.com/a", "publishedAt": "2025-07-30T12:00:00Z"},
                {"source": {"id": null, "name": "[Removed]"}, "title": "[Removed]",
                 "url": "https://removed.com", "publishedAt": "1970-01-01T00:00:00Z"},
                {"source": null, "title": "Chip stocks slide", "publishedAt": "not a date"}
            ]
        }"#;
        let payload: NewsApiResponse = serde_json::from_str(json).unwrap();
        let articles = articles_from_response(payload).unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Apple unveils new iPhone");
        assert_eq!(articles[0].source_name.as_deref(), Some("Reuters"));
        assert!(articles[0].published_at.is_some());
        assert_eq!(articles[1].title, "Chip stocks slide");
        assert!(articles[1].published_at.is_none());
    }

    #[test]
    fn test_error_payload() {
        let json = r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."}"#;
        let payload: NewsApiResponse = serde_json::from_str(json).unwrap();
        match articles_from_response(payload) {
            Err(NewsError::ApiError { message, .. }) => assert!(message.contains("apiKeyInvalid")),
            other => panic!("expected ApiError, got {:?}", other.map(|a| a.len())),
        }

        let limited: NewsApiResponse =
            serde_json::from_str(r#"{"status": "error", "code": "rateLimited"}"#).unwrap();
        assert!(matches!(articles_from_response(limited), Err(NewsError::RateLimited)));
    }
}
