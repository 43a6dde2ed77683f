//! Alpha Vantage API client
//!
//! Provides daily closing prices for the accuracy evaluator.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use forecast_core::{ForecastError, ForecastResult, PriceQuoteSource};

use crate::rate_limiter::RateLimiter;
use crate::types::DailySeriesResponse;

/// Base URL for Alpha Vantage
const ALPHA_VANTAGE_API_BASE: &str = "https://www.alphavantage.co/query";

type CloseSeries = Arc<BTreeMap<NaiveDate, String>>;

/// Alpha Vantage API client
///
/// Each symbol's daily series is fetched once per client and reused, so
/// looking up the reference day and the following day costs one request.
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
    limiter: RateLimiter,
    series_cache: Mutex<HashMap<String, CloseSeries>>,
}

impl AlphaVantageClient {
    /// Create a new client with free-tier request spacing
    pub fn new(api_key: impl Into<String>) -> ForecastResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ForecastError::config("STOCK_API_KEY not set"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ForecastError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: ALPHA_VANTAGE_API_BASE.to_string(),
            api_key,
            limiter: RateLimiter::for_alpha_vantage(),
            series_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Create a client from the `STOCK_API_KEY` environment variable
    pub fn from_env() -> ForecastResult<Self> {
        let key = std::env::var("STOCK_API_KEY")
            .map_err(|_| ForecastError::config("STOCK_API_KEY not set"))?;
        Self::new(key)
    }

    /// Daily closes for a symbol (roughly the last 100 trading days)
    #[instrument(skip(self))]
    pub async fn daily_closes(&self, symbol: &str) -> ForecastResult<CloseSeries> {
        let symbol = symbol.to_uppercase();
        let cached = self.series_cache.lock().get(&symbol).cloned();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        self.limiter.acquire().await;

        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol.as_str()),
                ("outputsize", "compact"),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| ForecastError::config(format!("Invalid Alpha Vantage URL: {}", e)))?;

        debug!("Fetching daily series for {}", symbol);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ForecastError::network(format!("Failed to fetch quotes: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ForecastError::api(format!(
                "Alpha Vantage API error ({}): {}",
                status, body
            )));
        }

        let payload: DailySeriesResponse = response
            .json()
            .await
            .map_err(|e| ForecastError::parse(format!("Failed to parse daily series: {}", e)))?;

        let closes = Arc::new(series_from_response(&symbol, payload)?);
        self.series_cache
            .lock()
            .insert(symbol, Arc::clone(&closes));
        Ok(closes)
    }
}

#[async_trait]
impl PriceQuoteSource for AlphaVantageClient {
    async fn closing_price(&self, symbol: &str, date: NaiveDate) -> ForecastResult<Option<String>> {
        let closes = self.daily_closes(symbol).await?;
        Ok(closes.get(&date).cloned())
    }
}

/// Turn a payload into a close series, surfacing the in-band error messages
fn series_from_response(
    symbol: &str,
    payload: DailySeriesResponse,
) -> ForecastResult<BTreeMap<NaiveDate, String>> {
    if let Some(message) = payload.error_message {
        return Err(ForecastError::api(format!("{}: {}", symbol, message)));
    }
    if payload.series.is_empty() {
        if let Some(notice) = payload.note.clone().or(payload.information.clone()) {
            warn!("Alpha Vantage throttled request for {}: {}", symbol, notice);
            return Err(ForecastError::rate_limited(notice));
        }
    }
    Ok(payload.closes())
}
