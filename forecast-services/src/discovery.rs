//! Stock discovery
//!
//! Scans general market headlines for well-known company names and adds
//! their symbols to the watchlist.

use std::sync::Arc;

use chrono::NaiveDate;
use forecast_core::{ForecastResult, NewsSource, WatchlistEntry};
use tracing::{info, instrument, warn};

use crate::watchlist::WatchlistStore;

/// Default discovery query
pub const DEFAULT_DISCOVERY_QUERY: &str = "stock market";

/// Headlines scanned per discovery run
pub const DISCOVERY_PAGE_SIZE: usize = 20;

/// Company names recognised in headlines, checked in this order
pub const DISCOVERABLE_COMPANIES: &[(&str, &str)] = &[
    ("Broadcom", "AVGO"),
    ("Adobe", "ADBE"),
    ("Qualcomm", "QCOM"),
    ("Samsung", "SSNLF"),
    ("Spotify", "SPOT"),
    ("Intel", "INTC"),
];

/// Finds new watchlist symbols in the news
pub struct StockDiscovery {
    news: Arc<dyn NewsSource>,
    watchlist: WatchlistStore,
}

impl StockDiscovery {
    pub fn new(news: Arc<dyn NewsSource>, watchlist: WatchlistStore) -> Self {
        Self { news, watchlist }
    }

    /// Add symbols mentioned in headlines for `query`; returns the added symbols
    ///
    /// Each headline adds at most one symbol and symbols already on the
    /// watchlist are never re-added. The file is only rewritten when something
    /// was added. A failed news fetch adds nothing.
    #[instrument(skip(self))]
    pub async fn learn(&self, query: &str, today: NaiveDate) -> ForecastResult<Vec<String>> {
        let mut known = self.watchlist.listed_symbols()?;

        let articles = match self.news.fetch(query, DISCOVERY_PAGE_SIZE).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!("{} discovery fetch failed: {}", self.news.name(), e);
                Vec::new()
            }
        };

        let mut discovered = Vec::new();
        for article in &articles {
            let title = article.title.to_lowercase();
            let found = DISCOVERABLE_COMPANIES.iter().find(|(name, symbol)| {
                !known.contains(*symbol) && title.contains(&name.to_lowercase())
            });

            if let Some((name, symbol)) = found {
                let mut entry = WatchlistEntry::new(*symbol).with_company(*name);
                entry.discovery_reason = Some(article.title.clone());
                entry.discovered_at = Some(today);
                discovered.push(entry);
                known.insert(symbol.to_string());
            }
        }

        let added: Vec<String> = discovered.iter().map(|e| e.symbol.clone()).collect();
        if added.is_empty() {
            info!("No new stocks discovered in {} headlines", articles.len());
        } else {
            self.watchlist.add_entries(&discovered)?;
            info!("Added new stocks: {}", added.join(", "));
        }
        Ok(added)
    }
}
