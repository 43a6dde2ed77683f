//! Headline relevance matching
//!
//! Scores how strongly a headline refers to a ticker symbol by comparing it to
//! the symbol and its company keywords. An exact (case-insensitive) substring
//! hit scores 1.0; otherwise the best fuzzy similarity ratio is used.

use std::collections::HashMap;

use forecast_core::{MatchedHeadline, NewsArticle};
use tracing::debug;

use crate::similarity::sequence_ratio;

/// Default minimum relevance for a headline to count toward a symbol
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.3;

/// Built-in relevance keywords; the first keyword is the company name
pub const DEFAULT_KEYWORDS: &[(&str, &[&str])] = &[
    ("AAPL", &["Apple", "iPhone", "iPad", "Mac", "MacBook", "AirPods"]),
    ("MSFT", &["Microsoft", "Windows", "Azure", "Xbox", "Surface"]),
    ("GOOGL", &["Google", "Alphabet", "Android", "YouTube"]),
    ("AMZN", &["Amazon", "AWS", "Prime", "Kindle"]),
    ("TSLA", &["Tesla", "Elon Musk", "Model", "Cybertruck"]),
    ("NVDA", &["Nvidia", "GPU", "GeForce", "RTX"]),
    ("META", &["Meta", "Facebook", "Instagram", "WhatsApp"]),
    ("NFLX", &["Netflix", "streaming", "Stranger Things"]),
    ("JPM", &["JPMorgan", "Chase", "banking"]),
    ("IBM", &["IBM", "Big Blue", "Watson"]),
];

/// Built-in keyword map keyed by upper-case symbol
pub fn default_keyword_map() -> HashMap<String, Vec<String>> {
    DEFAULT_KEYWORDS
        .iter()
        .map(|(symbol, keywords)| {
            (
                symbol.to_string(),
                keywords.iter().map(|k| k.to_string()).collect(),
            )
        })
        .collect()
}

/// Company display name from the built-in map
pub fn default_company(symbol: &str) -> Option<&'static str> {
    let symbol = symbol.to_uppercase();
    DEFAULT_KEYWORDS
        .iter()
        .find(|(s, _)| *s == symbol)
        .and_then(|(_, keywords)| keywords.first().copied())
}

/// Matches headlines to symbols by keyword similarity
#[derive(Debug, Clone)]
pub struct RelevanceMatcher {
    keyword_map: HashMap<String, Vec<String>>,
}

impl Default for RelevanceMatcher {
    fn default() -> Self {
        Self::new(default_keyword_map())
    }
}

impl RelevanceMatcher {
    /// Create a matcher over a keyword map keyed by symbol
    pub fn new(keyword_map: HashMap<String, Vec<String>>) -> Self {
        let keyword_map = keyword_map
            .into_iter()
            .map(|(symbol, keywords)| (symbol.to_uppercase(), keywords))
            .collect();
        Self { keyword_map }
    }

    /// Candidate terms for a symbol: the symbol itself, then its keywords
    fn candidates(&self, symbol: &str) -> Vec<String> {
        let symbol = symbol.to_uppercase();
        let mut candidates = vec![symbol.clone()];
        if let Some(keywords) = self.keyword_map.get(&symbol) {
            candidates.extend(keywords.iter().cloned());
        }
        candidates
    }

    /// Best relevance of `headline` to `symbol`, with the keyword that produced it
    ///
    /// Ties keep the earliest candidate; no candidate above zero yields `(0.0, "")`.
    pub fn score(&self, headline: &str, symbol: &str) -> (f64, String) {
        let headline_lower = headline.to_lowercase();
        let mut best = (0.0, String::new());

        for candidate in self.candidates(symbol) {
            let candidate_lower = candidate.to_lowercase();
            let score = if headline_lower.contains(&candidate_lower) {
                1.0
            } else {
                sequence_ratio(&candidate_lower, &headline_lower)
            };
            if score > best.0 {
                best = (score, candidate);
            }
        }

        best
    }

    /// Headlines scoring at least `threshold` for `symbol`, most relevant first
    pub fn match_headlines(
        &self,
        articles: &[NewsArticle],
        symbol: &str,
        threshold: f64,
    ) -> Vec<MatchedHeadline> {
        let mut matched: Vec<MatchedHeadline> = articles
            .iter()
            .filter_map(|article| {
                let (relevance_score, keyword) = self.score(&article.title, symbol);
                (relevance_score >= threshold).then(|| MatchedHeadline {
                    title: article.title.clone(),
                    relevance_score,
                    keyword,
                    published_at: article.published_at,
                })
            })
            .collect();

        // Stable, so equal scores keep source order
        matched.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        debug!(
            "{}: {} of {} headlines above relevance {}",
            symbol,
            matched.len(),
            articles.len(),
            threshold
        );
        matched
    }
}
