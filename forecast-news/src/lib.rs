//! News headline sources for the forecaster
//!
//! This crate provides `NewsSource` implementations for:
//! - NewsAPI: keyed full-text search across outlets (primary)
//! - Google News RSS: keyless search (fallback)

pub mod error;
pub mod google_news;
pub mod newsapi;
pub mod types;

pub use error::NewsError;
pub use google_news::GoogleNewsClient;
pub use newsapi::NewsApiClient;
pub use types::parse_timestamp;
