//! Alpha Vantage quote client
//!
//! Supplies the daily closing prices used to judge whether a prediction's
//! direction came true.

pub mod client;
pub mod rate_limiter;
pub mod types;

pub use client::AlphaVantageClient;
pub use rate_limiter::RateLimiter;
pub use types::{DailyBar, DailySeriesResponse};
