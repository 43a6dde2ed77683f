//! Runtime configuration
//!
//! Read from the process environment (after `.env.local` has been loaded by
//! the binary). Unset values use defaults; unparsable numbers fall back to
//! their defaults with a warning.

use std::path::PathBuf;
use std::str::FromStr;

use forecast_core::{ForecastError, ForecastResult};
use tracing::warn;

use crate::calibration::DEFAULT_WINDOW_DAYS;
use crate::history::DEFAULT_HISTORY_LOG_PATH;
use crate::relevance::DEFAULT_RELEVANCE_THRESHOLD;

/// Which news adapter to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsProvider {
    NewsApi,
    GoogleNews,
}

impl FromStr for NewsProvider {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newsapi" => Ok(NewsProvider::NewsApi),
            "google" | "googlenews" | "google_news" => Ok(NewsProvider::GoogleNews),
            other => Err(ForecastError::config(format!(
                "Unknown NEWS_PROVIDER '{}' (expected newsapi or google)",
                other
            ))),
        }
    }
}

/// Which sentiment adapter to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentProvider {
    OpenAi,
    Lexicon,
}

impl FromStr for SentimentProvider {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(SentimentProvider::OpenAi),
            "lexicon" => Ok(SentimentProvider::Lexicon),
            other => Err(ForecastError::config(format!(
                "Unknown SENTIMENT_PROVIDER '{}' (expected openai or lexicon)",
                other
            ))),
        }
    }
}

/// Configuration for the forecasting pipeline
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Directory every relative output path is resolved against
    pub output_root: PathBuf,
    pub watchlist_path: PathBuf,
    /// Accuracy log, relative to the output root
    pub history_log_path: PathBuf,
    pub report_dir: PathBuf,
    pub evaluation_dir: PathBuf,
    /// Minimum headline relevance (0.0 - 1.0)
    pub relevance_threshold: f64,
    pub calibration_window_days: u32,
    /// Headlines requested per symbol
    pub news_page_size: usize,
    /// Symbols processed concurrently
    pub max_concurrency: usize,
    pub news_provider: NewsProvider,
    pub sentiment_provider: SentimentProvider,
    pub openai_model: String,
    /// Commit written files with git
    pub git_commit: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            watchlist_path: PathBuf::from("watchlist.json"),
            history_log_path: PathBuf::from(DEFAULT_HISTORY_LOG_PATH),
            report_dir: PathBuf::from("reports"),
            evaluation_dir: PathBuf::from("evaluations"),
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            calibration_window_days: DEFAULT_WINDOW_DAYS,
            news_page_size: 20,
            max_concurrency: 4,
            news_provider: NewsProvider::NewsApi,
            sentiment_provider: SentimentProvider::Lexicon,
            openai_model: "gpt-4o-mini".to_string(),
            git_commit: true,
        }
    }
}

impl ForecastConfig {
    /// Load from environment variables
    pub fn from_env() -> ForecastResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> ForecastResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let news_provider = match get("NEWS_PROVIDER") {
            Some(value) => value.parse()?,
            None => defaults.news_provider,
        };
        let sentiment_provider = match get("SENTIMENT_PROVIDER") {
            Some(value) => value.parse()?,
            None if get("OPENAI_API_KEY").is_some() => SentimentProvider::OpenAi,
            None => SentimentProvider::Lexicon,
        };

        let relevance_threshold = parse_or(
            "RELEVANCE_THRESHOLD",
            get("RELEVANCE_THRESHOLD"),
            defaults.relevance_threshold,
        );
        if !(0.0..=1.0).contains(&relevance_threshold) {
            return Err(ForecastError::config(format!(
                "RELEVANCE_THRESHOLD must be between 0 and 1, got {}",
                relevance_threshold
            )));
        }

        Ok(Self {
            output_root: get("OUTPUT_ROOT").map(PathBuf::from).unwrap_or(defaults.output_root),
            watchlist_path: get("WATCHLIST_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.watchlist_path),
            history_log_path: get("HISTORY_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.history_log_path),
            report_dir: get("REPORT_DIR").map(PathBuf::from).unwrap_or(defaults.report_dir),
            evaluation_dir: get("EVALUATION_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.evaluation_dir),
            relevance_threshold,
            calibration_window_days: parse_or(
                "CALIBRATION_WINDOW_DAYS",
                get("CALIBRATION_WINDOW_DAYS"),
                defaults.calibration_window_days,
            )
            .max(1),
            news_page_size: parse_or("NEWS_PAGE_SIZE", get("NEWS_PAGE_SIZE"), defaults.news_page_size)
                .max(1),
            max_concurrency: parse_or(
                "MAX_CONCURRENCY",
                get("MAX_CONCURRENCY"),
                defaults.max_concurrency,
            )
            .max(1),
            news_provider,
            sentiment_provider,
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            git_commit: get("GIT_COMMIT")
                .map(|v| parse_flag("GIT_COMMIT", &v, defaults.git_commit))
                .unwrap_or(defaults.git_commit),
        })
    }

    /// Watchlist location resolved against the output root
    pub fn watchlist_file(&self) -> PathBuf {
        self.output_root.join(&self.watchlist_path)
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {}={:?}, using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}

fn parse_flag(key: &str, value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!("Invalid {}={:?}, using default {}", key, value, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ForecastResult<ForecastConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ForecastConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.watchlist_path, PathBuf::from("watchlist.json"));
        assert_eq!(
            cfg.history_log_path,
            PathBuf::from("history/prediction_accuracy_log.jsonl")
        );
        assert_eq!(cfg.relevance_threshold, 0.3);
        assert_eq!(cfg.calibration_window_days, 7);
        assert_eq!(cfg.news_page_size, 20);
        assert_eq!(cfg.max_concurrency, 4);
        assert_eq!(cfg.news_provider, NewsProvider::NewsApi);
        assert_eq!(cfg.sentiment_provider, SentimentProvider::Lexicon);
        assert_eq!(cfg.openai_model, "gpt-4o-mini");
        assert!(cfg.git_commit);
    }

    #[test]
    fn test_openai_key_selects_openai() {
        let cfg = config(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(cfg.sentiment_provider, SentimentProvider::OpenAi);

        let cfg = config(&[("OPENAI_API_KEY", "sk-test"), ("SENTIMENT_PROVIDER", "lexicon")]).unwrap();
        assert_eq!(cfg.sentiment_provider, SentimentProvider::Lexicon);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("OUTPUT_ROOT", "/tmp/out"),
            ("NEWS_PROVIDER", "Google"),
            ("MAX_CONCURRENCY", "0"),
            ("RELEVANCE_THRESHOLD", "0.5"),
            ("GIT_COMMIT", "false"),
        ])
        .unwrap();
        assert_eq!(cfg.news_provider, NewsProvider::GoogleNews);
        assert_eq!(cfg.max_concurrency, 1);
        assert_eq!(cfg.relevance_threshold, 0.5);
        assert!(!cfg.git_commit);
        assert_eq!(cfg.watchlist_file(), PathBuf::from("/tmp/out/watchlist.json"));
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let cfg = config(&[("NEWS_PAGE_SIZE", "lots"), ("CALIBRATION_WINDOW_DAYS", "-3")]).unwrap();
        assert_eq!(cfg.news_page_size, 20);
        assert_eq!(cfg.calibration_window_days, 7);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(matches!(
            config(&[("NEWS_PROVIDER", "bing")]),
            Err(ForecastError::Config(_))
        ));
        assert!(config(&[("RELEVANCE_THRESHOLD", "1.5")]).is_err());
    }
}
