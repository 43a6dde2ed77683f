//! Watchlist storage
//!
//! The watchlist is a pretty-printed JSON array of [`WatchlistEntry`].

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use forecast_core::{ForecastError, ForecastResult, WatchlistEntry};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::relevance::{default_company, default_keyword_map};

/// File-backed watchlist
#[derive(Debug, Clone)]
pub struct WatchlistStore {
    path: PathBuf,
}

impl WatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries; a missing or unreadable file is an empty watchlist
    ///
    /// Entries that do not parse are skipped with a warning.
    pub fn load(&self) -> Vec<WatchlistEntry> {
        let values = match self.read_values() {
            Ok(values) => values,
            Err(e) => {
                warn!("Ignoring watchlist {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping watchlist entry {}: {}", index, e);
                    None
                }
            })
            .collect()
    }

    /// Upper-case symbol of every listed entry, including ones [`load`](Self::load) skips
    ///
    /// Fails when the file exists but is not a JSON array.
    pub fn listed_symbols(&self) -> ForecastResult<HashSet<String>> {
        Ok(self
            .read_values()?
            .iter()
            .filter_map(|value| value.get("symbol").and_then(Value::as_str))
            .map(str::to_uppercase)
            .collect())
    }

    /// Append entries, keeping every existing entry as written
    ///
    /// Refuses to touch a file that is not a JSON array.
    pub fn add_entries(&self, entries: &[WatchlistEntry]) -> ForecastResult<()> {
        let mut values = self.read_values()?;
        for entry in entries {
            values.push(serde_json::to_value(entry)?);
        }
        self.write_json(&values)
    }

    fn read_values(&self) -> ForecastResult<Vec<Value>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No watchlist at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(ForecastError::io(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&contents).map_err(|e| {
            ForecastError::parse(format!(
                "Watchlist {} is not a JSON array: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Replace the watchlist file
    pub fn save(&self, entries: &[WatchlistEntry]) -> ForecastResult<()> {
        self.write_json(entries)
    }

    fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> ForecastResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(value)?;
        fs::write(&self.path, json).map_err(|e| {
            ForecastError::io(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }

    /// Upper-case symbols in watchlist order
    pub fn symbols(&self) -> Vec<String> {
        self.load()
            .into_iter()
            .map(|entry| entry.symbol.to_uppercase())
            .collect()
    }
}

/// Keyword map for a set of entries
///
/// Discovered symbols without keywords or a built-in list match on their company name.
pub fn keyword_map_for(entries: &[WatchlistEntry]) -> HashMap<String, Vec<String>> {
    let mut map = default_keyword_map();
    for entry in entries {
        let symbol = entry.symbol.to_uppercase();
        match (&entry.keywords, &entry.company) {
            (Some(keywords), _) => {
                map.insert(symbol, keywords.clone());
            }
            (None, Some(company)) => {
                map.entry(symbol).or_insert_with(|| vec![company.clone()]);
            }
            (None, None) => {}
        }
    }
    map
}

/// Company name for `symbol` among `entries`
pub fn company_for(entries: &[WatchlistEntry], symbol: &str) -> String {
    entries
        .iter()
        .find(|entry| entry.symbol.eq_ignore_ascii_case(symbol))
        .and_then(|entry| entry.company.clone())
        .or_else(|| default_company(symbol).map(str::to_string))
        .unwrap_or_else(|| symbol.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Vec<WatchlistEntry> {
        let mut discovered = WatchlistEntry::new("AVGO").with_company("Broadcom");
        discovered.discovery_reason = Some("Broadcom rallies on AI demand".to_string());
        discovered.discovered_at = NaiveDate::from_ymd_opt(2025, 7, 30);

        vec![
            WatchlistEntry::new("AAPL"),
            WatchlistEntry::new("MSFT").with_keywords(vec!["Copilot".to_string()]),
            discovered,
        ]
    }

    #[test]
    fn test_round_trip_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path().join("watchlist.json"));

        store.save(&sample()).unwrap();
        let first = fs::read_to_string(store.path()).unwrap();
        assert_eq!(store.load(), sample());

        store.save(&store.load()).unwrap();
        let second = fs::read_to_string(store.path()).unwrap();
        assert_eq!(first, second);
        assert!(!first.contains("null"));
    }

    #[test]
    fn test_missing_and_corrupt_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path().join("watchlist.json"));
        assert!(store.load().is_empty());

        fs::write(store.path(), "{ not a list").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path().join("watchlist.json"));
        fs::write(
            store.path(),
            r#"[{"symbol":"AAPL"},{"symbol":"MSFT"},{"symbol":"TSLA","keywords":"Tesla"},42]"#,
        )
        .unwrap();

        assert_eq!(store.symbols(), vec!["AAPL", "MSFT"]);
        let listed = store.listed_symbols().unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.contains("TSLA"));
    }

    #[test]
    fn test_add_entries_keeps_unparsable_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path().join("watchlist.json"));
        fs::write(
            store.path(),
            r#"[{"symbol":"AAPL"},{"symbol":"TSLA","keywords":"Tesla"}]"#,
        )
        .unwrap();

        store
            .add_entries(&[WatchlistEntry::new("AVGO").with_company("Broadcom")])
            .unwrap();

        let raw: Vec<Value> = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[1]["keywords"], "Tesla");
        assert_eq!(store.symbols(), vec!["AAPL", "AVGO"]);
    }

    #[test]
    fn test_add_entries_refuses_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path().join("watchlist.json"));
        fs::write(store.path(), "{ not a list").unwrap();

        assert!(store.listed_symbols().is_err());
        assert!(store.add_entries(&[WatchlistEntry::new("AVGO")]).is_err());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ not a list");
    }

    #[test]
    fn test_reads_sparse_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path().join("watchlist.json"));
        fs::write(
            store.path(),
            r#"[{"symbol": "aapl"}, {"symbol": "SPOT", "discovery_reason": "Spotify adds audiobooks"}]"#,
        )
        .unwrap();

        assert_eq!(store.symbols(), vec!["AAPL", "SPOT"]);
    }

    #[test]
    fn test_keyword_map_overrides_defaults() {
        let entries = sample();
        let map = keyword_map_for(&entries);
        assert_eq!(map["MSFT"], vec!["Copilot".to_string()]);
        assert_eq!(map["AAPL"][0], "Apple");
        assert_eq!(map["AVGO"], vec!["Broadcom".to_string()]);
        assert!(!map.contains_key("SPOT"));
    }

    #[test]
    fn test_company_for() {
        let entries = sample();
        assert_eq!(company_for(&entries, "avgo"), "Broadcom");
        assert_eq!(company_for(&entries, "AAPL"), "Apple");
        assert_eq!(company_for(&entries, "ZZZ"), "ZZZ");
    }
}
