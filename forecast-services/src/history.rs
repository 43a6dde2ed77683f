//! Prediction accuracy log
//!
//! A JSON Lines file with one [`EvaluationRecord`] per line. It is append-only
//! and is the single input to calibration.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use forecast_core::{EvaluationRecord, ForecastError, ForecastResult};
use tracing::debug;

/// Default log location relative to the output root
pub const DEFAULT_HISTORY_LOG_PATH: &str = "history/prediction_accuracy_log.jsonl";

/// Append-only accuracy history
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every parsable record in file order
    ///
    /// A missing file is an empty history. Blank and malformed lines are skipped.
    pub fn read_records(&self) -> ForecastResult<Vec<EvaluationRecord>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ForecastError::io(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (line_no, line) in contents.split(|b| *b == b'\n').enumerate() {
            if line.trim_ascii().is_empty() {
                continue;
            }
            match serde_json::from_slice::<EvaluationRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    debug!("Skipping history line {}: {}", line_no + 1, e);
                }
            }
        }

        if skipped > 0 {
            debug!(
                "Read {} records from {} ({} malformed lines skipped)",
                records.len(),
                self.path.display(),
                skipped
            );
        }
        Ok(records)
    }

    /// Append records, one JSON object per line
    pub fn append(&self, records: &[EvaluationRecord]) -> ForecastResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ForecastError::io(format!("Failed to create history directory: {}", e))
                })?;
            }
        }

        let mut buffer = String::new();
        for record in records {
            buffer.push_str(&serde_json::to_string(record)?);
            buffer.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ForecastError::io(format!("Failed to open {}: {}", self.path.display(), e))
            })?;
        file.write_all(buffer.as_bytes())?;

        debug!("Appended {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use forecast_core::Direction;

    fn record(symbol: &str, accurate: bool) -> EvaluationRecord {
        let actual = if accurate { Direction::Up } else { Direction::Down };
        EvaluationRecord::new(
            NaiveDate::from_ymd_opt(2025, 7, 30).unwrap(),
            symbol,
            Direction::Up,
            Some(actual),
            70,
        )
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("nope.jsonl"));
        assert!(log.read_records().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("history/log.jsonl"));

        log.append(&[record("ABC", true)]).unwrap();
        log.append(&[record("DEF", false), record("GHI", true)]).unwrap();

        let records = log.read_records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], record("ABC", true));
        assert_eq!(records[2].symbol, "GHI");

        let raw = fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw.lines().count(), 3);
        assert!(raw.ends_with('\n'));
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        fs::write(
            &path,
            concat!(
                "{\"date\":\"2025-07-30\",\"symbol\":\"ABC\",\"predicted_direction\":\"up\",",
                "\"actual_direction\":\"up\",\"confidence\":70.4,\"accuracy\":true}\n",
                "\n",
                "not json\n",
                "{\"symbol\":\"NODATE\"}\n",
            ),
        )
        .unwrap();

        let records = HistoryLog::new(&path).read_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].confidence, 70);
    }

    #[test]
    fn test_invalid_utf8_line_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("log.jsonl"));
        log.append(&[record("ABC", true)]).unwrap();

        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        file.write_all(b"\xff\xfe garbage\n").unwrap();
        drop(file);
        log.append(&[record("DEF", false)]).unwrap();

        let records = log.read_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].symbol, "DEF");
    }

    #[test]
    fn test_append_nothing_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("log.jsonl"));
        log.append(&[]).unwrap();
        assert!(!log.path().exists());
    }
}
