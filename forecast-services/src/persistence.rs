//! Durable output
//!
//! [`FileSink`] writes reports and the accuracy history beneath an output
//! root. [`Committer`] implementations record written files in version
//! control once a command finishes.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use forecast_core::{EvaluationRecord, ForecastError, ForecastResult, PersistenceSink};
use parking_lot::Mutex;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::history::HistoryLog;

/// File-system sink rooted at an output directory
///
/// Writes are serialized through one lock so concurrent callers never
/// interleave within the history log.
#[derive(Debug)]
pub struct FileSink {
    root: PathBuf,
    history: HistoryLog,
    write_lock: Mutex<()>,
}

impl FileSink {
    /// `history_path` is resolved against `root` when relative
    pub fn new(root: impl Into<PathBuf>, history_path: impl AsRef<Path>) -> Self {
        let root = root.into();
        let history = HistoryLog::new(root.join(history_path));
        Self {
            root,
            history,
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The accuracy history this sink appends to
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }
}

impl PersistenceSink for FileSink {
    fn write_report(&self, relative_path: &Path, contents: &str) -> ForecastResult<PathBuf> {
        let path = self.root.join(relative_path);
        let _guard = self.write_lock.lock();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ForecastError::io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(&path, contents)
            .map_err(|e| ForecastError::io(format!("Failed to write {}: {}", path.display(), e)))?;

        debug!("Wrote {}", path.display());
        Ok(path)
    }

    fn append_history(&self, records: &[EvaluationRecord]) -> ForecastResult<PathBuf> {
        let _guard = self.write_lock.lock();
        self.history.append(records)?;
        Ok(self.history.path().to_path_buf())
    }
}

/// Records written files in version control
#[async_trait]
pub trait Committer: Send + Sync {
    async fn add_and_commit(&self, paths: &[PathBuf], message: &str) -> ForecastResult<()>;
}

/// Commits through the `git` executable
#[derive(Debug, Clone)]
pub struct GitCommitter {
    repo_root: PathBuf,
}

impl GitCommitter {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    async fn git(&self, args: &[&str], paths: &[PathBuf]) -> ForecastResult<()> {
        // relative output paths would otherwise resolve against the repo root twice
        let paths: Vec<PathBuf> = paths
            .iter()
            .map(|p| fs::canonicalize(p).unwrap_or_else(|_| p.clone()))
            .collect();

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .args(args)
            .args(&paths)
            .output()
            .await
            .map_err(|e| ForecastError::internal(format!("Failed to run git: {}", e)))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            Err(ForecastError::internal(format!(
                "git {} exited with {}: {}{}",
                args.first().copied().unwrap_or_default(),
                output.status,
                stderr.trim(),
                stdout.trim()
            )))
        }
    }
}

#[async_trait]
impl Committer for GitCommitter {
    #[instrument(skip(self, paths), fields(files = paths.len()))]
    async fn add_and_commit(&self, paths: &[PathBuf], message: &str) -> ForecastResult<()> {
        if paths.is_empty() {
            return Ok(());
        }

        self.git(&["add", "--"], paths).await?;
        self.git(&["commit", "-m", message, "--"], paths).await?;

        info!("Committed {} files: {}", paths.len(), message);
        Ok(())
    }
}

/// Skips version control
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCommitter;

#[async_trait]
impl Committer for NoopCommitter {
    async fn add_and_commit(&self, paths: &[PathBuf], message: &str) -> ForecastResult<()> {
        debug!("Commit skipped for {} files ({})", paths.len(), message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use forecast_core::Direction;

    #[test]
    fn test_write_report_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path(), "history/log.jsonl");

        let path = sink
            .write_report(Path::new("reports/prediction-2025-07-30.md"), "# Report\n")
            .unwrap();
        assert_eq!(path, dir.path().join("reports/prediction-2025-07-30.md"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Report\n");

        // replaced, not appended
        sink.write_report(Path::new("reports/prediction-2025-07-30.md"), "# Again\n")
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Again\n");
    }

    #[test]
    fn test_append_history() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path(), "history/log.jsonl");
        let record = EvaluationRecord::new(
            NaiveDate::from_ymd_opt(2025, 7, 30).unwrap(),
            "ABC",
            Direction::Up,
            None,
            55,
        );

        let path = sink.append_history(&[record.clone()]).unwrap();
        sink.append_history(&[record.clone()]).unwrap();
        assert_eq!(path, dir.path().join("history/log.jsonl"));
        assert_eq!(sink.history().read_records().unwrap(), vec![record.clone(), record]);
    }

    #[tokio::test]
    async fn test_noop_committer() {
        let committer = NoopCommitter;
        committer
            .add_and_commit(&[PathBuf::from("reports/a.md")], "Add report")
            .await
            .unwrap();
    }
}
