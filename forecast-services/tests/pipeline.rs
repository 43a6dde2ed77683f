//! End-to-end pipeline runs against in-memory adapters and a temp directory

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use forecast_core::{
    ActualDirection, CalibrationVerdict, Direction, ForecastError, ForecastResult, NewsArticle,
    NewsSource, PriceQuoteSource, Recommendation, SentimentAssessment, SentimentOracle,
    WatchlistEntry,
};
use forecast_services::{Committer, FileSink, ForecastConfig, ForecastPipeline, WatchlistStore};
use parking_lot::Mutex;
use tempfile::TempDir;

const HEADLINES: &[&str] = &[
    "Apple beats estimates as iPhone sales surge",
    "Tesla shares plunge after recall",
    "Apple expands services push",
    "Broadcom jumps on AI demand",
];

/// Every query gets the same headlines; queries mentioning FAIL error out
/// and queries mentioning HANG never complete
struct FakeNews;

#[async_trait]
impl NewsSource for FakeNews {
    async fn fetch(&self, query: &str, limit: usize) -> ForecastResult<Vec<NewsArticle>> {
        if query.contains("FAIL") {
            return Err(ForecastError::network("connection refused"));
        }
        if query.contains("HANG") {
            std::future::pending::<()>().await;
        }
        Ok(HEADLINES
            .iter()
            .take(limit)
            .map(|t| NewsArticle::new(*t, None))
            .collect())
    }

    fn name(&self) -> &str {
        "Fake"
    }
}

struct FakeOracle;

#[async_trait]
impl SentimentOracle for FakeOracle {
    async fn assess(&self, text: &str) -> ForecastResult<SentimentAssessment> {
        let sentiment = if text.contains("surge") {
            0.8
        } else if text.contains("plunge") {
            -0.7
        } else {
            0.0
        };
        Ok(SentimentAssessment::polarity(sentiment))
    }

    fn name(&self) -> &str {
        "Fake"
    }
}

#[derive(Default)]
struct FakeQuotes {
    closes: HashMap<(String, NaiveDate), String>,
}

impl FakeQuotes {
    fn with(mut self, symbol: &str, date: NaiveDate, close: &str) -> Self {
        self.closes.insert((symbol.to_string(), date), close.to_string());
        self
    }
}

#[async_trait]
impl PriceQuoteSource for FakeQuotes {
    async fn closing_price(&self, symbol: &str, date: NaiveDate) -> ForecastResult<Option<String>> {
        Ok(self.closes.get(&(symbol.to_string(), date)).cloned())
    }
}

#[derive(Default)]
struct RecordingCommitter {
    commits: Mutex<Vec<(Vec<PathBuf>, String)>>,
}

#[async_trait]
impl Committer for RecordingCommitter {
    async fn add_and_commit(&self, paths: &[PathBuf], message: &str) -> ForecastResult<()> {
        self.commits.lock().push((paths.to_vec(), message.to_string()));
        Ok(())
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
}

struct Harness {
    dir: TempDir,
    committer: Arc<RecordingCommitter>,
    pipeline: ForecastPipeline,
}

fn harness(with_quotes: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = ForecastConfig {
        output_root: dir.path().to_path_buf(),
        git_commit: false,
        max_concurrency: 2,
        ..ForecastConfig::default()
    };

    WatchlistStore::new(config.watchlist_file())
        .save(&[
            WatchlistEntry::new("AAPL"),
            WatchlistEntry::new("TSLA"),
            WatchlistEntry::new("ZZZQ"),
            WatchlistEntry::new("FAIL"),
        ])
        .unwrap();

    let sink = Arc::new(FileSink::new(dir.path(), &config.history_log_path));
    let committer = Arc::new(RecordingCommitter::default());
    let mut pipeline = ForecastPipeline::new(
        config,
        Arc::new(FakeNews),
        Arc::new(FakeOracle),
        sink,
        committer.clone(),
    );

    if with_quotes {
        let quotes = FakeQuotes::default()
            .with("AAPL", day(28), "100.00")
            .with("AAPL", day(29), "101.00")
            .with("TSLA", day(28), "200.00")
            .with("TSLA", day(29), "190.00");
        pipeline = pipeline.with_quotes(Arc::new(quotes));
    }

    Harness {
        dir,
        committer,
        pipeline,
    }
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

#[tokio::test]
async fn test_gather_predicts_every_symbol_in_order() {
    let h = harness(false);
    let outcome = h.pipeline.gather(day(28)).await.unwrap();

    let symbols: Vec<_> = outcome.batch.results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "TSLA", "ZZZQ", "FAIL"]);

    let aapl = &outcome.batch.results[0];
    assert_eq!(aapl.company, "Apple");
    assert!((aapl.score - 0.4).abs() < 1e-9);
    assert_eq!(aapl.direction, Direction::Up);
    assert_eq!(aapl.confidence.rounded(), 64);
    assert_eq!(aapl.recommendation, Recommendation::Buy);
    assert_eq!(aapl.turnover, "4-7 days");
    assert_eq!(aapl.headlines.len(), 2);

    let tsla = &outcome.batch.results[1];
    assert_eq!(tsla.direction, Direction::Down);
    assert_eq!(tsla.recommendation, Recommendation::Avoid);
    assert_eq!(tsla.turnover, "2-3 days");

    let zzzq = &outcome.batch.results[2];
    assert_eq!(zzzq.score, 0.0);
    assert!(zzzq.headlines.is_empty());
    assert!(!zzzq.degraded);

    let fail = &outcome.batch.results[3];
    assert!(fail.degraded);
    assert_eq!(fail.recommendation, Recommendation::Avoid);

    let root = h.dir.path();
    let json = read(root, "reports/prediction-2025-07-28.json");
    assert!(json.contains("\"degraded\": true"));
    assert_eq!(json.matches("degraded").count(), 1);

    let summary = read(root, "reports/summary-2025-07-28.txt");
    assert_eq!(
        summary.lines().next(),
        Some("AAPL: BUY (up, 64%, 4-7 days)")
    );
    assert_eq!(summary.lines().count(), 4);

    let markdown = read(root, "reports/prediction-2025-07-28.md");
    assert!(markdown.contains("Matched keyword: \"Apple\", Relevance: 1.00, Sentiment: +0.80"));
    assert!(markdown.contains("News retrieval failed"));

    let commits = h.committer.commits.lock();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].0.len(), 3);
    assert_eq!(commits[0].1, "Add prediction report for 2025-07-28");
}

#[tokio::test]
async fn test_evaluate_then_calibrate() {
    let h = harness(true);
    h.pipeline.gather(day(28)).await.unwrap();
    h.pipeline.gather(day(29)).await.unwrap();

    let evaluation = h.pipeline.evaluate(day(29), None).await.unwrap();
    assert_eq!(evaluation.batch_date, Some(day(28)));
    assert_eq!(evaluation.records.len(), 4);
    assert_eq!(evaluation.records[0].accuracy, Some(true));
    assert_eq!(evaluation.records[0].confidence, 64);
    assert_eq!(evaluation.records[1].actual_direction, ActualDirection::Down);
    assert_eq!(evaluation.records[1].accuracy, Some(true));
    assert_eq!(evaluation.records[2].actual_direction, ActualDirection::Unknown);
    assert_eq!(evaluation.records[2].accuracy, None);

    let root = h.dir.path();
    let log = read(root, "history/prediction_accuracy_log.jsonl");
    assert_eq!(log.lines().count(), 4);

    let report = read(root, "evaluations/evaluation-2025-07-29.md");
    assert!(report.contains("Report evaluated: prediction-2025-07-28.json"));
    assert!(report.contains("| AAPL | up | up | 64% | ✅ |"));

    let calibration = h.pipeline.calibrate(day(29)).await.unwrap();
    assert_eq!(
        calibration.metrics["AAPL"].calibration,
        CalibrationVerdict::Underconfident
    );
    assert_eq!(calibration.metrics["ZZZQ"].calibration, CalibrationVerdict::NoData);
    assert_eq!(
        calibration.report,
        "AAPL: AAPL has 100% accuracy for high-confidence BUY calls; suggest decreasing BUY threshold"
    );
    assert_eq!(
        read(root, "adjustment_suggestions_2025-07-29.txt"),
        calibration.report
    );

    // unchanged log, same answer
    let again = h.pipeline.calibrate(day(29)).await.unwrap();
    assert_eq!(again.metrics, calibration.metrics);
}

#[tokio::test]
async fn test_evaluate_defaults_to_current_watchlist() {
    let h = harness(true);
    h.pipeline.gather(day(28)).await.unwrap();
    h.pipeline
        .watchlist()
        .save(&[WatchlistEntry::new("AAPL"), WatchlistEntry::new("ZZZQ")])
        .unwrap();

    let evaluation = h.pipeline.evaluate(day(29), None).await.unwrap();
    let symbols: Vec<_> = evaluation.records.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "ZZZQ"]);

    let log = read(h.dir.path(), "history/prediction_accuracy_log.jsonl");
    assert_eq!(log.lines().count(), 2);
    assert!(!log.contains("TSLA"));
}

#[tokio::test]
async fn test_evaluate_single_symbol() {
    let h = harness(true);
    h.pipeline.gather(day(28)).await.unwrap();

    let evaluation = h.pipeline.evaluate(day(29), Some("tsla")).await.unwrap();
    assert_eq!(evaluation.records.len(), 1);
    assert_eq!(evaluation.records[0].symbol, "TSLA");

    let missing = h.pipeline.evaluate(day(29), Some("NOPE")).await.unwrap();
    assert!(missing.records.is_empty());
}

#[tokio::test]
async fn test_evaluate_without_batches_or_quotes() {
    let h = harness(true);
    let evaluation = h.pipeline.evaluate(day(29), None).await.unwrap();
    assert!(evaluation.batch_date.is_none());
    assert!(evaluation.written.is_empty());
    assert!(h.committer.commits.lock().is_empty());

    let h = harness(false);
    h.pipeline.gather(day(28)).await.unwrap();
    assert!(matches!(
        h.pipeline.evaluate(day(29), None).await,
        Err(ForecastError::Config(_))
    ));
}

#[tokio::test]
async fn test_forecast_runs_all_stages_with_one_commit() {
    let h = harness(true);
    h.pipeline.gather(day(28)).await.unwrap();

    let outcome = h.pipeline.forecast(day(29)).await;
    assert!(outcome.gather.is_some());
    assert_eq!(
        outcome.evaluation.as_ref().and_then(|e| e.batch_date),
        Some(day(28))
    );
    assert!(outcome.calibration.is_some());

    let commits = h.committer.commits.lock();
    assert_eq!(commits.len(), 2);
    let (paths, message) = &commits[1];
    assert_eq!(message, "Daily forecast for 2025-07-29");
    // three gather reports, history log, evaluation report, adjustment file
    assert_eq!(paths.len(), 6);
}

#[tokio::test]
async fn test_first_forecast_does_not_evaluate_its_own_batch() {
    let h = harness(true);

    let first = h.pipeline.forecast(day(28)).await;
    assert!(first.gather.is_some());
    assert_eq!(first.evaluation.as_ref().and_then(|e| e.batch_date), None);
    assert!(!h.dir.path().join("history/prediction_accuracy_log.jsonl").exists());

    let second = h.pipeline.forecast(day(29)).await;
    assert_eq!(
        second.evaluation.as_ref().and_then(|e| e.batch_date),
        Some(day(28))
    );

    let log = read(h.dir.path(), "history/prediction_accuracy_log.jsonl");
    assert_eq!(log.lines().count(), 4);
    assert_eq!(log.matches("\"symbol\":\"AAPL\"").count(), 1);

    let calibration = second.calibration.unwrap();
    assert_eq!(
        calibration.metrics["AAPL"].suggestion.as_deref(),
        Some("AAPL has 100% accuracy for high-confidence BUY calls; suggest decreasing BUY threshold")
    );
}

#[tokio::test(start_paused = true)]
async fn test_stalled_news_fetch_times_out() {
    let h = harness(false);
    h.pipeline
        .watchlist()
        .save(&[WatchlistEntry::new("AAPL"), WatchlistEntry::new("HANG")])
        .unwrap();

    let outcome = h.pipeline.gather(day(28)).await.unwrap();
    let results = &outcome.batch.results;
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].symbol, "AAPL");
    assert!(!results[0].degraded);
    assert_eq!(results[0].recommendation, Recommendation::Buy);

    assert_eq!(results[1].symbol, "HANG");
    assert!(results[1].degraded);
    assert_eq!(results[1].recommendation, Recommendation::Avoid);
}

#[tokio::test]
async fn test_forecast_continues_after_failed_stage() {
    let h = harness(false);
    let outcome = h.pipeline.forecast(day(29)).await;
    assert!(outcome.gather.is_some());
    assert!(outcome.evaluation.is_none());
    assert!(outcome.calibration.is_some());
}

#[tokio::test]
async fn test_learn_extends_watchlist() {
    let h = harness(false);
    let added = h.pipeline.learn("stock market", day(29)).await.unwrap();
    assert_eq!(added, vec!["AVGO"]);

    let symbols = h.pipeline.watchlist().symbols();
    assert_eq!(symbols, vec!["AAPL", "TSLA", "ZZZQ", "FAIL", "AVGO"]);

    let again = h.pipeline.learn("stock market", day(30)).await.unwrap();
    assert!(again.is_empty());
    assert_eq!(h.committer.commits.lock().len(), 1);
}
