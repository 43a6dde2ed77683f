//! Forecast pipeline
//!
//! Wires the capability adapters into the daily commands:
//! `gather` (predict), `evaluate` (score yesterday's predictions),
//! `calibrate` (suggest threshold changes), `forecast` (all three) and
//! `learn` (extend the watchlist).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use forecast_core::{
    CalibrationMetric, EvaluationRecord, ForecastError, ForecastResult, NewsSource,
    PersistenceSink, PredictionBatch, PredictionRecord, PriceQuoteSource, SentimentOracle,
};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use tracing::{error, info, instrument, warn};

use crate::calibration::{adjustment_file_name, adjustment_report, analyze};
use crate::config::ForecastConfig;
use crate::discovery::StockDiscovery;
use crate::evaluator::AccuracyEvaluator;
use crate::history::HistoryLog;
use crate::persistence::Committer;
use crate::predictor::predict;
use crate::relevance::RelevanceMatcher;
use crate::reports::{
    render_evaluation_markdown, render_prediction_markdown, render_summary, ReportStore,
    SymbolForecast,
};
use crate::scorer::SentimentScorer;
use crate::watchlist::{company_for, keyword_map_for, WatchlistStore};

/// Upper bound on one symbol's news fetch, on top of the client's own timeout
const NEWS_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a gather run
#[derive(Debug, Clone)]
pub struct GatherOutcome {
    pub batch: PredictionBatch,
    pub written: Vec<PathBuf>,
}

/// Result of an evaluate run
#[derive(Debug, Clone, Default)]
pub struct EvaluationOutcome {
    /// Date of the evaluated batch, `None` when there was nothing to evaluate
    pub batch_date: Option<NaiveDate>,
    pub records: Vec<EvaluationRecord>,
    pub written: Vec<PathBuf>,
}

/// Result of a calibrate run
#[derive(Debug, Clone)]
pub struct CalibrationOutcome {
    pub metrics: BTreeMap<String, CalibrationMetric>,
    /// Contents of the adjustment suggestions file
    pub report: String,
    pub written: Vec<PathBuf>,
}

/// Result of a full forecast run; a stage is `None` when it failed
#[derive(Debug, Clone, Default)]
pub struct ForecastOutcome {
    pub gather: Option<GatherOutcome>,
    pub evaluation: Option<EvaluationOutcome>,
    pub calibration: Option<CalibrationOutcome>,
}

/// The daily forecasting workflow
pub struct ForecastPipeline {
    config: ForecastConfig,
    news: Arc<dyn NewsSource>,
    oracle: Arc<dyn SentimentOracle>,
    quotes: Option<Arc<dyn PriceQuoteSource>>,
    sink: Arc<dyn PersistenceSink>,
    committer: Arc<dyn Committer>,
    watchlist: WatchlistStore,
    reports: ReportStore,
}

impl ForecastPipeline {
    pub fn new(
        config: ForecastConfig,
        news: Arc<dyn NewsSource>,
        oracle: Arc<dyn SentimentOracle>,
        sink: Arc<dyn PersistenceSink>,
        committer: Arc<dyn Committer>,
    ) -> Self {
        let watchlist = WatchlistStore::new(config.watchlist_file());
        let reports = ReportStore::new(
            config.output_root.clone(),
            config.report_dir.clone(),
            config.evaluation_dir.clone(),
        );

        Self {
            config,
            news,
            oracle,
            quotes: None,
            sink,
            committer,
            watchlist,
            reports,
        }
    }

    /// Price source for evaluation
    pub fn with_quotes(mut self, quotes: Arc<dyn PriceQuoteSource>) -> Self {
        self.quotes = Some(quotes);
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn watchlist(&self) -> &WatchlistStore {
        &self.watchlist
    }

    pub fn reports(&self) -> &ReportStore {
        &self.reports
    }

    async fn commit(&self, paths: &[PathBuf], message: &str) {
        if paths.is_empty() {
            return;
        }
        if let Err(e) = self.committer.add_and_commit(paths, message).await {
            warn!("Commit failed ({}): {}", message, e);
        }
    }

    fn write(&self, relative_path: PathBuf, contents: &str, written: &mut Vec<PathBuf>) -> ForecastResult<()> {
        let path = self.sink.write_report(&relative_path, contents)?;
        written.push(path);
        Ok(())
    }

    /// Fetch, match, score and predict one symbol; news failures degrade the prediction
    async fn forecast_symbol(
        &self,
        symbol: &str,
        company: &str,
        today: NaiveDate,
        matcher: &RelevanceMatcher,
        scorer: &SentimentScorer,
    ) -> SymbolForecast {
        let query = if company.eq_ignore_ascii_case(symbol) {
            symbol.to_string()
        } else {
            format!("{} OR {}", company, symbol)
        };

        let fetched = tokio::time::timeout(
            NEWS_FETCH_TIMEOUT,
            self.news.fetch(&query, self.config.news_page_size),
        )
        .await
        .unwrap_or_else(|_| Err(ForecastError::network("news fetch timed out")));

        match fetched {
            Ok(articles) => {
                let matched =
                    matcher.match_headlines(&articles, symbol, self.config.relevance_threshold);
                let insights = scorer.analyze(&matched).await;
                let prediction = predict(symbol, company, today, &insights, false);
                info!(
                    "{}: {} ({}, {:.0}%) from {}/{} headlines",
                    symbol,
                    prediction.recommendation,
                    prediction.direction,
                    prediction.confidence.value,
                    insights.len(),
                    articles.len()
                );
                SymbolForecast {
                    prediction,
                    insights,
                }
            }
            Err(e) => {
                if e.is_transient() {
                    warn!("{}: news from {} unavailable: {}", symbol, self.news.name(), e);
                } else {
                    error!("{}: news from {} failed: {}", symbol, self.news.name(), e);
                }
                SymbolForecast {
                    prediction: predict(symbol, company, today, &[], true),
                    insights: Vec::new(),
                }
            }
        }
    }

    async fn gather_stage(&self, today: NaiveDate) -> ForecastResult<GatherOutcome> {
        let entries = self.watchlist.load();
        if entries.is_empty() {
            warn!("Watchlist {} is empty", self.watchlist.path().display());
        }

        let matcher = RelevanceMatcher::new(keyword_map_for(&entries));
        let scorer = SentimentScorer::new(self.oracle.clone());
        let symbols: Vec<String> = entries
            .iter()
            .map(|e| e.symbol.to_uppercase())
            .unique()
            .collect();

        let forecasts: Vec<SymbolForecast> = stream::iter(symbols)
            .map(|symbol| {
                let company = company_for(&entries, &symbol);
                let matcher = &matcher;
                let scorer = &scorer;
                async move {
                    self.forecast_symbol(&symbol, &company, today, matcher, scorer)
                        .await
                }
            })
            .buffered(self.config.max_concurrency)
            .collect()
            .await;

        let results: Vec<PredictionRecord> =
            forecasts.iter().map(|f| f.prediction.clone()).collect();
        let batch = PredictionBatch {
            date: today,
            generated_at: Utc::now(),
            results,
        };

        let mut written = Vec::new();
        self.write(
            self.reports.prediction_json_path(today),
            &serde_json::to_string_pretty(&batch)?,
            &mut written,
        )?;
        self.write(
            self.reports.prediction_markdown_path(today),
            &render_prediction_markdown(today, &forecasts),
            &mut written,
        )?;
        self.write(
            self.reports.summary_path(today),
            &render_summary(&batch.results),
            &mut written,
        )?;

        let degraded = batch.results.iter().filter(|r| r.degraded).count();
        info!(
            "Gathered {} predictions for {} ({} without news)",
            batch.results.len(),
            today,
            degraded
        );
        Ok(GatherOutcome { batch, written })
    }

    async fn evaluate_stage(
        &self,
        today: NaiveDate,
        symbol: Option<&str>,
    ) -> ForecastResult<EvaluationOutcome> {
        let quotes = self
            .quotes
            .clone()
            .ok_or_else(|| ForecastError::config("No price quote source configured"))?;

        let Some(batch) = self.reports.previous_batch(today)? else {
            info!("No earlier prediction batch; nothing to evaluate");
            return Ok(EvaluationOutcome::default());
        };

        let symbols: Vec<String> = match symbol {
            Some(symbol) => vec![symbol.to_uppercase()],
            None => self.watchlist.symbols(),
        };

        let evaluator =
            AccuracyEvaluator::new(quotes).with_max_concurrency(self.config.max_concurrency);
        let records = evaluator.evaluate(&symbols, &batch).await;

        let mut written = Vec::new();
        if !records.is_empty() {
            written.push(self.sink.append_history(&records)?);
        }
        self.write(
            self.reports.evaluation_path(today),
            &render_evaluation_markdown(
                today,
                &self.reports.batch_file_name(batch.date),
                &records,
            ),
            &mut written,
        )?;

        Ok(EvaluationOutcome {
            batch_date: Some(batch.date),
            records,
            written,
        })
    }

    async fn calibrate_stage(&self, today: NaiveDate) -> ForecastResult<CalibrationOutcome> {
        let log = HistoryLog::new(self.config.output_root.join(&self.config.history_log_path));
        let records = log.read_records()?;
        let metrics = analyze(&records, today, self.config.calibration_window_days);

        for metric in metrics.values() {
            info!(
                "{}: accuracy {}, avg confidence {:.1}, {}",
                metric.symbol,
                metric
                    .accuracy_rate
                    .map(|r| format!("{:.0}%", r * 100.0))
                    .unwrap_or_else(|| "n/a".to_string()),
                metric.avg_confidence,
                metric.calibration
            );
        }

        let report = adjustment_report(&metrics);
        let mut written = Vec::new();
        self.write(PathBuf::from(adjustment_file_name(today)), &report, &mut written)?;

        Ok(CalibrationOutcome {
            metrics,
            report,
            written,
        })
    }

    /// Predict every watchlist symbol and write the day's reports
    #[instrument(skip(self))]
    pub async fn gather(&self, today: NaiveDate) -> ForecastResult<GatherOutcome> {
        let outcome = self.gather_stage(today).await?;
        self.commit(&outcome.written, &format!("Add prediction report for {}", today))
            .await;
        Ok(outcome)
    }

    /// Evaluate the most recent earlier batch, optionally for one symbol
    #[instrument(skip(self))]
    pub async fn evaluate(
        &self,
        today: NaiveDate,
        symbol: Option<&str>,
    ) -> ForecastResult<EvaluationOutcome> {
        let outcome = self.evaluate_stage(today, symbol).await?;
        self.commit(&outcome.written, &format!("Add evaluation report for {}", today))
            .await;
        Ok(outcome)
    }

    /// Calibrate the accuracy log and write adjustment suggestions
    #[instrument(skip(self))]
    pub async fn calibrate(&self, today: NaiveDate) -> ForecastResult<CalibrationOutcome> {
        let outcome = self.calibrate_stage(today).await?;
        self.commit(
            &outcome.written,
            &format!("Add adjustment suggestions for {}", today),
        )
        .await;
        Ok(outcome)
    }

    /// Gather, evaluate and calibrate, then commit everything once
    ///
    /// A failing stage is logged and the later stages still run.
    #[instrument(skip(self))]
    pub async fn forecast(&self, today: NaiveDate) -> ForecastOutcome {
        let mut outcome = ForecastOutcome::default();
        let mut written = Vec::new();

        match self.gather_stage(today).await {
            Ok(gathered) => {
                written.extend(gathered.written.iter().cloned());
                outcome.gather = Some(gathered);
            }
            Err(e) => error!("Gather failed: {}", e),
        }

        match self.evaluate_stage(today, None).await {
            Ok(evaluated) => {
                written.extend(evaluated.written.iter().cloned());
                outcome.evaluation = Some(evaluated);
            }
            Err(e) => error!("Evaluate failed: {}", e),
        }

        match self.calibrate_stage(today).await {
            Ok(calibrated) => {
                written.extend(calibrated.written.iter().cloned());
                outcome.calibration = Some(calibrated);
            }
            Err(e) => error!("Calibrate failed: {}", e),
        }

        self.commit(&written, &format!("Daily forecast for {}", today))
            .await;
        outcome
    }

    /// Discover new symbols in the news and add them to the watchlist
    #[instrument(skip(self))]
    pub async fn learn(&self, query: &str, today: NaiveDate) -> ForecastResult<Vec<String>> {
        let discovery = StockDiscovery::new(self.news.clone(), self.watchlist.clone());
        let added = discovery.learn(query, today).await?;

        if !added.is_empty() {
            let path = self.watchlist.path().to_path_buf();
            self.commit(&[path], &format!("Add discovered stocks: {}", added.join(", ")))
                .await;
        }
        Ok(added)
    }
}
