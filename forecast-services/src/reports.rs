//! Report rendering and lookup
//!
//! Renders the daily prediction report (markdown + JSON), the one-line-per-symbol
//! summary and the evaluation report, and finds earlier prediction batches.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use forecast_core::{
    Direction, EvaluationRecord, ForecastError, ForecastResult, PredictionBatch, PredictionRecord,
    SentimentInsight,
};
use tracing::{debug, warn};

use crate::predictor::{narrative, sort_for_presentation};

/// Headlines listed per symbol in the markdown report
const TOP_HEADLINES: usize = 5;

const PREDICTION_PREFIX: &str = "prediction-";

/// A symbol's prediction together with the evidence behind it
#[derive(Debug, Clone)]
pub struct SymbolForecast {
    pub prediction: PredictionRecord,
    /// Scored headlines, most relevant first
    pub insights: Vec<SentimentInsight>,
}

/// Mermaid flowchart block
pub fn flowchart(nodes: &[(&str, &str)], edges: &[(&str, &str)]) -> String {
    let mut lines = vec!["```mermaid".to_string(), "flowchart TD".to_string()];
    lines.extend(nodes.iter().map(|(id, label)| format!("    {}[{}]", id, label)));
    lines.extend(edges.iter().map(|(from, to)| format!("    {} --> {}", from, to)));
    lines.push("```".to_string());
    lines.join("\n")
}

fn process_diagram() -> String {
    flowchart(
        &[
            ("A", "Fetch News"),
            ("B", "Match Relevance"),
            ("C", "Analyze Sentiment"),
            ("D", "Predict Stock"),
        ],
        &[("A", "B"), ("B", "C"), ("C", "D")],
    )
}

fn direction_badge(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "📈 Positive",
        Direction::Down => "📉 Negative",
        Direction::Neutral => "➖ Neutral",
    }
}

fn narrative_sentence(score: f64) -> &'static str {
    match narrative(score) {
        Direction::Up => "Headline sentiment leans positive; an upward move is expected.",
        Direction::Down => "Headline sentiment leans negative; a downward move is expected.",
        Direction::Neutral => "Headline sentiment is mixed or flat; no clear move is expected.",
    }
}

/// Markdown report for one gather run
pub fn render_prediction_markdown(date: NaiveDate, forecasts: &[SymbolForecast]) -> String {
    let mut ordered: Vec<&SymbolForecast> = forecasts.iter().collect();
    ordered.sort_by_key(|f| f.prediction.recommendation.rank());

    let mut lines = vec![
        format!("# Stock Prediction Report - {}", date),
        String::new(),
        "## Watchlist".to_string(),
        String::new(),
    ];

    if ordered.is_empty() {
        lines.push("No symbols on the watchlist.".to_string());
    } else {
        lines.push(
            "| Symbol | Company | Recommendation | Direction | Confidence | Turnover |".to_string(),
        );
        lines.push("|---|---|---|---|---|---|".to_string());
        lines.extend(ordered.iter().map(|forecast| {
            let p = &forecast.prediction;
            format!(
                "| {} | {} | {} | {} | {}% ({}) | {} |",
                p.symbol,
                p.company,
                p.recommendation,
                p.direction,
                p.confidence.rounded(),
                p.confidence.label,
                p.turnover
            )
        }));
    }

    for forecast in &ordered {
        let p = &forecast.prediction;
        lines.push(String::new());
        lines.push(format!("## {} ({})", p.symbol, p.company));
        lines.push(String::new());
        lines.push("### Top Matched Headlines".to_string());
        if p.degraded {
            lines.push("News retrieval failed; no headlines were scored.".to_string());
        } else if forecast.insights.is_empty() {
            lines.push("No relevant headlines found.".to_string());
        }
        for insight in forecast.insights.iter().take(TOP_HEADLINES) {
            lines.push(format!("- \"{}\"", insight.title));
            lines.push(format!(
                "  - Matched keyword: \"{}\", Relevance: {:.2}, Sentiment: {:+.2}",
                insight.keyword, insight.relevance_score, insight.sentiment
            ));
        }
        lines.push(String::new());
        lines.push("### Prediction".to_string());
        lines.push(format!("- Weighted Score: {:+.2}", p.score));
        lines.push(format!("- Final Direction: {}", direction_badge(p.direction)));
        lines.push(format!("- Outlook: {}", narrative_sentence(p.score)));
        lines.push(format!(
            "- Confidence: {}% ({})",
            p.confidence.rounded(),
            p.confidence.label
        ));
        lines.push(format!("- Recommendation: {} ({})", p.recommendation, p.turnover));
    }

    lines.push(String::new());
    lines.push("## Process Diagram".to_string());
    lines.push(process_diagram());
    lines.join("\n") + "\n"
}

/// `SYM: REC (direction, confidence%, turnover)` per symbol, BUY first
pub fn render_summary(records: &[PredictionRecord]) -> String {
    let mut ordered = records.to_vec();
    sort_for_presentation(&mut ordered);

    ordered
        .iter()
        .map(|p| {
            format!(
                "{}: {} ({}, {}%, {})\n",
                p.symbol,
                p.recommendation,
                p.direction,
                p.confidence.rounded(),
                p.turnover
            )
        })
        .collect()
}

/// Markdown report for one evaluation run
pub fn render_evaluation_markdown(
    today: NaiveDate,
    evaluated_report: &str,
    records: &[EvaluationRecord],
) -> String {
    let mut lines = vec![
        format!("# Evaluation - {}", today),
        String::new(),
        format!("Report evaluated: {}", evaluated_report),
        String::new(),
    ];

    if records.is_empty() {
        lines.push("No predictions to evaluate.".to_string());
        return lines.join("\n") + "\n";
    }

    lines.push("| Symbol | Predicted | Actual | Confidence | Result |".to_string());
    lines.push("|---|---|---|---|---|".to_string());
    lines.extend(records.iter().map(|record| {
        let result = match record.accuracy {
            Some(true) => "✅",
            Some(false) => "❌",
            None => "n/a",
        };
        format!(
            "| {} | {} | {} | {}% | {} |",
            record.symbol,
            record.predicted_direction,
            record.actual_direction,
            record.confidence,
            result
        )
    }));

    let evaluated: Vec<_> = records.iter().filter_map(|r| r.accuracy).collect();
    if !evaluated.is_empty() {
        let hits = evaluated.iter().filter(|hit| **hit).count();
        lines.push(String::new());
        lines.push(format!(
            "Accuracy: {}/{} ({:.0}%)",
            hits,
            evaluated.len(),
            hits as f64 * 100.0 / evaluated.len() as f64
        ));
    }
    lines.join("\n") + "\n"
}

/// Report locations beneath the output root
#[derive(Debug, Clone)]
pub struct ReportStore {
    root: PathBuf,
    report_dir: PathBuf,
    evaluation_dir: PathBuf,
}

impl ReportStore {
    pub fn new(
        root: impl Into<PathBuf>,
        report_dir: impl Into<PathBuf>,
        evaluation_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            root: root.into(),
            report_dir: report_dir.into(),
            evaluation_dir: evaluation_dir.into(),
        }
    }

    /// Relative path of the JSON batch for `date`
    pub fn prediction_json_path(&self, date: NaiveDate) -> PathBuf {
        self.report_dir.join(format!("{}{}.json", PREDICTION_PREFIX, date))
    }

    pub fn prediction_markdown_path(&self, date: NaiveDate) -> PathBuf {
        self.report_dir.join(format!("{}{}.md", PREDICTION_PREFIX, date))
    }

    pub fn summary_path(&self, date: NaiveDate) -> PathBuf {
        self.report_dir.join(format!("summary-{}.txt", date))
    }

    pub fn evaluation_path(&self, date: NaiveDate) -> PathBuf {
        self.evaluation_dir.join(format!("evaluation-{}.md", date))
    }

    /// Dates of every prediction batch on disk, oldest first
    fn batch_dates(&self) -> ForecastResult<Vec<NaiveDate>> {
        let dir = self.root.join(&self.report_dir);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ForecastError::io(format!(
                    "Failed to list {}: {}",
                    dir.display(),
                    e
                )))
            }
        };

        let mut dates: Vec<NaiveDate> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let stem = name
                    .to_str()?
                    .strip_prefix(PREDICTION_PREFIX)?
                    .strip_suffix(".json")?
                    .to_string();
                NaiveDate::parse_from_str(&stem, "%Y-%m-%d").ok()
            })
            .collect();
        dates.sort();
        Ok(dates)
    }

    /// Read the batch written for `date`
    pub fn read_batch(&self, date: NaiveDate) -> ForecastResult<PredictionBatch> {
        let path = self.root.join(self.prediction_json_path(date));
        let contents = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ForecastError::not_found(format!("No prediction batch at {}", path.display()))
            } else {
                ForecastError::io(format!("Failed to read {}: {}", path.display(), e))
            }
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| ForecastError::parse(format!("Invalid batch {}: {}", path.display(), e)))
    }

    /// Latest batch dated strictly before `today`
    ///
    /// Unreadable batches are skipped in favour of the next older one.
    pub fn previous_batch(&self, today: NaiveDate) -> ForecastResult<Option<PredictionBatch>> {
        let dates = self.batch_dates()?;
        for date in dates.into_iter().rev().filter(|d| *d < today) {
            match self.read_batch(date) {
                Ok(batch) => {
                    debug!("Using prediction batch from {}", date);
                    return Ok(Some(batch));
                }
                Err(e) => warn!("Skipping prediction batch {}: {}", date, e),
            }
        }
        Ok(None)
    }

    /// File name shown in evaluation reports
    pub fn batch_file_name(&self, date: NaiveDate) -> String {
        self.prediction_json_path(date)
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_default()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
