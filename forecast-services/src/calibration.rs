//! Confidence calibration
//!
//! Compares stated confidence with realized accuracy over a trailing window of
//! the accuracy log, and suggests BUY threshold adjustments.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use forecast_core::{
    CalibrationMetric, CalibrationVerdict, Direction, EvaluationRecord, ForecastResult,
};
use itertools::Itertools;
use tracing::{debug, info};

use crate::history::HistoryLog;

/// Default trailing window in days, including today
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Accuracy within this many points of confidence counts as well calibrated
const CALIBRATION_TOLERANCE: f64 = 5.0;
/// Confidence at which an up call counts as a high-confidence BUY
const HIGH_CONFIDENCE: u8 = 60;
const LOW_BUY_ACCURACY: f64 = 0.5;
const HIGH_BUY_ACCURACY: f64 = 0.75;

/// Per-symbol calibration over the `window_days` ending at `today`
pub fn analyze(
    records: &[EvaluationRecord],
    today: NaiveDate,
    window_days: u32,
) -> BTreeMap<String, CalibrationMetric> {
    let cutoff = today
        .checked_sub_days(Days::new(u64::from(window_days.saturating_sub(1))))
        .unwrap_or(NaiveDate::MIN);

    let by_symbol = records
        .iter()
        .filter(|r| r.date >= cutoff)
        .into_group_map_by(|r| r.symbol.clone());

    let metrics: BTreeMap<String, CalibrationMetric> = by_symbol
        .into_iter()
        .map(|(symbol, items)| {
            let metric = symbol_metric(&symbol, &items);
            (symbol, metric)
        })
        .collect();

    debug!(
        "Calibrated {} symbols since {} ({} day window)",
        metrics.len(),
        cutoff,
        window_days
    );
    metrics
}

/// Read the accuracy log and calibrate it
pub fn analyze_log(
    log: &HistoryLog,
    today: NaiveDate,
    window_days: u32,
) -> ForecastResult<BTreeMap<String, CalibrationMetric>> {
    let records = log.read_records()?;
    Ok(analyze(&records, today, window_days))
}

fn symbol_metric(symbol: &str, items: &[&EvaluationRecord]) -> CalibrationMetric {
    let evaluated = items.iter().filter(|r| r.accuracy.is_some()).count();
    let correct = items.iter().filter(|r| r.accuracy == Some(true)).count();
    let accuracy_rate = (evaluated > 0).then(|| correct as f64 / evaluated as f64);

    let avg_confidence = if items.is_empty() {
        0.0
    } else {
        items.iter().map(|r| f64::from(r.confidence)).sum::<f64>() / items.len() as f64
    };

    let calibration = match accuracy_rate {
        None => CalibrationVerdict::NoData,
        Some(rate) => {
            let accuracy_pct = rate * 100.0;
            if accuracy_pct < avg_confidence - CALIBRATION_TOLERANCE {
                CalibrationVerdict::Overconfident
            } else if accuracy_pct > avg_confidence + CALIBRATION_TOLERANCE {
                CalibrationVerdict::Underconfident
            } else {
                CalibrationVerdict::WellCalibrated
            }
        }
    };

    CalibrationMetric {
        symbol: symbol.to_string(),
        accuracy_rate,
        avg_confidence,
        calibration,
        suggestion: buy_threshold_suggestion(symbol, items),
    }
}

/// Suggestion from high-confidence up calls; unevaluated calls count as misses
fn buy_threshold_suggestion(symbol: &str, items: &[&EvaluationRecord]) -> Option<String> {
    let high_buys: Vec<_> = items
        .iter()
        .filter(|r| r.predicted_direction == Direction::Up && r.confidence >= HIGH_CONFIDENCE)
        .collect();
    if high_buys.is_empty() {
        return None;
    }

    let hits = high_buys.iter().filter(|r| r.accuracy == Some(true)).count();
    let high_accuracy = hits as f64 / high_buys.len() as f64;

    let adjustment = if high_accuracy < LOW_BUY_ACCURACY {
        "increasing"
    } else if high_accuracy > HIGH_BUY_ACCURACY {
        "decreasing"
    } else {
        return None;
    };

    Some(format!(
        "{} has {:.0}% accuracy for high-confidence BUY calls; suggest {} BUY threshold",
        symbol,
        high_accuracy * 100.0,
        adjustment
    ))
}

/// Text for the adjustment suggestions file
pub fn adjustment_report(metrics: &BTreeMap<String, CalibrationMetric>) -> String {
    let lines: Vec<String> = metrics
        .iter()
        .filter_map(|(symbol, metric)| {
            metric
                .suggestion
                .as_ref()
                .map(|suggestion| format!("{}: {}", symbol, suggestion))
        })
        .collect();

    if lines.is_empty() {
        info!("No adjustment suggestions");
        "No adjustment suggestions.".to_string()
    } else {
        lines.join("\n")
    }
}

/// File name of the adjustment suggestions for `date`
pub fn adjustment_file_name(date: NaiveDate) -> String {
    format!("adjustment_suggestions_{}.txt", date.format("%Y-%m-%d"))
}
