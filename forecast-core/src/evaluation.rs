//! Accuracy history and calibration data structures

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::prediction::Direction;

/// Realized price direction; `Unknown` when market data was unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActualDirection {
    Up,
    Down,
    Neutral,
    #[default]
    Unknown,
}

impl ActualDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActualDirection::Up => "up",
            ActualDirection::Down => "down",
            ActualDirection::Neutral => "neutral",
            ActualDirection::Unknown => "unknown",
        }
    }

    /// The known direction, if any
    pub fn known(&self) -> Option<Direction> {
        match self {
            ActualDirection::Up => Some(Direction::Up),
            ActualDirection::Down => Some(Direction::Down),
            ActualDirection::Neutral => Some(Direction::Neutral),
            ActualDirection::Unknown => None,
        }
    }
}

impl From<Option<Direction>> for ActualDirection {
    fn from(direction: Option<Direction>) -> Self {
        match direction {
            Some(Direction::Up) => ActualDirection::Up,
            Some(Direction::Down) => ActualDirection::Down,
            Some(Direction::Neutral) => ActualDirection::Neutral,
            None => ActualDirection::Unknown,
        }
    }
}

impl fmt::Display for ActualDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the prediction accuracy log
///
/// Deserialized lines are normalized so that `accuracy` is derived from the
/// actual direction and is `None` exactly when that direction is unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EvaluationLine")]
pub struct EvaluationRecord {
    /// Date the evaluated prediction was made for
    pub date: NaiveDate,
    pub symbol: String,
    pub predicted_direction: Direction,
    pub actual_direction: ActualDirection,
    /// Stated confidence of the prediction (0 - 100)
    pub confidence: u8,
    /// `None` when the actual direction could not be determined
    pub accuracy: Option<bool>,
}

/// Accuracy log line as stored, before normalization
#[derive(Deserialize)]
struct EvaluationLine {
    date: NaiveDate,
    symbol: String,
    predicted_direction: Direction,
    #[serde(default)]
    actual_direction: ActualDirection,
    #[serde(default, deserialize_with = "deserialize_confidence")]
    confidence: u8,
}

impl From<EvaluationLine> for EvaluationRecord {
    fn from(line: EvaluationLine) -> Self {
        EvaluationRecord::new(
            line.date,
            line.symbol,
            line.predicted_direction,
            line.actual_direction.known(),
            line.confidence,
        )
    }
}

impl EvaluationRecord {
    /// Build a record; accuracy is set exactly when the actual direction is known
    pub fn new(
        date: NaiveDate,
        symbol: impl Into<String>,
        predicted_direction: Direction,
        actual: Option<Direction>,
        confidence: u8,
    ) -> Self {
        Self {
            date,
            symbol: symbol.into(),
            predicted_direction,
            actual_direction: ActualDirection::from(actual),
            confidence: confidence.min(100),
            accuracy: actual.map(|a| a == predicted_direction),
        }
    }
}

/// Older logs stored confidence as a float percentage
fn deserialize_confidence<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

/// How stated confidence compares to realized accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalibrationVerdict {
    Overconfident,
    Underconfident,
    #[serde(rename = "Well-calibrated")]
    WellCalibrated,
    #[serde(rename = "No data")]
    NoData,
}

impl CalibrationVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationVerdict::Overconfident => "Overconfident",
            CalibrationVerdict::Underconfident => "Underconfident",
            CalibrationVerdict::WellCalibrated => "Well-calibrated",
            CalibrationVerdict::NoData => "No data",
        }
    }
}

impl fmt::Display for CalibrationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-symbol calibration over a trailing window of the accuracy log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMetric {
    pub symbol: String,
    /// Fraction of evaluable predictions that were correct (0.0 - 1.0)
    pub accuracy_rate: Option<f64>,
    /// Mean stated confidence across every record in the window (0 - 100)
    pub avg_confidence: f64,
    pub calibration: CalibrationVerdict,
    pub suggestion: Option<String>,
}
