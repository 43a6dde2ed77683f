//! Accuracy Evaluator
//!
//! Compares a previous day's predictions with the actual closing-price move
//! and produces accuracy history records.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use forecast_core::{Direction, EvaluationRecord, PredictionBatch, PriceQuoteSource};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

/// Evaluates predictions against closing prices
pub struct AccuracyEvaluator {
    quotes: Arc<dyn PriceQuoteSource>,
    max_concurrency: usize,
}

impl AccuracyEvaluator {
    pub fn new(quotes: Arc<dyn PriceQuoteSource>) -> Self {
        Self {
            quotes,
            max_concurrency: 1,
        }
    }

    /// Allow several symbols' quotes in flight at once
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Closing price as a decimal, `None` when absent, unparsable or failed
    async fn close(&self, symbol: &str, date: NaiveDate) -> Option<Decimal> {
        match self.quotes.closing_price(symbol, date).await {
            Ok(Some(raw)) => match Decimal::from_str(raw.trim()) {
                Ok(price) => Some(price),
                Err(e) => {
                    warn!("{} close on {} is not a number ({:?}): {}", symbol, date, raw, e);
                    None
                }
            },
            Ok(None) => {
                debug!("No close for {} on {}", symbol, date);
                None
            }
            Err(e) => {
                warn!("Failed to fetch {} close on {}: {}", symbol, date, e);
                None
            }
        }
    }

    /// Price move from `reference_date` to the following day
    #[instrument(skip(self))]
    pub async fn fetch_actual_direction(
        &self,
        symbol: &str,
        reference_date: NaiveDate,
    ) -> Option<Direction> {
        let next_date = reference_date.checked_add_days(Days::new(1))?;

        let before = self.close(symbol, reference_date).await?;
        let after = self.close(symbol, next_date).await?;

        let direction = match after.cmp(&before) {
            std::cmp::Ordering::Greater => Direction::Up,
            std::cmp::Ordering::Less => Direction::Down,
            std::cmp::Ordering::Equal => Direction::Neutral,
        };
        debug!("{}: {} -> {} ({})", symbol, before, after, direction);
        Some(direction)
    }

    /// One record per requested symbol that has a prediction in `batch`
    ///
    /// Symbols without a prediction are skipped. Output follows `symbols` order.
    #[instrument(skip(self, symbols, batch), fields(batch_date = %batch.date))]
    pub async fn evaluate(&self, symbols: &[String], batch: &PredictionBatch) -> Vec<EvaluationRecord> {
        let predictions: Vec<_> = symbols
            .iter()
            .filter_map(|symbol| {
                let found = batch.find(symbol);
                if found.is_none() {
                    debug!("No prediction for {} in batch {}", symbol, batch.date);
                }
                found
            })
            .collect();

        let records: Vec<EvaluationRecord> = stream::iter(predictions)
            .map(|prediction| async move {
                let actual = self
                    .fetch_actual_direction(&prediction.symbol, prediction.date)
                    .await;
                EvaluationRecord::new(
                    prediction.date,
                    prediction.symbol.clone(),
                    prediction.direction,
                    actual,
                    prediction.confidence.rounded(),
                )
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let known = records.iter().filter(|r| r.accuracy.is_some()).count();
        info!(
            "Evaluated {} predictions from {} ({} with price data)",
            records.len(),
            batch.date,
            known
        );
        records
    }
}
