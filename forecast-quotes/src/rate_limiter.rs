//! Request spacing for quota-limited quote APIs
//!
//! Alpha Vantage's free tier allows 5 requests per minute. Evaluating a whole
//! watchlist in one run easily exceeds that, so calls are spaced out rather
//! than fired in a burst and rejected with a "Note" payload.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Minimum spacing between Alpha Vantage calls on the free tier (5 per minute)
pub const ALPHA_VANTAGE_FREE_TIER_INTERVAL_MS: u64 = 12_000;

/// Reservation-based limiter enforcing a minimum gap between requests
///
/// Each caller reserves its slot while holding the lock and sleeps after
/// releasing it, so concurrent callers are handed distinct, evenly spaced slots.
#[derive(Debug)]
pub struct RateLimiter {
    /// Earliest instant the next request may start
    next_slot: Mutex<Option<Instant>>,
    min_interval: Duration,
    name: String,
    total_requests: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter with the given minimum interval between requests
    pub fn new(min_interval: Duration, name: &str) -> Self {
        Self {
            next_slot: Mutex::new(None),
            min_interval,
            name: name.to_string(),
            total_requests: AtomicU64::new(0),
        }
    }

    /// Limiter matching the Alpha Vantage free tier
    pub fn for_alpha_vantage() -> Self {
        Self::new(
            Duration::from_millis(ALPHA_VANTAGE_FREE_TIER_INTERVAL_MS),
            "AlphaVantage",
        )
    }

    /// Wait until this caller's reserved slot arrives
    pub async fn acquire(&self) {
        let request_num = self.total_requests.fetch_add(1, Ordering::Relaxed) + 1;

        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next_slot = Some(slot + self.min_interval);
            slot
        };

        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            debug!(
                "[RATE_LIMITER:{}] request #{} waiting {:?}",
                self.name, request_num, wait
            );
            tokio::time::sleep_until(slot).await;
        }
    }
}
