// =============================================================================
// Rate-limit tracker — request-weight accounting for the kline fetcher
// =============================================================================
//
// Binance reports the weight consumed in the current minute through the
// `X-MBX-USED-WEIGHT-1M` response header. The tracker mirrors that number in
// an atomic counter any task can query lock-free, and the fetcher asks it
// before spending more weight.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, warn};

/// Hard ceiling at which we refuse to send additional requests (the exchange
/// cuts off at 1200; we stop short of it).
const WEIGHT_HARD_LIMIT: u32 = 1000;
/// Soft warning threshold.
const WEIGHT_WARN_THRESHOLD: u32 = 800;

/// Thread-safe request-weight tracker.
#[derive(Default)]
pub struct RateLimitTracker {
    used_weight_1m: AtomicU32,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the counter from the response headers of a completed request.
    pub fn update_from_headers(&self, headers: &reqwest::header::HeaderMap) {
        let Some(weight) = headers
            .get("X-MBX-USED-WEIGHT-1M")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok())
        else {
            return;
        };

        let prev = self.used_weight_1m.swap(weight, Ordering::Relaxed);
        if weight >= WEIGHT_WARN_THRESHOLD && prev < WEIGHT_WARN_THRESHOLD {
            warn!(
                used_weight = weight,
                hard_limit = WEIGHT_HARD_LIMIT,
                "request weight crossed warning threshold"
            );
        } else {
            debug!(used_weight_1m = weight, "request weight updated from header");
        }
    }

    /// Whether `weight` more units fit under the hard limit.
    pub fn can_send_request(&self, weight: u32) -> bool {
        let current = self.used_weight_1m.load(Ordering::Relaxed);
        let allowed = current + weight <= WEIGHT_HARD_LIMIT;
        if !allowed {
            warn!(
                current_weight = current,
                requested_weight = weight,
                hard_limit = WEIGHT_HARD_LIMIT,
                "request blocked — would exceed rate limit"
            );
        }
        allowed
    }

    /// Current used weight as last reported by the exchange.
    pub fn used_weight(&self) -> u32 {
        self.used_weight_1m.load(Ordering::Relaxed)
    }

    /// Reset the counter (call when the exchange's minute window rolls over).
    pub fn reset(&self) {
        self.used_weight_1m.store(0, Ordering::Relaxed);
    }
}
