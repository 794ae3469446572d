// =============================================================================
// Stream ingestor — dedupe, throttle, and forward live candle events
// =============================================================================
//
// Feed callbacks are cheap, non-blocking producers: they validate the event,
// apply the per-symbol cooldown, and try_send a normalized payload into one
// bounded queue shared across all symbols. A single consumer task drains the
// queue and performs the (potentially blocking) publish call, so feed latency
// never couples to publish latency.
//
// Backpressure sheds instead of blocking: when the queue is full the new
// event is dropped and counted. Freshness beats completeness for a live
// telemetry feed — an old buffered event is never worth stalling a new one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::market_data::normalizer::coerce_f64;
use crate::stream::publisher::{KlineMessage, KlinePayload, Publisher, KLINES_STORE_TOPIC};
use crate::types::KlineInterval;

/// A live feed kline event carries at least
/// [event_time_sec, open, close, high, low, volume].
const MIN_EVENT_FIELDS: usize = 6;

/// Per-symbol emission state. Created on the first event for a symbol and
/// mutated on every accepted emission; never persisted across restarts.
#[derive(Debug, Clone)]
struct StreamState {
    last_emission_ms: i64,
    cooldown_ms: i64,
}

/// Ingests live kline events for any number of symbols and feeds the
/// forwarder queue. One instance per subscribed interval.
pub struct StreamIngestor {
    interval: KlineInterval,
    /// Throttle state per symbol, owned here — lifecycle tied to the
    /// ingestor, not the process.
    states: Mutex<HashMap<String, StreamState>>,
    tx: mpsc::Sender<KlineMessage>,
    dropped: AtomicU64,
}

impl StreamIngestor {
    /// Build an ingestor with a bounded queue of `capacity` messages.
    /// Returns the receiving end for [`run_forwarder`].
    pub fn new(
        interval: KlineInterval,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<KlineMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Arc::new(Self {
                interval,
                states: Mutex::new(HashMap::new()),
                tx,
                dropped: AtomicU64::new(0),
            }),
            rx,
        )
    }

    /// Handle one raw kline event from a feed callback.
    ///
    /// Returns `true` when the event was accepted and enqueued. Rejections
    /// (short rows, zero volume, throttled, queue full) are all silent from
    /// the feed's point of view — the stream keeps running.
    pub fn handle_event(&self, symbol: &str, candles: &[Value]) -> bool {
        // A row without volume is a not-yet-closed or malformed update.
        if candles.len() < MIN_EVENT_FIELDS {
            return false;
        }
        let volume = match coerce_f64(&candles[5]) {
            Some(v) if v != 0.0 => v,
            _ => return false,
        };
        let Some(ts_sec) = coerce_f64(&candles[0]).map(|t| t as i64) else {
            return false;
        };
        let ts_ms = ts_sec * 1000;

        // Per-symbol cooldown: at most one emission per interval.
        {
            let mut states = self.states.lock();
            let state = states.entry(symbol.to_string()).or_insert(StreamState {
                last_emission_ms: 0,
                cooldown_ms: self.interval.as_millis(),
            });
            if ts_ms - state.last_emission_ms < state.cooldown_ms {
                debug!(symbol = %symbol, ts_ms, "event throttled");
                return false;
            }
            state.last_emission_ms = ts_ms;
        }

        let payload = KlinePayload {
            symbol: symbol.to_string(),
            open_time: ts_ms.to_string(),
            close_time: ((ts_sec + self.interval.as_secs()) * 1000).to_string(),
            open_price: scalar_to_string(&candles[1]),
            close_price: scalar_to_string(&candles[2]),
            high_price: scalar_to_string(&candles[3]),
            low_price: scalar_to_string(&candles[4]),
            volume: volume.to_string(),
        };
        let message = KlineMessage {
            key: symbol.to_string(),
            timestamp_ms: ts_ms,
            payload,
        };

        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(symbol = %symbol, "queue full, dropping kline event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(symbol = %symbol, "forwarder queue closed, dropping kline event");
                false
            }
        }
    }

    /// Number of events shed because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Drain the queue and publish every message in arrival order.
///
/// Runs until the queue closes (all ingestors dropped) or the publisher
/// fails; a publish error propagates to the caller, which decides whether
/// to restart. Per symbol, enqueue order equals publish order — there is a
/// single consumer and the channel is FIFO.
pub async fn run_forwarder<P: Publisher>(
    mut rx: mpsc::Receiver<KlineMessage>,
    publisher: P,
) -> Result<()> {
    while let Some(message) = rx.recv().await {
        publisher
            .publish(
                KLINES_STORE_TOPIC,
                &message.key,
                message.timestamp_ms,
                &message.payload,
            )
            .await?;
    }
    Ok(())
}

/// Render a JSON scalar the way it arrived (strings pass through, numbers
/// format themselves).
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;
    use serde_json::json;

    const COOLDOWN_SEC: i64 = 900; // 15m

    fn event(ts_sec: i64, volume: &str) -> Vec<Value> {
        vec![
            json!(ts_sec.to_string()),
            json!("100.0"),
            json!("101.0"),
            json!("102.0"),
            json!("99.0"),
            json!(volume),
            json!("1000.0"),
        ]
    }

    fn ingestor(capacity: usize) -> (Arc<StreamIngestor>, mpsc::Receiver<KlineMessage>) {
        StreamIngestor::new(KlineInterval::FifteenMinutes, capacity)
    }

    #[test]
    fn accepts_valid_event_and_builds_payload() {
        let (ing, mut rx) = ingestor(8);
        assert!(ing.handle_event("BTCUSDT", &event(1_000, "5.5")));
        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.key, "BTCUSDT");
        assert_eq!(msg.timestamp_ms, 1_000_000);
        assert_eq!(msg.payload.open_time, "1000000");
        assert_eq!(msg.payload.close_time, ((1_000 + COOLDOWN_SEC) * 1000).to_string());
        assert_eq!(msg.payload.open_price, "100.0");
        assert_eq!(msg.payload.close_price, "101.0");
        assert_eq!(msg.payload.high_price, "102.0");
        assert_eq!(msg.payload.low_price, "99.0");
        assert_eq!(msg.payload.volume, "5.5");
    }

    #[test]
    fn rejects_short_rows_and_zero_volume() {
        let (ing, mut rx) = ingestor(8);
        assert!(!ing.handle_event("BTCUSDT", &event(1_000, "5.5")[..5].to_vec()));
        assert!(!ing.handle_event("BTCUSDT", &event(1_000, "0")));
        assert!(!ing.handle_event("BTCUSDT", &event(1_000, "garbage")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn throttle_drops_events_inside_cooldown() {
        let (ing, mut rx) = ingestor(8);
        let t0 = 1_000i64;
        assert!(ing.handle_event("BTCUSDT", &event(t0, "1.0")));
        // One millisecond short of the cooldown: dropped.
        let just_inside = t0 + COOLDOWN_SEC - 1;
        assert!(!ing.handle_event("BTCUSDT", &event(just_inside, "1.0")));
        // Exactly one cooldown later: accepted.
        let at_cooldown = t0 + COOLDOWN_SEC;
        assert!(ing.handle_event("BTCUSDT", &event(at_cooldown, "1.0")));

        assert_eq!(rx.try_recv().unwrap().timestamp_ms, t0 * 1000);
        assert_eq!(rx.try_recv().unwrap().timestamp_ms, at_cooldown * 1000);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn throttle_is_per_symbol() {
        let (ing, mut rx) = ingestor(8);
        assert!(ing.handle_event("BTCUSDT", &event(1_000, "1.0")));
        // Different symbol, same timestamp: its own state, accepted.
        assert!(ing.handle_event("ETHUSDT", &event(1_000, "1.0")));
        assert_eq!(rx.try_recv().unwrap().key, "BTCUSDT");
        assert_eq!(rx.try_recv().unwrap().key, "ETHUSDT");
    }

    #[test]
    fn full_queue_sheds_and_counts() {
        let (ing, _rx) = ingestor(1);
        assert!(ing.handle_event("AAAUSDT", &event(1_000, "1.0")));
        // Queue capacity 1: the next accepted-by-throttle event is shed.
        assert!(!ing.handle_event("BBBUSDT", &event(1_000, "1.0")));
        assert_eq!(ing.dropped_count(), 1);
        // Throttled events do not count as drops.
        assert!(!ing.handle_event("AAAUSDT", &event(1_000, "1.0")));
        assert_eq!(ing.dropped_count(), 1);
    }

    /// Publisher capturing everything it is asked to publish.
    #[derive(Default)]
    struct RecordingPublisher {
        seen: PlMutex<Vec<(String, i64, KlinePayload)>>,
    }

    impl Publisher for &RecordingPublisher {
        async fn publish(
            &self,
            _topic: &str,
            key: &str,
            timestamp_ms: i64,
            payload: &KlinePayload,
        ) -> Result<()> {
            self.seen
                .lock()
                .push((key.to_string(), timestamp_ms, payload.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn forwarder_preserves_enqueue_order() {
        let (ing, rx) = ingestor(8);
        assert!(ing.handle_event("BTCUSDT", &event(1_000, "1.0")));
        assert!(ing.handle_event("ETHUSDT", &event(1_000, "2.0")));
        assert!(ing.handle_event("BTCUSDT", &event(1_000 + COOLDOWN_SEC, "3.0")));
        drop(ing); // close the channel so the forwarder terminates

        let recorder = RecordingPublisher::default();
        run_forwarder(rx, &recorder).await.unwrap();

        let seen = recorder.seen.lock();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, "BTCUSDT");
        assert_eq!(seen[1].0, "ETHUSDT");
        assert_eq!(seen[2].0, "BTCUSDT");
        assert!(seen[0].1 < seen[2].1, "per-symbol order preserved");
    }

    #[tokio::test]
    async fn forwarder_surfaces_publisher_errors() {
        struct FailingPublisher;
        impl Publisher for FailingPublisher {
            async fn publish(
                &self,
                _topic: &str,
                _key: &str,
                _timestamp_ms: i64,
                _payload: &KlinePayload,
            ) -> Result<()> {
                anyhow::bail!("broker unavailable")
            }
        }

        let (ing, rx) = ingestor(8);
        assert!(ing.handle_event("BTCUSDT", &event(1_000, "1.0")));
        drop(ing);

        let err = run_forwarder(rx, FailingPublisher).await.unwrap_err();
        assert!(err.to_string().contains("broker unavailable"));
    }
}
