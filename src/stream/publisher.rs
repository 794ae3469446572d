// =============================================================================
// Outbound publish boundary
// =============================================================================
//
// The downstream bus client is an external collaborator; this module only
// defines the wire payload and the trait the forwarder publishes through.
// Delivery is at-most-once: nothing here retries or buffers beyond the
// ingestor's bounded queue.

use std::future::Future;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Topic dedicated to raw kline storage.
pub const KLINES_STORE_TOPIC: &str = "klines-store";

/// Serialized kline update. Every field is a string — the storage consumer
/// parses decimals itself and string-typed payloads survive schema drift in
/// the numeric precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KlinePayload {
    pub symbol: String,
    pub open_time: String,
    pub close_time: String,
    pub open_price: String,
    pub close_price: String,
    pub high_price: String,
    pub low_price: String,
    pub volume: String,
}

/// Envelope carried through the ingestor queue: the payload plus the
/// partition key and message timestamp the publisher needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineMessage {
    /// Partition / ordering key — the symbol.
    pub key: String,
    /// Event time in epoch milliseconds.
    pub timestamp_ms: i64,
    pub payload: KlinePayload,
}

/// Opaque publish sink for kline messages.
///
/// Implementations own their delivery contract (retries, batching,
/// acknowledgement); the forwarder surfaces their errors and does nothing
/// else with them.
pub trait Publisher: Send + Sync {
    fn publish(
        &self,
        topic: &str,
        key: &str,
        timestamp_ms: i64,
        payload: &KlinePayload,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Publisher that writes each message to the log. Stands in for a real bus
/// client in development and keeps the binary runnable without brokers.
#[derive(Debug, Default, Clone)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        timestamp_ms: i64,
        payload: &KlinePayload,
    ) -> Result<()> {
        let body = serde_json::to_string(payload)?;
        info!(topic = %topic, key = %key, timestamp_ms, payload = %body, "kline published");
        Ok(())
    }
}
