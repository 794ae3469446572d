// =============================================================================
// KuCoin kline websocket feed
// =============================================================================
//
// KuCoin gates its public websocket behind a token handshake: POST
// /api/v1/bullet-public returns a short-lived token plus the endpoint and
// ping cadence to use. After connecting we subscribe to the candles topic for
// the symbol and hand every kline event to the ingestor.
//
// The loop runs until the stream disconnects or a read error occurs, then
// returns so the caller (main.rs) can handle reconnection. Parse failures on
// individual messages are logged and swallowed — a bad frame must not take
// the feed down.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::exchange::{from_kucoin_symbol, to_kucoin_symbol};
use crate::stream::ingestor::StreamIngestor;
use crate::types::KlineInterval;

const BULLET_PUBLIC_URL: &str = "https://api.kucoin.com/api/v1/bullet-public";
const DEFAULT_PING_INTERVAL_MS: u64 = 18_000;

/// Connect to the KuCoin candles stream for one symbol and feed events into
/// `ingestor` until the connection drops.
pub async fn run_kline_feed(
    symbol: &str,
    interval: KlineInterval,
    ingestor: &Arc<StreamIngestor>,
) -> Result<()> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("failed to build bullet-public HTTP client")?;

    let (ws_url, ping_every) = ws_endpoint(&http).await?;
    let kucoin_symbol = to_kucoin_symbol(symbol);
    let topic = format!("/market/candles:{}_{}", kucoin_symbol, interval.kucoin_code());

    info!(symbol = %kucoin_symbol, topic = %topic, "connecting to kline websocket");
    let (ws_stream, _response) = connect_async(&ws_url)
        .await
        .context("failed to connect to kline websocket")?;
    info!(symbol = %kucoin_symbol, "kline websocket connected");

    let (mut write, mut read) = ws_stream.split();

    let subscribe = json!({
        "id": chrono::Utc::now().timestamp_millis(),
        "type": "subscribe",
        "topic": topic,
        "privateChannel": false,
        "response": true,
    });
    write
        .send(Message::Text(subscribe.to_string()))
        .await
        .context("failed to send subscribe message")?;
    info!(symbol = %kucoin_symbol, interval = %interval, "kline subscription requested");

    let mut ping_timer = tokio::time::interval(ping_every);
    ping_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ping_timer.tick().await; // first tick fires immediately; skip it

    loop {
        tokio::select! {
            _ = ping_timer.tick() => {
                let ping = json!({
                    "id": chrono::Utc::now().timestamp_millis(),
                    "type": "ping",
                });
                write
                    .send(Message::Text(ping.to_string()))
                    .await
                    .context("failed to send websocket ping")?;
            }
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = dispatch_message(&text, symbol, ingestor) {
                        warn!(error = %e, "failed to handle kline message");
                    }
                }
                // tungstenite answers protocol pings itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!(symbol = %kucoin_symbol, error = %e, "kline websocket read error");
                    return Err(e.into());
                }
                None => {
                    warn!(symbol = %kucoin_symbol, "kline websocket stream ended");
                    return Ok(());
                }
            }
        }
    }
}

/// Parse one text frame and, for candle updates, run the ingestor callback.
fn dispatch_message(text: &str, fallback_symbol: &str, ingestor: &Arc<StreamIngestor>) -> Result<()> {
    let root: Value = serde_json::from_str(text).context("failed to parse websocket JSON")?;

    match root["type"].as_str() {
        Some("message") => {}
        // welcome / ack / pong frames carry no candle data.
        Some(other) => {
            debug!(frame_type = %other, "control frame");
            return Ok(());
        }
        None => anyhow::bail!("frame has no type field"),
    }

    let topic = root["topic"].as_str().unwrap_or_default();
    if !topic.starts_with("/market/candles:") {
        return Ok(());
    }

    let data = &root["data"];
    let symbol = data["symbol"]
        .as_str()
        .map(from_kucoin_symbol)
        .unwrap_or_else(|| fallback_symbol.to_string());
    let candles = data["candles"]
        .as_array()
        .context("candle message missing candles array")?;

    let accepted = ingestor.handle_event(&symbol, candles);
    debug!(symbol = %symbol, accepted, "kline event processed");
    Ok(())
}

/// POST bullet-public and assemble the tokenized websocket URL plus the ping
/// cadence the server asked for.
async fn ws_endpoint(client: &reqwest::Client) -> Result<(String, Duration)> {
    let resp = client
        .post(BULLET_PUBLIC_URL)
        .send()
        .await
        .context("bullet-public request failed")?;

    let status = resp.status();
    let body: Value = resp
        .json()
        .await
        .context("failed to parse bullet-public response")?;

    if !status.is_success() {
        anyhow::bail!("bullet-public returned {status}: {body}");
    }

    let token = body["data"]["token"]
        .as_str()
        .context("bullet-public response missing token")?;
    let server = &body["data"]["instanceServers"][0];
    let endpoint = server["endpoint"]
        .as_str()
        .context("bullet-public response missing endpoint")?;
    let ping_ms = server["pingInterval"]
        .as_u64()
        .unwrap_or(DEFAULT_PING_INTERVAL_MS);

    Ok((
        format!("{endpoint}?token={token}"),
        Duration::from_millis(ping_ms),
    ))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ingestor::StreamIngestor;

    fn candle_frame(symbol: &str, ts_sec: i64, volume: &str) -> String {
        json!({
            "type": "message",
            "topic": format!("/market/candles:{symbol}_15min"),
            "subject": "trade.candles.update",
            "data": {
                "symbol": symbol,
                "candles": [
                    ts_sec.to_string(),
                    "9700.1",
                    "9710.5",
                    "9720.0",
                    "9690.0",
                    volume,
                    "53844.0"
                ],
                "time": ts_sec * 1_000_000_000
            }
        })
        .to_string()
    }

    #[test]
    fn candle_message_reaches_ingestor() {
        let (ingestor, mut rx) = StreamIngestor::new(KlineInterval::FifteenMinutes, 8);
        dispatch_message(
            &candle_frame("BTC-USDT", 1_589_968_800, "12.5"),
            "BTCUSDT",
            &ingestor,
        )
        .unwrap();
        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.key, "BTCUSDT");
        assert_eq!(msg.payload.open_price, "9700.1");
    }

    #[test]
    fn control_frames_are_ignored() {
        let (ingestor, mut rx) = StreamIngestor::new(KlineInterval::FifteenMinutes, 8);
        for frame in [
            json!({"type": "welcome", "id": "x"}).to_string(),
            json!({"type": "ack", "id": "y"}).to_string(),
            json!({"type": "pong", "id": "z"}).to_string(),
        ] {
            dispatch_message(&frame, "BTCUSDT", &ingestor).unwrap();
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn non_candle_topics_are_ignored() {
        let (ingestor, mut rx) = StreamIngestor::new(KlineInterval::FifteenMinutes, 8);
        let frame = json!({
            "type": "message",
            "topic": "/market/ticker:BTC-USDT",
            "data": {"price": "9700"}
        })
        .to_string();
        dispatch_message(&frame, "BTCUSDT", &ingestor).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn malformed_frames_error_without_panicking() {
        let (ingestor, _rx) = StreamIngestor::new(KlineInterval::FifteenMinutes, 8);
        assert!(dispatch_message("not json", "BTCUSDT", &ingestor).is_err());
        assert!(dispatch_message("{}", "BTCUSDT", &ingestor).is_err());
        let no_candles = json!({
            "type": "message",
            "topic": "/market/candles:BTC-USDT_15min",
            "data": {"symbol": "BTC-USDT"}
        })
        .to_string();
        assert!(dispatch_message(&no_candles, "BTCUSDT", &ingestor).is_err());
    }

    #[test]
    fn zero_volume_update_is_dropped_silently() {
        let (ingestor, mut rx) = StreamIngestor::new(KlineInterval::FifteenMinutes, 8);
        dispatch_message(
            &candle_frame("BTC-USDT", 1_589_968_800, "0"),
            "BTCUSDT",
            &ingestor,
        )
        .unwrap();
        assert!(rx.try_recv().is_err());
    }
}
