// =============================================================================
// Public kline REST fetcher — Binance and KuCoin
// =============================================================================
//
// Only the unauthenticated market-data endpoints live here; nothing in this
// client signs requests or touches account state. The fetcher returns raw
// positional rows exactly as the exchange delivered them — the normalizer
// owns layout detection and remapping.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::exchange::rate_limit::RateLimitTracker;
use crate::exchange::to_kucoin_symbol;
use crate::types::{ExchangeId, KlineInterval};

const BINANCE_BASE_URL: &str = "https://api.binance.com";
const KUCOIN_BASE_URL: &str = "https://api.kucoin.com";

/// Request weight Binance charges for a kline fetch at the limits used here.
const KLINES_REQUEST_WEIGHT: u32 = 2;

/// HTTP client for public market-data endpoints.
#[derive(Clone)]
pub struct MarketDataClient {
    client: reqwest::Client,
    rate_limits: Arc<RateLimitTracker>,
    binance_base: String,
    kucoin_base: String,
}

impl MarketDataClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            rate_limits: Arc::new(RateLimitTracker::new()),
            binance_base: BINANCE_BASE_URL.to_string(),
            kucoin_base: KUCOIN_BASE_URL.to_string(),
        }
    }

    pub fn rate_limits(&self) -> &RateLimitTracker {
        &self.rate_limits
    }

    /// Fetch up to `limit` klines as raw positional rows, oldest ordering as
    /// delivered by the exchange (the normalizer sorts).
    #[instrument(skip(self), name = "rest::fetch_klines")]
    pub async fn fetch_klines(
        &self,
        exchange: ExchangeId,
        symbol: &str,
        interval: KlineInterval,
        limit: u32,
    ) -> Result<Vec<Vec<Value>>> {
        match exchange {
            ExchangeId::Binance => self.fetch_binance_klines(symbol, interval, limit).await,
            ExchangeId::Kucoin => self.fetch_kucoin_klines(symbol, interval).await,
        }
    }

    /// GET /api/v3/uiKlines — rows come back as a bare JSON array of arrays.
    async fn fetch_binance_klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: u32,
    ) -> Result<Vec<Vec<Value>>> {
        if !self.rate_limits.can_send_request(KLINES_REQUEST_WEIGHT) {
            anyhow::bail!("request weight budget exhausted, refusing kline fetch");
        }

        let url = format!(
            "{}/api/v3/uiKlines?symbol={}&interval={}&limit={}",
            self.binance_base,
            symbol,
            interval.binance_code(),
            limit
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /api/v3/uiKlines request failed")?;

        self.rate_limits.update_from_headers(resp.headers());

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse uiKlines response")?;

        if !status.is_success() {
            anyhow::bail!("Binance uiKlines returned {status}: {body}");
        }

        let rows = rows_from_value(body).context("uiKlines response is not an array of rows")?;
        debug!(symbol = %symbol, rows = rows.len(), "binance klines fetched");
        Ok(rows)
    }

    /// GET /api/v1/market/candles — rows wrapped in a `{code, data}` envelope,
    /// newest first.
    async fn fetch_kucoin_klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
    ) -> Result<Vec<Vec<Value>>> {
        let kucoin_symbol = to_kucoin_symbol(symbol);
        let url = format!(
            "{}/api/v1/market/candles?type={}&symbol={}",
            self.kucoin_base,
            interval.kucoin_code(),
            kucoin_symbol
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /api/v1/market/candles request failed")?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse candles response")?;

        if !status.is_success() {
            anyhow::bail!("KuCoin candles returned {status}: {body}");
        }

        let code = body["code"].as_str().unwrap_or_default();
        if code != "200000" {
            anyhow::bail!("KuCoin candles returned code {code}: {body}");
        }

        let rows = rows_from_value(body["data"].clone())
            .context("candles response data is not an array of rows")?;
        debug!(symbol = %kucoin_symbol, rows = rows.len(), "kucoin klines fetched");
        Ok(rows)
    }
}

impl Default for MarketDataClient {
    fn default() -> Self {
        Self::new()
    }
}

fn rows_from_value(value: Value) -> Option<Vec<Vec<Value>>> {
    let Value::Array(rows) = value else {
        return None;
    };
    rows.into_iter()
        .map(|row| match row {
            Value::Array(cells) => Some(cells),
            _ => None,
        })
        .collect()
}
