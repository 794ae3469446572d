// =============================================================================
// Runtime Configuration — feed settings with atomic save
// =============================================================================
//
// Central configuration for the Borealis feed. Persistence uses an atomic
// tmp + rename pattern to prevent corruption on crash. All fields carry
// serde defaults so that adding new fields never breaks loading an older
// config file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{ExchangeId, KlineInterval};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbols() -> Vec<String> {
    vec![
        "BTCUSDT".to_string(),
        "ETHUSDT".to_string(),
        "BNBUSDT".to_string(),
        "XRPUSDT".to_string(),
        "SOLUSDT".to_string(),
    ]
}

fn default_queue_capacity() -> usize {
    512
}

fn default_kline_fetch_limit() -> u32 {
    200
}

fn default_analysis_interval_secs() -> u64 {
    60
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Exchange the batch pipeline fetches klines from.
    #[serde(default)]
    pub exchange: ExchangeId,

    /// Symbols the feed subscribes to and analyses.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Interval of the live kline subscription; also the per-symbol
    /// emission cooldown.
    #[serde(default)]
    pub stream_interval: KlineInterval,

    /// Capacity of the bounded queue between feed callbacks and the
    /// publisher task. Overflow sheds the newest event.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How many klines a batch fetch requests per symbol.
    #[serde(default = "default_kline_fetch_limit")]
    pub kline_fetch_limit: u32,

    /// Seconds between batch analysis runs.
    #[serde(default = "default_analysis_interval_secs")]
    pub analysis_interval_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            exchange: ExchangeId::Binance,
            symbols: default_symbols(),
            stream_interval: KlineInterval::FifteenMinutes,
            queue_capacity: default_queue_capacity(),
            kline_fetch_limit: default_kline_fetch_limit(),
            analysis_interval_secs: default_analysis_interval_secs(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            exchange = %config.exchange,
            symbols = ?config.symbols,
            interval = %config.stream_interval,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.exchange, ExchangeId::Binance);
        assert_eq!(cfg.symbols.len(), 5);
        assert_eq!(cfg.symbols[0], "BTCUSDT");
        assert_eq!(cfg.stream_interval, KlineInterval::FifteenMinutes);
        assert_eq!(cfg.queue_capacity, 512);
        assert_eq!(cfg.kline_fetch_limit, 200);
        assert_eq!(cfg.analysis_interval_secs, 60);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.exchange, ExchangeId::Binance);
        assert_eq!(cfg.queue_capacity, 512);
        assert_eq!(cfg.stream_interval, KlineInterval::FifteenMinutes);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "exchange": "kucoin", "symbols": ["ETHUSDT"], "stream_interval": "1m" }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.exchange, ExchangeId::Kucoin);
        assert_eq!(cfg.symbols, vec!["ETHUSDT"]);
        assert_eq!(cfg.stream_interval, KlineInterval::OneMinute);
        assert_eq!(cfg.kline_fetch_limit, 200);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = RuntimeConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.symbols, cfg2.symbols);
        assert_eq!(cfg.exchange, cfg2.exchange);
        assert_eq!(cfg.queue_capacity, cfg2.queue_capacity);
    }
}
