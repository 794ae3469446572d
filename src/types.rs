// =============================================================================
// Shared types used across the Borealis market-data feed
// =============================================================================

use serde::{Deserialize, Serialize};

/// Exchange a raw candle batch or live feed originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    Binance,
    Kucoin,
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::Binance
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binance => write!(f, "binance"),
            Self::Kucoin => write!(f, "kucoin"),
        }
    }
}

/// Candle interval supported by the feed.
///
/// Each variant knows its own duration in milliseconds and the wire codes
/// the two exchanges use for it (Binance `"15m"`, KuCoin `"15min"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KlineInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
}

impl KlineInterval {
    /// Duration of one candle of this interval, in milliseconds.
    pub const fn as_millis(&self) -> i64 {
        match self {
            Self::OneMinute => 60_000,
            Self::FiveMinutes => 300_000,
            Self::FifteenMinutes => 900_000,
            Self::OneHour => 3_600_000,
            Self::FourHours => 14_400_000,
        }
    }

    /// Duration in whole seconds.
    pub const fn as_secs(&self) -> i64 {
        self.as_millis() / 1000
    }

    /// Interval code used by the Binance REST and websocket APIs.
    pub const fn binance_code(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
            Self::FourHours => "4h",
        }
    }

    /// Interval code used by the KuCoin REST and websocket APIs.
    pub const fn kucoin_code(&self) -> &'static str {
        match self {
            Self::OneMinute => "1min",
            Self::FiveMinutes => "5min",
            Self::FifteenMinutes => "15min",
            Self::OneHour => "1hour",
            Self::FourHours => "4hour",
        }
    }
}

impl Default for KlineInterval {
    fn default() -> Self {
        Self::FifteenMinutes
    }
}

impl std::fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.binance_code())
    }
}
