// =============================================================================
// Canonical candle record and the ordered series that holds it
// =============================================================================
//
// Every exchange-specific layout is remapped into `Candle` by the normalizer;
// from that point on the rest of the pipeline only ever sees this one shape.
// A `CandleSeries` is strictly ascending by open_time with no duplicate
// timestamps; transforms produce new series rather than mutating in place.

use serde::{Deserialize, Serialize};

/// A single OHLCV candle in canonical layout, independent of exchange origin.
///
/// Timestamps are UNIX epoch milliseconds. The three trailing fields are only
/// delivered by Binance; KuCoin batches leave them `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
    pub quote_volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taker_buy_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taker_buy_quote_volume: Option<f64>,
}

impl Candle {
    /// Midpoint of the bar's range, used by band-style indicators.
    pub fn hl2(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// True when all four OHLC values are finite numbers.
    pub fn has_finite_ohlc(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }
}

/// An ordered candle sequence: strictly ascending `open_time`, no duplicates.
///
/// The only way to build one from unordered data is [`CandleSeries::from_unordered`],
/// which sorts and deduplicates (last write wins). Transform outputs that
/// preserve order use [`CandleSeries::from_sorted`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries(Vec<Candle>);

impl CandleSeries {
    /// Build a series from candles in arbitrary order.
    ///
    /// Sorts ascending by `open_time`; when two candles share a timestamp the
    /// later entry in the input wins (a refreshed version of the same bar).
    pub fn from_unordered(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.open_time);
        let mut deduped: Vec<Candle> = Vec::with_capacity(candles.len());
        for candle in candles {
            match deduped.last() {
                Some(last) if last.open_time == candle.open_time => {
                    *deduped.last_mut().expect("non-empty after match") = candle;
                }
                _ => deduped.push(candle),
            }
        }
        Self(deduped)
    }

    /// Wrap candles that are already strictly ascending and deduplicated.
    ///
    /// Debug builds assert the invariant; transforms that walk an existing
    /// series in order use this to avoid a redundant sort.
    pub fn from_sorted(candles: Vec<Candle>) -> Self {
        debug_assert!(
            candles.windows(2).all(|w| w[0].open_time < w[1].open_time),
            "from_sorted requires strictly ascending open_time"
        );
        Self(candles)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.0
    }

    pub fn first(&self) -> Option<&Candle> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.0.last()
    }

    /// Close prices in series order.
    pub fn closes(&self) -> Vec<f64> {
        self.0.iter().map(|c| c.close).collect()
    }
}

impl std::ops::Index<usize> for CandleSeries {
    type Output = Candle;

    fn index(&self, index: usize) -> &Candle {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
