// =============================================================================
// Format normalizer — raw exchange rows to canonical candles
// =============================================================================
//
// Exchanges deliver klines as positional arrays of mixed scalars and each one
// lays the columns out differently. This module classifies a batch into one of
// the closed layout variants below, remaps every row into `Candle`, and
// returns a sorted, deduplicated `CandleSeries`.
//
// Layouts:
//   Binance        11+ cols: [open_time, open, high, low, close, volume,
//                             close_time, quote_volume, trade_count,
//                             taker_buy_base, taker_buy_quote, ...]
//   KuCoin futures  7 cols:  [time, open, high, low, close, volume, turnover]
//   KuCoin spot     7 cols:  [time, open, close, high, low, volume, turnover]
//
// KuCoin does not tag spot vs futures in the payload; the two are told apart
// by comparing columns 2 and 3 of the first usable row (futures has
// high >= low there, spot has close <= high).

use serde_json::Value;

use crate::market_data::candle::{Candle, CandleSeries};
use crate::market_data::error::MarketDataError;
use crate::types::ExchangeId;

/// Resolved layout variant for a raw batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeFormat {
    Binance,
    KucoinSpot,
    KucoinFutures,
}

/// Canonical Binance kline field count (extra trailing fields are discarded).
const BINANCE_COLUMNS: usize = 11;
/// KuCoin kline field count, identical for spot and futures.
const KUCOIN_COLUMNS: usize = 7;

/// Timestamps at or above this magnitude are microseconds, not milliseconds.
const MICROSECOND_THRESHOLD: f64 = 1e15;

impl ExchangeFormat {
    /// Resolve the layout variant for a batch.
    ///
    /// For KuCoin the spot/futures split is a heuristic, not an exchange
    /// guarantee: a degenerate first row where col2 == col3 (doji with
    /// high == low) classifies as futures. Callers that can know the market
    /// type out of band should prefer that knowledge.
    pub fn detect(exchange: ExchangeId, rows: &[Vec<Value>]) -> Result<Self, MarketDataError> {
        let first = rows.first().ok_or(MarketDataError::EmptySeries)?;
        let width = first.len();

        match exchange {
            ExchangeId::Binance => {
                if width >= BINANCE_COLUMNS {
                    Ok(Self::Binance)
                } else {
                    Err(MarketDataError::Format { exchange, width })
                }
            }
            ExchangeId::Kucoin => {
                if width != KUCOIN_COLUMNS {
                    return Err(MarketDataError::Format { exchange, width });
                }
                // First row where both discriminant columns coerce.
                for row in rows {
                    if row.len() != KUCOIN_COLUMNS {
                        continue;
                    }
                    if let (Some(col2), Some(col3)) = (coerce_f64(&row[2]), coerce_f64(&row[3])) {
                        return Ok(if col2 >= col3 {
                            Self::KucoinFutures
                        } else {
                            Self::KucoinSpot
                        });
                    }
                }
                Err(MarketDataError::EmptySeries)
            }
        }
    }
}

/// Remap a raw batch into a canonical series.
///
/// Rows whose required fields (timestamps and all four OHLC values) cannot be
/// coerced to numbers are dropped. Volume-side fields that fail coercion stay
/// in the row as NaN so downstream aggregation surfaces the gap instead of
/// inventing a zero.
pub fn normalize(
    exchange: ExchangeId,
    rows: &[Vec<Value>],
) -> Result<CandleSeries, MarketDataError> {
    let format = ExchangeFormat::detect(exchange, rows)?;

    let expected_width = match format {
        ExchangeFormat::Binance => BINANCE_COLUMNS,
        ExchangeFormat::KucoinSpot | ExchangeFormat::KucoinFutures => KUCOIN_COLUMNS,
    };

    let mut candles = Vec::with_capacity(rows.len());
    let mut quote_volume_seen = false;

    for row in rows {
        if row.len() < expected_width {
            return Err(MarketDataError::Format {
                exchange,
                width: row.len(),
            });
        }
        if let Some(candle) = remap_row(format, row) {
            if candle.quote_volume.is_finite() {
                quote_volume_seen = true;
            }
            candles.push(candle);
        }
    }

    if candles.is_empty() {
        return Err(MarketDataError::EmptySeries);
    }
    if !quote_volume_seen {
        return Err(MarketDataError::MissingColumns("quote_volume"));
    }

    Ok(CandleSeries::from_unordered(candles))
}

/// Remap one row; `None` when a required field fails numeric coercion.
fn remap_row(format: ExchangeFormat, row: &[Value]) -> Option<Candle> {
    let (open_time, open, high, low, close, volume, close_time, quote_volume) = match format {
        ExchangeFormat::Binance => (
            normalize_timestamp(coerce_f64(&row[0])?),
            coerce_f64(&row[1])?,
            coerce_f64(&row[2])?,
            coerce_f64(&row[3])?,
            coerce_f64(&row[4])?,
            coerce_f64(&row[5]).unwrap_or(f64::NAN),
            normalize_timestamp(coerce_f64(&row[6])?),
            coerce_f64(&row[7]).unwrap_or(f64::NAN),
        ),
        ExchangeFormat::KucoinFutures => {
            let open_time = normalize_timestamp(coerce_f64(&row[0])?);
            (
                open_time,
                coerce_f64(&row[1])?,
                coerce_f64(&row[2])?,
                coerce_f64(&row[3])?,
                coerce_f64(&row[4])?,
                coerce_f64(&row[5]).unwrap_or(f64::NAN),
                // KuCoin has no native close_time.
                open_time,
                coerce_f64(&row[6]).unwrap_or(f64::NAN),
            )
        }
        ExchangeFormat::KucoinSpot => {
            let open_time = normalize_timestamp(coerce_f64(&row[0])?);
            // Spot order is open, close, high, low -- reorder into OHLC.
            let open = coerce_f64(&row[1])?;
            let close = coerce_f64(&row[2])?;
            let high = coerce_f64(&row[3])?;
            let low = coerce_f64(&row[4])?;
            (
                open_time,
                open,
                high,
                low,
                close,
                coerce_f64(&row[5]).unwrap_or(f64::NAN),
                open_time,
                coerce_f64(&row[6]).unwrap_or(f64::NAN),
            )
        }
    };

    let (trade_count, taker_buy_volume, taker_buy_quote_volume) = match format {
        ExchangeFormat::Binance => (
            coerce_u64(&row[8]),
            coerce_f64(&row[9]),
            coerce_f64(&row[10]),
        ),
        _ => (None, None, None),
    };

    Some(Candle {
        open_time,
        open,
        high,
        low,
        close,
        volume,
        close_time,
        quote_volume,
        trade_count,
        taker_buy_volume,
        taker_buy_quote_volume,
    })
}

/// Reduce a timestamp to epoch milliseconds.
///
/// Values at or above 1e15 are microseconds and get divided by 1000; anything
/// below is already milliseconds and passes through untouched.
pub fn normalize_timestamp(ts: f64) -> i64 {
    if ts >= MICROSECOND_THRESHOLD {
        (ts / 1000.0) as i64
    } else {
        ts as i64
    }
}

/// Coerce a JSON scalar to f64. Exchanges deliver numbers both as JSON
/// numbers and as quoted strings, often mixed within one payload.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Coerce a JSON scalar to u64 (trade counts).
fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}
