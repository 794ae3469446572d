// =============================================================================
// Heikin-Ashi transform
// =============================================================================
//
// Synthetic smoothed candles computed recursively from the prior synthetic
// candle:
//
//   HA_close[i] = (open[i] + high[i] + low[i] + close[i]) / 4
//   HA_open[0]  = (open[0] + close[0]) / 2
//   HA_open[i]  = (HA_open[i-1] + HA_close[i-1]) / 2
//   HA_high[i]  = max(high[i], HA_open[i], HA_close[i])
//   HA_low[i]   = min(low[i],  HA_open[i], HA_close[i])
//
// Each open depends on the previous open and close, so this is a left fold
// with a carried accumulator, not a per-row map.

use crate::market_data::candle::{Candle, CandleSeries};
use crate::market_data::error::MarketDataError;

/// Accumulator carried between iterations of the fold.
struct HaState {
    prev_open: f64,
    prev_close: f64,
}

/// Transform a canonical series into its Heikin-Ashi counterpart.
///
/// The output has the same length and time index as the (validated) input;
/// timestamps and volume fields are carried through untouched. Rows with
/// non-finite OHLC are dropped before the fold. An empty input returns an
/// empty series; a non-empty input with zero valid rows is an error.
pub fn heikin_ashi(series: &CandleSeries) -> Result<CandleSeries, MarketDataError> {
    if series.is_empty() {
        return Ok(CandleSeries::default());
    }

    let valid: Vec<Candle> = series
        .iter()
        .filter(|c| c.has_finite_ohlc())
        .cloned()
        .collect();
    if valid.is_empty() {
        return Err(MarketDataError::InsufficientData(
            "no rows with finite OHLC values",
        ));
    }

    let mut out = Vec::with_capacity(valid.len());
    let mut state: Option<HaState> = None;

    for candle in valid {
        let ha_close = (candle.open + candle.high + candle.low + candle.close) / 4.0;
        let ha_open = match &state {
            // Seed from the first row's raw open and close.
            None => (candle.open + candle.close) / 2.0,
            Some(s) => (s.prev_open + s.prev_close) / 2.0,
        };
        let ha_high = candle.high.max(ha_open).max(ha_close);
        let ha_low = candle.low.min(ha_open).min(ha_close);

        state = Some(HaState {
            prev_open: ha_open,
            prev_close: ha_close,
        });

        out.push(Candle {
            open: ha_open,
            high: ha_high,
            low: ha_low,
            close: ha_close,
            ..candle
        });
    }

    Ok(CandleSeries::from_sorted(out))
}
