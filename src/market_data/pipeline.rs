// =============================================================================
// Batch pipeline — raw rows to analysis-ready timeframes
// =============================================================================
//
// The standard preparation run for a raw kline batch: normalize into the
// canonical layout, smooth with Heikin-Ashi, then resample the smoothed
// series onto the hourly and four-hourly calendar grids. Strategy code
// applies indicators per timeframe afterwards.
//
// The whole path is synchronous and pure over immutable series; independent
// symbols can run it concurrently with no shared state.

use crate::market_data::candle::CandleSeries;
use crate::market_data::error::MarketDataError;
use crate::market_data::heikin_ashi::heikin_ashi;
use crate::market_data::normalizer::normalize;
use crate::market_data::resampler::resample;
use crate::types::{ExchangeId, KlineInterval};

/// The three series the batch pipeline hands to strategy code.
#[derive(Debug, Clone)]
pub struct TimeframeSeries {
    /// Heikin-Ashi series at the batch's native interval.
    pub base: CandleSeries,
    /// Hourly resample of the base series.
    pub hourly: CandleSeries,
    /// Four-hourly resample of the base series.
    pub four_hourly: CandleSeries,
}

/// Run the full preparation pipeline on a raw batch.
pub fn pre_process(
    exchange: ExchangeId,
    rows: &[Vec<serde_json::Value>],
) -> Result<TimeframeSeries, MarketDataError> {
    let canonical = normalize(exchange, rows)?;
    let base = heikin_ashi(&canonical)?;
    let hourly = resample(&base, KlineInterval::OneHour);
    let four_hourly = resample(&base, KlineInterval::FourHours);
    Ok(TimeframeSeries {
        base,
        hourly,
        four_hourly,
    })
}
