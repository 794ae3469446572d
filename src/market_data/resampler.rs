// =============================================================================
// Calendar-aligned resampling
// =============================================================================
//
// Aggregates a canonical (or Heikin-Ashi) series into coarser buckets whose
// boundaries sit on calendar marks (every full hour, every fourth hour), not
// at fixed row counts. Buckets with no contributing rows are simply absent.
//
// Input must already be sorted ascending and deduplicated -- that is the
// normalizer's contract. This component does not re-sort; feeding it an
// unsorted series produces undefined bucket contents.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use crate::market_data::candle::{Candle, CandleSeries};
use crate::types::KlineInterval;

/// Resample `series` into calendar-aligned `interval` buckets.
///
/// Per bucket: open = first, high = max, low = min, close = last, volume and
/// quote_volume = sum of finite contributions. The bucket's own `open_time`
/// and `close_time` both equal the bucket boundary timestamp. Optional count
/// and taker fields aggregate by sum only when present in every contributing
/// row, otherwise they come out `None`.
pub fn resample(series: &CandleSeries, interval: KlineInterval) -> CandleSeries {
    let mut out: Vec<Candle> = Vec::new();
    let mut current: Option<(i64, Bucket)> = None;

    for candle in series {
        let boundary = bucket_boundary(candle.open_time, interval);
        match &mut current {
            Some((start, bucket)) if *start == boundary => bucket.absorb(candle),
            _ => {
                if let Some((start, bucket)) = current.take() {
                    out.push(bucket.finish(start));
                }
                current = Some((boundary, Bucket::seed(candle)));
            }
        }
    }
    if let Some((start, bucket)) = current.take() {
        out.push(bucket.finish(start));
    }

    CandleSeries::from_sorted(out)
}

/// Floor a millisecond timestamp onto the calendar grid of `interval`.
fn bucket_boundary(open_time: i64, interval: KlineInterval) -> i64 {
    let step = TimeDelta::milliseconds(interval.as_millis());
    DateTime::<Utc>::from_timestamp_millis(open_time)
        .and_then(|dt| dt.duration_trunc(step).ok())
        .map(|dt| dt.timestamp_millis())
        // Timestamps outside chrono's representable range fall back to plain
        // modulo flooring, which lands on the same grid for the epoch-based
        // intervals used here.
        .unwrap_or_else(|| open_time - open_time.rem_euclid(interval.as_millis()))
}

/// Running aggregation state for one bucket.
struct Bucket {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    quote_volume: f64,
    trade_count: Option<u64>,
    taker_buy_volume: Option<f64>,
    taker_buy_quote_volume: Option<f64>,
}

impl Bucket {
    fn seed(candle: &Candle) -> Self {
        Self {
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: finite_or_zero(candle.volume),
            quote_volume: finite_or_zero(candle.quote_volume),
            trade_count: candle.trade_count,
            taker_buy_volume: candle.taker_buy_volume,
            taker_buy_quote_volume: candle.taker_buy_quote_volume,
        }
    }

    fn absorb(&mut self, candle: &Candle) {
        self.high = self.high.max(candle.high);
        self.low = self.low.min(candle.low);
        self.close = candle.close;
        self.volume += finite_or_zero(candle.volume);
        self.quote_volume += finite_or_zero(candle.quote_volume);
        self.trade_count = match (self.trade_count, candle.trade_count) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        };
        self.taker_buy_volume = sum_opt(self.taker_buy_volume, candle.taker_buy_volume);
        self.taker_buy_quote_volume =
            sum_opt(self.taker_buy_quote_volume, candle.taker_buy_quote_volume);
    }

    fn finish(self, boundary: i64) -> Candle {
        Candle {
            open_time: boundary,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            close_time: boundary,
            quote_volume: self.quote_volume,
            trade_count: self.trade_count,
            taker_buy_volume: self.taker_buy_volume,
            taker_buy_quote_volume: self.taker_buy_quote_volume,
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn sum_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 3_600_000;
    const MIN15_MS: i64 = 900_000;

    fn candle(open_time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            open_time,
            open,
            high,
            low,
            close,
            volume,
            close_time: open_time + MIN15_MS - 1,
            quote_volume: volume * close,
            trade_count: Some(10),
            taker_buy_volume: Some(volume / 2.0),
            taker_buy_quote_volume: Some(volume * close / 2.0),
        }
    }

    #[test]
    fn four_quarters_make_one_hour() {
        let base = 1_700_000_000_000 / HOUR_MS * HOUR_MS; // hour-aligned
        let series = CandleSeries::from_sorted(vec![
            candle(base, 100.0, 105.0, 99.0, 101.0, 1.0),
            candle(base + MIN15_MS, 101.0, 110.0, 100.0, 108.0, 2.0),
            candle(base + 2 * MIN15_MS, 108.0, 109.0, 95.0, 96.0, 3.0),
            candle(base + 3 * MIN15_MS, 96.0, 99.0, 94.0, 98.0, 4.0),
        ]);
        let hourly = resample(&series, KlineInterval::OneHour);
        assert_eq!(hourly.len(), 1);
        let c = &hourly[0];
        assert_eq!(c.open_time, base);
        assert_eq!(c.close_time, base);
        assert!((c.open - 100.0).abs() < f64::EPSILON); // first
        assert!((c.high - 110.0).abs() < f64::EPSILON); // max
        assert!((c.low - 94.0).abs() < f64::EPSILON); // min
        assert!((c.close - 98.0).abs() < f64::EPSILON); // last
        assert!((c.volume - 10.0).abs() < f64::EPSILON); // sum
        assert_eq!(c.trade_count, Some(40));
    }

    #[test]
    fn buckets_follow_calendar_not_row_count() {
        let base = 1_700_000_000_000 / HOUR_MS * HOUR_MS;
        // One row late in hour 0, one row early in hour 1: two buckets even
        // though only two rows total.
        let series = CandleSeries::from_sorted(vec![
            candle(base + 3 * MIN15_MS, 100.0, 101.0, 99.0, 100.0, 1.0),
            candle(base + HOUR_MS, 100.0, 102.0, 98.0, 101.0, 1.0),
        ]);
        let hourly = resample(&series, KlineInterval::OneHour);
        assert_eq!(hourly.len(), 2);
        assert_eq!(hourly[0].open_time, base);
        assert_eq!(hourly[1].open_time, base + HOUR_MS);
    }

    #[test]
    fn gaps_produce_no_synthetic_buckets() {
        let base = 1_700_000_000_000 / HOUR_MS * HOUR_MS;
        let series = CandleSeries::from_sorted(vec![
            candle(base, 100.0, 101.0, 99.0, 100.0, 1.0),
            // Hour 1 entirely missing.
            candle(base + 2 * HOUR_MS, 100.0, 102.0, 98.0, 101.0, 1.0),
        ]);
        let hourly = resample(&series, KlineInterval::OneHour);
        assert_eq!(hourly.len(), 2);
        assert_eq!(hourly[1].open_time, base + 2 * HOUR_MS);
    }

    #[test]
    fn hourly_to_hourly_is_idempotent() {
        let base = 1_700_000_000_000 / HOUR_MS * HOUR_MS;
        let series = CandleSeries::from_sorted(vec![
            candle(base, 100.0, 101.0, 99.0, 100.0, 1.0),
            candle(base + HOUR_MS, 100.0, 102.0, 98.0, 101.0, 2.0),
        ]);
        let once = resample(&series, KlineInterval::OneHour);
        let twice = resample(&once, KlineInterval::OneHour);
        assert_eq!(once, twice);
    }

    #[test]
    fn four_hour_alignment() {
        let base = 1_700_000_000_000 / (4 * HOUR_MS) * (4 * HOUR_MS);
        let series = CandleSeries::from_sorted(vec![
            candle(base + HOUR_MS, 100.0, 101.0, 99.0, 100.0, 1.0),
            candle(base + 3 * HOUR_MS, 100.0, 102.0, 98.0, 101.0, 1.0),
            candle(base + 4 * HOUR_MS, 101.0, 103.0, 100.0, 102.0, 1.0),
        ]);
        let four_hourly = resample(&series, KlineInterval::FourHours);
        assert_eq!(four_hourly.len(), 2);
        assert_eq!(four_hourly[0].open_time, base);
        assert_eq!(four_hourly[1].open_time, base + 4 * HOUR_MS);
        assert!((four_hourly[0].close - 101.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_optional_fields_poison_the_bucket_sum() {
        let base = 1_700_000_000_000 / HOUR_MS * HOUR_MS;
        let mut partial = candle(base + MIN15_MS, 100.0, 101.0, 99.0, 100.0, 1.0);
        partial.trade_count = None;
        partial.taker_buy_volume = None;
        let series = CandleSeries::from_sorted(vec![
            candle(base, 100.0, 101.0, 99.0, 100.0, 1.0),
            partial,
        ]);
        let hourly = resample(&series, KlineInterval::OneHour);
        assert_eq!(hourly[0].trade_count, None);
        assert_eq!(hourly[0].taker_buy_volume, None);
    }

    #[test]
    fn empty_series_resamples_to_empty() {
        let out = resample(&CandleSeries::default(), KlineInterval::OneHour);
        assert!(out.is_empty());
    }
}
