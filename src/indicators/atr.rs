// =============================================================================
// Average True Range
// =============================================================================
//
// True Range per bar:
//   TR = max(high - low, |high - prev_close|, |low - prev_close|)
// The first bar has no previous close, so its TR is simply high - low.
//
// ATR here is the plain rolling mean of TR over the window (not Wilder's
// smoothing); the Supertrend bands are built on this definition.

use crate::indicators::frame::IndicatorFrame;
use crate::indicators::rolling::rolling_mean_opt;
use crate::market_data::Candle;

pub const DEFAULT_WINDOW: usize = 14;

/// Add the `atr` column: rolling mean of the true range.
pub fn atr(mut frame: IndicatorFrame, window: usize) -> IndicatorFrame {
    if frame.is_empty() {
        return frame;
    }
    let tr = true_ranges(frame.candles());
    let column = rolling_mean_opt(&tr, window, window);
    frame.insert_column("atr", column);
    frame
}

/// True range for every bar, first bar falling back to high - low.
fn true_ranges(candles: &[Candle]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(candles.len());
    let mut prev_close: Option<f64> = None;
    for candle in candles {
        let hl = candle.high - candle.low;
        let tr = match prev_close {
            Some(pc) => hl
                .max((candle.high - pc).abs())
                .max((candle.low - pc).abs()),
            None => hl,
        };
        out.push(Some(tr));
        prev_close = Some(candle.close);
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::frame::IndicatorFrame;
    use crate::market_data::CandleSeries;

    fn candle(i: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            open_time: i as i64 * 60_000,
            open,
            high,
            low,
            close,
            volume: 1.0,
            close_time: i as i64 * 60_000 + 59_999,
            quote_volume: 1.0,
            trade_count: None,
            taker_buy_volume: None,
            taker_buy_quote_volume: None,
        }
    }

    fn frame_of(candles: Vec<Candle>) -> IndicatorFrame {
        IndicatorFrame::new(CandleSeries::from_sorted(candles))
    }

    #[test]
    fn first_bar_true_range_is_high_minus_low() {
        let tr = true_ranges(&[candle(0, 100.0, 105.0, 95.0, 95.0)]);
        assert_eq!(tr[0], Some(10.0));
    }

    #[test]
    fn gap_up_uses_previous_close() {
        let candles = vec![
            candle(0, 100.0, 105.0, 95.0, 95.0),
            // Gap up: |115 - 95| = 20 dominates the 7-point bar range.
            candle(1, 110.0, 115.0, 108.0, 112.0),
        ];
        let tr = true_ranges(&candles);
        assert_eq!(tr[1], Some(20.0));
    }

    #[test]
    fn atr_is_mean_of_true_ranges() {
        let candles = vec![
            candle(0, 100.0, 104.0, 96.0, 100.0), // TR 8
            candle(1, 100.0, 103.0, 97.0, 100.0), // TR 6
            candle(2, 100.0, 102.0, 98.0, 100.0), // TR 4
        ];
        let frame = atr(frame_of(candles), 3);
        let col = frame.column("atr").unwrap();
        assert_eq!(col[0], None);
        assert_eq!(col[1], None);
        assert!((col[2].unwrap() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn constant_range_converges_to_range() {
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.1;
                candle(i, base, base + 5.0, base - 5.0, base)
            })
            .collect();
        let frame = atr(frame_of(candles), 14);
        let value = frame.last_value("atr").unwrap();
        assert!((value - 10.0).abs() < 1.0, "expected near 10.0, got {value}");
    }

    #[test]
    fn empty_frame_passes_through() {
        let frame = atr(IndicatorFrame::default(), 14);
        assert!(!frame.has_column("atr"));
    }
}
