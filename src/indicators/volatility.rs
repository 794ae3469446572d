// =============================================================================
// Rolling volatility of percentage returns
// =============================================================================
//
// Standard deviation of bar-to-bar percentage returns over a rolling window.
// Normalizing to returns first makes the figure comparable across assets with
// very different price scales.

use crate::indicators::frame::IndicatorFrame;
use crate::indicators::rolling::rolling_std_opt;

pub const DEFAULT_WINDOW: usize = 7;

/// Add the `perc_volatility` column.
pub fn log_volatility(mut frame: IndicatorFrame, window: usize) -> IndicatorFrame {
    if frame.is_empty() {
        return frame;
    }
    let closes = frame.closes();

    let mut returns: Vec<Option<f64>> = Vec::with_capacity(closes.len());
    returns.push(None);
    for pair in closes.windows(2) {
        if pair[0] == 0.0 {
            returns.push(None);
        } else {
            returns.push(Some(pair[1] / pair[0] - 1.0));
        }
    }

    let column = rolling_std_opt(&returns, window, window);
    frame.insert_column("perc_volatility", column);
    frame
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::frame::IndicatorFrame;
    use crate::market_data::{Candle, CandleSeries};

    fn frame_with_closes(closes: &[f64]) -> IndicatorFrame {
        IndicatorFrame::new(CandleSeries::from_sorted(
            closes
                .iter()
                .enumerate()
                .map(|(i, close)| Candle {
                    open_time: i as i64 * 60_000,
                    open: *close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close: *close,
                    volume: 1.0,
                    close_time: i as i64 * 60_000 + 59_999,
                    quote_volume: 1.0,
                    trade_count: None,
                    taker_buy_volume: None,
                    taker_buy_quote_volume: None,
                })
                .collect(),
        ))
    }

    #[test]
    fn constant_series_has_zero_volatility() {
        let frame = log_volatility(frame_with_closes(&[100.0; 15]), 7);
        let value = frame.last_value("perc_volatility").unwrap();
        assert!(value.abs() < 1e-12);
    }

    #[test]
    fn warm_up_accounts_for_missing_first_return() {
        let closes: Vec<f64> = (1..=12).map(|i| 100.0 + i as f64).collect();
        let frame = log_volatility(frame_with_closes(&closes), 7);
        let col = frame.column("perc_volatility").unwrap();
        // Returns start at index 1, so a full 7-return window lands at 7.
        assert!(col[6].is_none());
        assert!(col[7].is_some());
    }

    #[test]
    fn alternating_series_has_positive_volatility() {
        let closes: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 100.0 } else { 110.0 })
            .collect();
        let frame = log_volatility(frame_with_closes(&closes), 7);
        assert!(frame.last_value("perc_volatility").unwrap() > 0.0);
    }

    #[test]
    fn empty_frame_passes_through() {
        let frame = log_volatility(IndicatorFrame::default(), 7);
        assert!(!frame.has_column("perc_volatility"));
    }
}
