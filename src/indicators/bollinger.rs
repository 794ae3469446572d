// =============================================================================
// Bollinger bands
// =============================================================================
//
// Middle band = rolling mean of the close, upper/lower = middle +- k standard
// deviations (sample deviation, matching the usual charting convention).

use crate::indicators::frame::IndicatorFrame;
use crate::indicators::rolling::{rolling_mean_opt, rolling_std_opt};

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_NUM_STD: f64 = 2.0;

/// Add `bb_upper`, `bb_mid` and `bb_lower` columns.
pub fn bollinger(mut frame: IndicatorFrame, window: usize, num_std: f64) -> IndicatorFrame {
    if frame.is_empty() {
        return frame;
    }
    let closes: Vec<Option<f64>> = frame.closes().into_iter().map(Some).collect();
    let mid = rolling_mean_opt(&closes, window, window);
    let std = rolling_std_opt(&closes, window, window);

    let upper: Vec<Option<f64>> = mid
        .iter()
        .zip(std.iter())
        .map(|(m, s)| Some((*m)? + num_std * (*s)?))
        .collect();
    let lower: Vec<Option<f64>> = mid
        .iter()
        .zip(std.iter())
        .map(|(m, s)| Some((*m)? - num_std * (*s)?))
        .collect();

    frame.insert_column("bb_upper", upper);
    frame.insert_column("bb_mid", mid);
    frame.insert_column("bb_lower", lower);
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
    fn bands_bracket_the_mean() {
        let closes: Vec<f64> = (1..=40).map(|i| i as f64).collect();
        let frame = bollinger(frame_with_closes(&closes), DEFAULT_WINDOW, DEFAULT_NUM_STD);
        let i = 30;
        let upper = frame.column("bb_upper").unwrap()[i].unwrap();
        let mid = frame.column("bb_mid").unwrap()[i].unwrap();
        let lower = frame.column("bb_lower").unwrap()[i].unwrap();
        assert!(upper > mid);
        assert!(lower < mid);
        assert!((upper - mid - (mid - lower)).abs() < 1e-9, "bands symmetric");
    }

    #[test]
    fn warm_up_is_undefined() {
        let closes: Vec<f64> = (1..=25).map(|i| i as f64).collect();
        let frame = bollinger(frame_with_closes(&closes), 20, 2.0);
        assert_eq!(frame.column("bb_mid").unwrap()[18], None);
        assert!(frame.column("bb_mid").unwrap()[19].is_some());
    }

    #[test]
    fn flat_series_collapses_bands() {
        let frame = bollinger(frame_with_closes(&[100.0; 25]), 20, 2.0);
        let upper = frame.last_value("bb_upper").unwrap();
        let lower = frame.last_value("bb_lower").unwrap();
        assert!((upper - 100.0).abs() < 1e-12);
        assert!((lower - 100.0).abs() < 1e-12);
    }

    #[test]
    fn empty_frame_passes_through() {
        let frame = bollinger(IndicatorFrame::default(), 20, 2.0);
        assert!(!frame.has_column("bb_mid"));
    }
}
