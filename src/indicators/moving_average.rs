// =============================================================================
// Simple moving averages and the MA spread bands derived from them
// =============================================================================

use crate::indicators::frame::IndicatorFrame;
use crate::indicators::rolling::rolling_mean;

/// Add a simple rolling mean of the close as `ma_{period}`.
///
/// The first `period - 1` positions are undefined.
pub fn moving_average(mut frame: IndicatorFrame, period: usize) -> IndicatorFrame {
    if frame.is_empty() {
        return frame;
    }
    let column = rolling_mean(&frame.closes(), period);
    frame.insert_column(format!("ma_{period}"), column);
    frame
}

/// Add the percentage spreads between the standard MA stack:
///
///   big_ma_spread   = |ma_100 - ma_25| / ma_100 * 100
///   small_ma_spread = |ma_25  - ma_7 | / ma_25  * 100
///
/// Consumers size take-profit and stop-loss bands from these. Requires
/// `ma_7`, `ma_25` and `ma_100` to be present; otherwise a no-op.
pub fn ma_spreads(mut frame: IndicatorFrame) -> IndicatorFrame {
    let (Some(ma_7), Some(ma_25), Some(ma_100)) = (
        frame.column("ma_7"),
        frame.column("ma_25"),
        frame.column("ma_100"),
    ) else {
        return frame;
    };

    let big: Vec<Option<f64>> = ma_100
        .iter()
        .zip(ma_25.iter())
        .map(|(hundred, twenty_five)| pct_spread(*hundred, *twenty_five))
        .collect();
    let small: Vec<Option<f64>> = ma_25
        .iter()
        .zip(ma_7.iter())
        .map(|(twenty_five, seven)| pct_spread(*twenty_five, *seven))
        .collect();

    frame.insert_column("big_ma_spread", big);
    frame.insert_column("small_ma_spread", small);
    frame
}

fn pct_spread(base: Option<f64>, other: Option<f64>) -> Option<f64> {
    let (base, other) = (base?, other?);
    if base == 0.0 {
        return None;
    }
    let spread = (base - other).abs() / base * 100.0;
    spread.is_finite().then_some(spread)
}
