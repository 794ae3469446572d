// =============================================================================
// Time-weighted average price
// =============================================================================
//
// Each close is weighted by the hours elapsed since the bar `periods` places
// earlier, then a rolling sum of those weighted values is scaled by the total
// elapsed time across the series. Irregularly spaced bars therefore count in
// proportion to the time they actually cover.

use crate::indicators::frame::IndicatorFrame;
use crate::indicators::rolling::rolling_sum_opt;

pub const DEFAULT_PERIODS: usize = 30;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Add the `twap` column.
pub fn twap(mut frame: IndicatorFrame, periods: usize) -> IndicatorFrame {
    if frame.is_empty() || periods == 0 {
        return frame;
    }
    let candles = frame.candles();
    let n = candles.len();

    // Hours elapsed between each bar and the one `periods` bars earlier.
    let mut time_diff: Vec<Option<f64>> = vec![None; n];
    for i in periods..n {
        let elapsed = (candles[i].close_time - candles[i - periods].close_time) as f64;
        time_diff[i] = Some(elapsed / MS_PER_HOUR);
    }
    let total_elapsed: f64 = time_diff.iter().flatten().sum();

    let weighted: Vec<Option<f64>> = candles
        .iter()
        .zip(time_diff.iter())
        .map(|(c, td)| td.map(|td| c.close * td))
        .collect();
    let weighted_sum = rolling_sum_opt(&weighted, periods, periods);

    let column: Vec<Option<f64>> = weighted_sum
        .iter()
        .map(|sum| {
            let sum = (*sum)?;
            if total_elapsed == 0.0 {
                None
            } else {
                Some(sum / total_elapsed)
            }
        })
        .collect();

    frame.insert_column("twap", column);
    frame
}
