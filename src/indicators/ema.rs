// =============================================================================
// Exponential moving average
// =============================================================================
//
// adjust = false recurrence: every new value blends the prior EMA with the
// current close, seeded from the first close. There is no SMA warm-up and no
// normalization factor.
//
//   alpha  = 2 / (span + 1)
//   EMA_0  = close_0
//   EMA_t  = close_t * alpha + EMA_{t-1} * (1 - alpha)

use crate::indicators::frame::IndicatorFrame;
use crate::indicators::rolling::ewm_mean;

/// Add an EMA of the close as `ema_{span}` (or `out_col` when given).
pub fn ema(frame: IndicatorFrame, span: usize) -> IndicatorFrame {
    ema_as(frame, span, None)
}

/// Same as [`ema`] with an explicit output column name.
pub fn ema_as(mut frame: IndicatorFrame, span: usize, out_col: Option<&str>) -> IndicatorFrame {
    if frame.is_empty() {
        return frame;
    }
    let closes: Vec<Option<f64>> = frame.closes().into_iter().map(Some).collect();
    let column = ewm_mean(&closes, span, 1);
    let name = out_col
        .map(str::to_owned)
        .unwrap_or_else(|| format!("ema_{span}"));
    frame.insert_column(name, column);
    frame
}
