// =============================================================================
// Moving Average Convergence Divergence
// =============================================================================
//
//   MACD   = EMA(close, 12) - EMA(close, 26)
//   signal = EMA(MACD, 9)
//
// Each EMA withholds output until a full span of inputs has accumulated, so
// the MACD line starts at bar 26 and the signal line nine MACD values later.

use crate::indicators::frame::IndicatorFrame;
use crate::indicators::rolling::ewm_mean;

const FAST_SPAN: usize = 12;
const SLOW_SPAN: usize = 26;
const SIGNAL_SPAN: usize = 9;

/// Add `macd` and `macd_signal` columns.
pub fn macd(mut frame: IndicatorFrame) -> IndicatorFrame {
    if frame.is_empty() {
        return frame;
    }

    let closes: Vec<Option<f64>> = frame.closes().into_iter().map(Some).collect();
    let fast = ewm_mean(&closes, FAST_SPAN, FAST_SPAN);
    let slow = ewm_mean(&closes, SLOW_SPAN, SLOW_SPAN);

    let macd_line: Vec<Option<f64>> = fast
        .iter()
        .zip(slow.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal = ewm_mean(&macd_line, SIGNAL_SPAN, SIGNAL_SPAN);

    frame.insert_column("macd", macd_line);
    frame.insert_column("macd_signal", signal);
    frame
}
