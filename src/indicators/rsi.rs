// =============================================================================
// Relative Strength Index — two deliberate variants
// =============================================================================
//
// Price deltas split into gains (positive) and losses (negative, sign
// flipped), then averaged over the window.
//
// `rsi` (canonical): plain rolling means with a full-window minimum and
//   RSI = 100 * avg_gain / (avg_gain + avg_loss); a zero denominator (flat
//   window) yields no value.
//
// `rsi_smoothed`: rolling means with min_periods = 1 and an epsilon guard in
//   the denominator, RSI = 100 - 100 / (1 + rs). Produces values earlier and
//   never divides by zero, at the cost of noisier warm-up output.
//
// Both are kept on purpose; consumers pick per use case.

use crate::indicators::frame::IndicatorFrame;
use crate::indicators::rolling::rolling_mean_opt;

const EPSILON: f64 = 1e-10;

/// Add the canonical rolling-mean RSI as `rsi`.
pub fn rsi(mut frame: IndicatorFrame, window: usize) -> IndicatorFrame {
    if frame.is_empty() {
        return frame;
    }
    let (gains, losses) = gains_and_losses(&frame.closes());
    let avg_gain = rolling_mean_opt(&gains, window, window);
    let avg_loss = rolling_mean_opt(&losses, window, window);

    let column: Vec<Option<f64>> = avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(gain, loss)| {
            let (gain, loss) = ((*gain)?, (*loss)?);
            let denom = gain + loss;
            if denom == 0.0 {
                None
            } else {
                Some(100.0 * gain / denom)
            }
        })
        .collect();

    frame.insert_column("rsi", column);
    frame
}

/// Add the smoothed, division-guarded RSI variant as `rsi_smoothed`.
pub fn rsi_smoothed(mut frame: IndicatorFrame, window: usize) -> IndicatorFrame {
    if frame.is_empty() {
        return frame;
    }
    let (gains, losses) = gains_and_losses(&frame.closes());
    let avg_gain = rolling_mean_opt(&gains, window, 1);
    let avg_loss = rolling_mean_opt(&losses, window, 1);

    let column: Vec<Option<f64>> = avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(gain, loss)| {
            let (gain, loss) = ((*gain)?, (*loss)?);
            let rs = gain / (loss + EPSILON);
            Some(100.0 - 100.0 / (1.0 + rs))
        })
        .collect();

    frame.insert_column("rsi_smoothed", column);
    frame
}

/// Split close-to-close deltas into gain and loss series. Index 0 carries no
/// delta and is a gap in both outputs.
fn gains_and_losses(closes: &[f64]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    gains.push(None);
    losses.push(None);
    for pair in closes.windows(2) {
        let delta = pair[1] - pair[0];
        gains.push(Some(delta.max(0.0)));
        losses.push(Some((-delta).max(0.0)));
    }
    (gains, losses)
}
