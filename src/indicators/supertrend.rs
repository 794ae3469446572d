// =============================================================================
// Supertrend — carried-band trend indicator
// =============================================================================
//
// Basic bands sit a multiple of ATR either side of the bar midpoint:
//
//   basic_upper = (high + low) / 2 + multiplier * ATR
//   basic_lower = (high + low) / 2 - multiplier * ATR
//
// Final bands ratchet: the upper band may only move down while price stays
// below it, the lower band only up while price stays above it. Direction
// flips to bullish (1) when close crosses the prior final upper band, to
// bearish (-1) when it crosses the prior final lower band, and otherwise
// carries forward. The Supertrend value tracks the band opposite the trend.
//
// Each step depends on the previous step's bands and direction, so this is an
// indexed scan with carried accumulators, not a per-row formula.

use crate::indicators::frame::IndicatorFrame;

pub const DEFAULT_MULTIPLIER: f64 = 3.0;

/// Add `supertrend` and `supertrend_dir` columns.
///
/// Requires the `atr` column; without it the frame passes through unchanged.
pub fn supertrend(mut frame: IndicatorFrame, multiplier: f64) -> IndicatorFrame {
    let Some(atr) = frame.column("atr").map(<[_]>::to_vec) else {
        return frame;
    };
    let n = frame.len();
    if n == 0 {
        return frame;
    }

    let candles = frame.candles();

    let basic_upper: Vec<Option<f64>> = candles
        .iter()
        .zip(atr.iter())
        .map(|(c, a)| a.map(|a| c.hl2() + multiplier * a))
        .collect();
    let basic_lower: Vec<Option<f64>> = candles
        .iter()
        .zip(atr.iter())
        .map(|(c, a)| a.map(|a| c.hl2() - multiplier * a))
        .collect();

    // Ratcheted final bands. While the previous band is still undefined
    // (ATR warm-up) the basic band passes through unmodified.
    let mut final_upper = vec![basic_upper[0]; 1];
    let mut final_lower = vec![basic_lower[0]; 1];
    for i in 1..n {
        let prev_close = candles[i - 1].close;

        let upper = match (basic_upper[i], final_upper[i - 1]) {
            (Some(basic), Some(prev)) if prev_close <= prev => Some(basic.min(prev)),
            (basic, _) => basic,
        };
        final_upper.push(upper);

        let lower = match (basic_lower[i], final_lower[i - 1]) {
            (Some(basic), Some(prev)) if prev_close >= prev => Some(basic.max(prev)),
            (basic, _) => basic,
        };
        final_lower.push(lower);
    }

    // Direction and the Supertrend line itself.
    let mut direction = vec![0i8; n];
    let mut line: Vec<Option<f64>> = vec![None; n];
    for i in 1..n {
        let close = candles[i].close;
        direction[i] = if final_upper[i - 1].is_some_and(|fu| close > fu) {
            1
        } else if final_lower[i - 1].is_some_and(|fl| close < fl) {
            -1
        } else {
            direction[i - 1]
        };
        line[i] = if direction[i] == 1 {
            final_lower[i]
        } else {
            final_upper[i]
        };
    }

    let dir_column: Vec<Option<f64>> = direction.iter().map(|d| Some(*d as f64)).collect();
    frame.insert_column("supertrend", line);
    frame.insert_column("supertrend_dir", dir_column);
    frame
}
