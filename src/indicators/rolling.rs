// =============================================================================
// Rolling-window primitives shared by the indicator suite
// =============================================================================
//
// Window semantics: the trailing window at index i covers up to `window`
// values ending at i. A position yields a value only when the window holds at
// least `min_periods` present, finite entries; otherwise it is `None`.
// Standard deviation is the sample deviation (n - 1 denominator).

/// Rolling mean over a dense series; gaps appear only during warm-up.
pub(crate) fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let opt: Vec<Option<f64>> = values.iter().map(|v| Some(*v)).collect();
    rolling_mean_opt(&opt, window, window)
}

/// Rolling mean over a series with gaps.
pub(crate) fn rolling_mean_opt(
    values: &[Option<f64>],
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    rolling_apply(values, window, min_periods, |present| {
        present.iter().sum::<f64>() / present.len() as f64
    })
}

/// Rolling sum over a series with gaps.
pub(crate) fn rolling_sum_opt(
    values: &[Option<f64>],
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    rolling_apply(values, window, min_periods, |present| {
        present.iter().sum::<f64>()
    })
}

/// Rolling sample standard deviation over a series with gaps.
///
/// A window with a single present value has no deviation and yields `None`
/// even when `min_periods` is 1.
pub(crate) fn rolling_std_opt(
    values: &[Option<f64>],
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    let mut out = rolling_apply(values, window, min_periods, |present| {
        let n = present.len() as f64;
        let mean = present.iter().sum::<f64>() / n;
        let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    });
    // Single-entry windows divide by zero above; scrub them.
    for v in out.iter_mut() {
        if v.map_or(false, |x| !x.is_finite()) {
            *v = None;
        }
    }
    out
}

fn rolling_apply(
    values: &[Option<f64>],
    window: usize,
    min_periods: usize,
    f: impl Fn(&[f64]) -> f64,
) -> Vec<Option<f64>> {
    if window == 0 || min_periods == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut present = Vec::with_capacity(window);
    for i in 0..values.len() {
        let start = i.saturating_sub(window - 1);
        present.clear();
        present.extend(
            values[start..=i]
                .iter()
                .filter_map(|v| v.filter(|x| x.is_finite())),
        );
        if present.len() >= min_periods {
            out.push(Some(f(&present)));
        } else {
            out.push(None);
        }
    }
    out
}

/// Exponentially weighted mean with the `adjust = false` recurrence:
/// each value blends the prior EWM and the current observation, with no
/// normalization factor. Seeded with the first present value.
///
/// Positions before `min_periods` observations have accumulated are `None`;
/// gaps in the input neither advance the state nor count toward the minimum.
pub(crate) fn ewm_mean(
    values: &[Option<f64>],
    span: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; values.len()];
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut state: Option<f64> = None;
    let mut count = 0usize;

    for value in values {
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                state = Some(match state {
                    None => v,
                    Some(prev) => v * alpha + prev * (1.0 - alpha),
                });
                count += 1;
                out.push(if count >= min_periods { state } else { None });
            }
            None => out.push(None),
        }
    }
    out
}
