//! Numeric helpers for the fusion pipeline
//!
//! Clamps are applied at each call site rather than globally; these
//! helpers only keep the arithmetic total (no NaN from empty sets, no
//! overflow in the logistic).

/// Clamp `value` into `[lo, hi]`
#[inline]
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Logistic function, split by sign so `exp` never overflows
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Log-odds of `p`, with both `p` and `1 - p` floored at `floor`
pub fn logit(p: f64, floor: f64) -> f64 {
    (p.max(floor) / (1.0 - p).max(floor)).ln()
}

/// Percentile (0-100) by linear interpolation between closest ranks
///
/// Returns `None` for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = clamp(q, 0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Arithmetic mean; `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population variance (divides by n); `None` for an empty slice
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64)
}

/// Pearson correlation of two equal-length vectors
///
/// Returns `None` when the vectors are empty, differ in length, or either
/// variance is at or below `min_variance`.
pub fn pearson(x: &[f64], y: &[f64], min_variance: f64) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }

    let mean_x = mean(x)?;
    let mean_y = mean(y)?;
    let var_x = population_variance(x)?;
    let var_y = population_variance(y)?;

    if var_x <= min_variance || var_y <= min_variance {
        return None;
    }

    let mean_xy = x.iter().zip(y).map(|(a, b)| a * b).sum::<f64>() / x.len() as f64;
    let cov = mean_xy - mean_x * mean_y;

    Some(cov / (var_x * var_y).sqrt())
}
