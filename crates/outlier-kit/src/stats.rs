//! Numeric kernels shared by detectors and handlers.
//!
//! All functions work on plain `f64` slices that the caller has already
//! checked for finiteness. Quantiles sort a copy of the input and interpolate
//! linearly between order statistics (`pos = q * (n - 1)`), so every
//! quantile-based method is O(n log n) per column.

/// Scaling constant of the modified z-score (≈ Φ⁻¹(0.75)).
pub const MAD_SCALE: f64 = 0.67449;

/// Linear-interpolated quantile of an already sorted slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }
    let pos = q * (sorted.len() as f64 - 1.0);
    let idx = pos.floor() as usize;
    let frac = pos - idx as f64;
    let a = sorted[idx];
    let b = sorted[(idx + 1).min(sorted.len() - 1)];
    Some(a + (b - a) * frac)
}

/// Sort a copy of `values` ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&sorted(values), q)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0).
pub fn population_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Median of absolute deviations from `center`.
pub fn median_absolute_deviation(values: &[f64], center: f64) -> Option<f64> {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Fill gaps by linear interpolation over row position.
///
/// Leading and trailing gaps take the nearest valid value. Returns `None`
/// when there is no valid value to interpolate from.
pub fn interpolate_linear(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let anchors: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    let (&(first_idx, first_val), &(last_idx, last_val)) = (anchors.first()?, anchors.last()?);

    let mut filled = Vec::with_capacity(values.len());
    let mut next_anchor = 0;
    for (i, value) in values.iter().enumerate() {
        if let Some(v) = value {
            filled.push(*v);
            continue;
        }
        if i < first_idx {
            filled.push(first_val);
        } else if i > last_idx {
            filled.push(last_val);
        } else {
            while anchors[next_anchor].0 < i {
                next_anchor += 1;
            }
            let (hi_idx, hi_val) = anchors[next_anchor];
            let (lo_idx, lo_val) = anchors[next_anchor - 1];
            let frac = (i - lo_idx) as f64 / (hi_idx - lo_idx) as f64;
            filled.push(lo_val + (hi_val - lo_val) * frac);
        }
    }
    Some(filled)
}

/// Fill gaps with the value of the closest valid row (ties go to the earlier row).
pub fn interpolate_nearest(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let anchors: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    if anchors.is_empty() {
        return None;
    }

    let filled = values
        .iter()
        .enumerate()
        .map(|(i, value)| match value {
            Some(v) => *v,
            None => {
                let upper = anchors.partition_point(|(idx, _)| *idx < i);
                let after = anchors.get(upper);
                let before = upper.checked_sub(1).map(|j| anchors[j]);
                match (before, after) {
                    (Some((b_idx, b_val)), Some(&(a_idx, a_val))) => {
                        if i - b_idx <= a_idx - i {
                            b_val
                        } else {
                            a_val
                        }
                    }
                    (Some((_, b_val)), None) => b_val,
                    (None, Some(&(_, a_val))) => a_val,
                    (None, None) => unreachable!("anchors is non-empty"),
                }
            }
        })
        .collect();
    Some(filled)
}
