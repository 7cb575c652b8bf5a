//! Quantile clipping.

use super::COMPONENT;
use crate::error::{ErrorCode, OutlierError, Result};
use crate::stats::{quantile_sorted, sorted};
use crate::utils::{finite_values, replace_with_f64};
use polars::prelude::*;

/// Clip `column` to its `(lower, upper)` quantiles. Returns the number of clipped values.
pub(super) fn clip_column(df: &mut DataFrame, column: &str, limits: (f64, f64)) -> Result<usize> {
    let values = finite_values(df, column)?;
    let ordered = sorted(&values);

    let degenerate = || {
        OutlierError::handling(
            ErrorCode::Hex003,
            COMPONENT,
            format!("column '{}'", column),
        )
        .with_suggestion(format!(
            "Winsorization bounds are identical or reversed for column '{}'. Data may be constant.",
            column
        ))
    };

    let (Some(lower), Some(upper)) = (
        quantile_sorted(&ordered, limits.0),
        quantile_sorted(&ordered, limits.1),
    ) else {
        return Err(degenerate());
    };
    if lower >= upper {
        return Err(degenerate());
    }

    let clipped = values.iter().filter(|v| **v < lower || **v > upper).count();
    let values = values.into_iter().map(|v| v.clamp(lower, upper)).collect();
    replace_with_f64(df, column, values)?;
    Ok(clipped)
}
