//! Strategies that overwrite flagged cells and keep every row.

use super::{COMPONENT, InterpolationMethod};
use crate::error::{ErrorCode, OutlierError, Result};
use crate::stats::{interpolate_linear, interpolate_nearest, mean, median};
use crate::utils::{finite_values, replace_with_f64};
use polars::prelude::*;

/// Statistic used by the mean / median strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Central {
    Mean,
    Median,
}

/// Values at positions that are not flagged.
pub(super) fn unflagged(values: &[f64], flags: &[bool]) -> Vec<f64> {
    values
        .iter()
        .zip(flags)
        .filter(|(_, flagged)| !**flagged)
        .map(|(v, _)| *v)
        .collect()
}

pub(super) fn no_reference(column: &str) -> OutlierError {
    OutlierError::handling(
        ErrorCode::Hex004,
        COMPONENT,
        format!("every value of '{}' is flagged as an outlier", column),
    )
}

/// Replace flagged cells with `value`.
pub(super) fn fill_constant(df: &mut DataFrame, column: &str, flags: &[bool], value: f64) -> Result<()> {
    let filled: Vec<f64> = finite_values(df, column)?
        .into_iter()
        .zip(flags)
        .map(|(v, flagged)| if *flagged { value } else { v })
        .collect();
    replace_with_f64(df, column, filled)?;
    Ok(())
}

/// Replace flagged cells with the mean or median of the unflagged ones.
pub(super) fn fill_central(
    df: &mut DataFrame,
    column: &str,
    flags: &[bool],
    central: Central,
) -> Result<f64> {
    let reference = unflagged(&finite_values(df, column)?, flags);
    let value = match central {
        Central::Mean => mean(&reference),
        Central::Median => median(&reference),
    }
    .ok_or_else(|| no_reference(column))?;

    fill_constant(df, column, flags, value)?;
    Ok(value)
}

/// Turn flagged cells into gaps and fill them from their neighbours.
pub(super) fn fill_interpolated(
    df: &mut DataFrame,
    column: &str,
    flags: &[bool],
    method: InterpolationMethod,
) -> Result<()> {
    let gaps: Vec<Option<f64>> = finite_values(df, column)?
        .into_iter()
        .zip(flags)
        .map(|(v, flagged)| (!*flagged).then_some(v))
        .collect();

    let filled = match method {
        InterpolationMethod::Linear => interpolate_linear(&gaps),
        InterpolationMethod::Nearest => interpolate_nearest(&gaps),
    }
    .ok_or_else(|| no_reference(column))?;

    replace_with_f64(df, column, filled)?;
    Ok(())
}
