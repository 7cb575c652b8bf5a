//! Group-wise median replacement.

use super::replace::{no_reference, unflagged};
use crate::error::Result;
use crate::stats::median;
use crate::utils::{finite_values, replace_with_f64};
use polars::prelude::*;
use std::collections::HashMap;

/// Group keys of every row rendered as strings; null keys stay `None`.
pub(super) fn group_keys(df: &DataFrame, group_col: &str) -> Result<Vec<Option<String>>> {
    let keys = df
        .column(group_col)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(keys.str()?.into_iter().map(|k| k.map(str::to_string)).collect())
}

/// Fill flagged cells with the median of unflagged values sharing the row's key.
///
/// Rows whose group has no unflagged value, or whose key is null, take the
/// median of all unflagged values in the column.
pub(super) fn fill_group_median(
    df: &mut DataFrame,
    column: &str,
    flags: &[bool],
    keys: &[Option<String>],
) -> Result<usize> {
    let values = finite_values(df, column)?;
    let global = median(&unflagged(&values, flags)).ok_or_else(|| no_reference(column))?;

    let mut members: HashMap<&str, Vec<f64>> = HashMap::new();
    for ((value, flagged), key) in values.iter().zip(flags).zip(keys) {
        if let (false, Some(key)) = (*flagged, key) {
            members.entry(key.as_str()).or_default().push(*value);
        }
    }
    let group_medians: HashMap<&str, f64> = members
        .into_iter()
        .filter_map(|(key, vals)| median(&vals).map(|m| (key, m)))
        .collect();

    let mut fallbacks = 0;
    let filled: Vec<f64> = values
        .iter()
        .zip(flags)
        .zip(keys)
        .map(|((value, flagged), key)| {
            if !*flagged {
                return *value;
            }
            match key.as_deref().and_then(|k| group_medians.get(k)) {
                Some(group_median) => *group_median,
                None => {
                    fallbacks += 1;
                    global
                }
            }
        })
        .collect();

    replace_with_f64(df, column, filled)?;
    Ok(fallbacks)
}
