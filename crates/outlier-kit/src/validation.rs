//! Column validation shared by every detector and handler.
//!
//! [`validate_columns`] is a pure function: it turns an optional column
//! request into a [`ResolvedColumns`] list or a single error that reports
//! every problem it found.

use crate::error::{ColumnIssues, ErrorCode, OutlierError, Result};
use crate::utils::{has_missing_or_infinite, is_numeric_dtype, numeric_column_names};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Deref;
use tracing::debug;

/// A non-empty, duplicate-free list of numeric columns that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedColumns(Vec<String>);

impl ResolvedColumns {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for ResolvedColumns {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Names that appear more than once, each reported once in first-seen order.
fn duplicated_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut dupes = Vec::new();
    for name in names {
        if !seen.insert(name) && reported.insert(name) {
            dupes.push(name.to_string());
        }
    }
    dupes
}

/// Validate a table and resolve the column selection.
///
/// Checks run in order and the first structural failure is returned:
/// empty table (`ICE007`), duplicate labels in the table (`ICE005`), no
/// numeric columns to auto-select (`ICE002`), an explicit empty selection
/// (`ICE000`), duplicate requested names (`ICE005`). Column-level problems
/// (missing, non-numeric, null/NaN/inf) are then accumulated and returned as
/// one `InvalidColumns` error.
///
/// When `columns` is `None`, every numeric column not listed in `exclude` is
/// selected.
pub fn validate_columns(
    df: &DataFrame,
    component: &str,
    columns: Option<&[String]>,
    exclude: &[String],
) -> Result<ResolvedColumns> {
    if df.height() == 0 || df.width() == 0 {
        return Err(OutlierError::invalid_columns(
            ErrorCode::Ice007,
            component,
            ColumnIssues::default(),
        ));
    }

    let table_dupes = duplicated_names(df.get_column_names().iter().map(|s| s.as_str()));
    if !table_dupes.is_empty() {
        return Err(OutlierError::invalid_columns(
            ErrorCode::Ice005,
            component,
            ColumnIssues {
                duplicated: table_dupes,
                ..Default::default()
            },
        )
        .with_suggestion("Remove the duplicate column from the table."));
    }

    let requested: Vec<String> = match columns {
        None => {
            let auto: Vec<String> = numeric_column_names(df)
                .into_iter()
                .filter(|name| !exclude.contains(name))
                .collect();
            if auto.is_empty() {
                return Err(OutlierError::invalid_columns(
                    ErrorCode::Ice002,
                    component,
                    ColumnIssues::default(),
                ));
            }
            auto
        }
        Some([]) => {
            return Err(OutlierError::invalid_columns(
                ErrorCode::Ice000,
                component,
                ColumnIssues::default(),
            ));
        }
        Some(list) => {
            let dupes = duplicated_names(list.iter().map(String::as_str));
            if !dupes.is_empty() {
                return Err(OutlierError::invalid_columns(
                    ErrorCode::Ice005,
                    component,
                    ColumnIssues {
                        duplicated: dupes,
                        ..Default::default()
                    },
                ));
            }
            list.to_vec()
        }
    };

    let mut issues = ColumnIssues::default();
    for name in &requested {
        match df.column(name) {
            Err(_) => issues.missing.push(name.clone()),
            Ok(col) if !is_numeric_dtype(col.dtype()) => issues.invalid.push(name.clone()),
            Ok(col) => {
                if has_missing_or_infinite(col.as_materialized_series())? {
                    issues.nan_cols.push(name.clone());
                }
            }
        }
    }

    if !issues.is_empty() {
        return Err(OutlierError::invalid_columns(issues.code(), component, issues));
    }

    debug!("[{}] resolved columns: {:?}", component, requested);
    Ok(ResolvedColumns(requested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sample_df() -> DataFrame {
        df![
            "age" => [21.0, 35.0, 47.0],
            "income" => [1200i64, 3400, 5100],
            "name" => ["a", "b", "c"],
        ]
        .unwrap()
    }

    #[test]
    fn test_auto_resolves_numeric_columns() {
        let resolved = validate_columns(&sample_df(), "Test", None, &[]).unwrap();
        assert_eq!(resolved.as_slice(), names(&["age", "income"]).as_slice());
    }

    #[test]
    fn test_auto_resolution_honours_exclude() {
        let resolved = validate_columns(&sample_df(), "Test", None, &names(&["income"])).unwrap();
        assert_eq!(resolved.into_inner(), names(&["age"]));
    }

    #[test]
    fn test_explicit_selection_keeps_order() {
        let cols = names(&["income", "age"]);
        let resolved = validate_columns(&sample_df(), "Test", Some(&cols), &[]).unwrap();
        assert_eq!(resolved.into_inner(), cols);
    }

    #[test]
    fn test_empty_table() {
        let df = df!["age" => Vec::<f64>::new()].unwrap();
        let err = validate_columns(&df, "Test", None, &[]).unwrap_err();
        assert_eq!(err.error_code(), "ICE007");

        let err = validate_columns(&DataFrame::empty(), "Test", None, &[]).unwrap_err();
        assert_eq!(err.error_code(), "ICE007");
    }

    #[test]
    fn test_no_numeric_columns() {
        let df = df!["name" => ["a", "b"]].unwrap();
        let err = validate_columns(&df, "Test", None, &[]).unwrap_err();
        assert_eq!(err.error_code(), "ICE002");
    }

    #[test]
    fn test_everything_excluded_counts_as_no_numeric() {
        let df = df!["g" => [1i64, 2]].unwrap();
        let err = validate_columns(&df, "Test", None, &names(&["g"])).unwrap_err();
        assert_eq!(err.error_code(), "ICE002");
    }

    #[test]
    fn test_empty_selection() {
        let err = validate_columns(&sample_df(), "Test", Some(&[]), &[]).unwrap_err();
        assert_eq!(err.error_code(), "ICE000");
    }

    #[test]
    fn test_duplicate_request_wins_over_missing_and_invalid() {
        // "ghost" is missing and "name" is non-numeric, but duplicates are reported first.
        let cols = names(&["age", "age", "ghost", "name"]);
        let err = validate_columns(&sample_df(), "Test", Some(&cols), &[]).unwrap_err();
        assert_eq!(err.error_code(), "ICE005");
        assert_eq!(err.column_issues().unwrap().duplicated, names(&["age"]));
        assert!(err.column_issues().unwrap().missing.is_empty());
    }

    #[test]
    fn test_duplicate_request_on_table_without_that_column() {
        let cols = names(&["ghost", "ghost"]);
        let err = validate_columns(&sample_df(), "Test", Some(&cols), &[]).unwrap_err();
        assert_eq!(err.error_code(), "ICE005");
    }

    #[test]
    fn test_accumulates_all_column_issues() {
        let df = df![
            "age" => [Some(21.0), None, Some(47.0)],
            "score" => [1.0, f64::INFINITY, 2.0],
            "name" => ["a", "b", "c"],
        ]
        .unwrap();
        let cols = names(&["age", "score", "name", "ghost"]);
        let err = validate_columns(&df, "IQRDetector", Some(&cols), &[]).unwrap_err();

        assert_eq!(err.error_code(), "ICE004");
        assert_eq!(err.kind(), Some(ErrorKind::InvalidColumns));
        let issues = err.column_issues().unwrap();
        assert_eq!(issues.missing, names(&["ghost"]));
        assert_eq!(issues.invalid, names(&["name"]));
        assert_eq!(issues.nan_cols, names(&["age", "score"]));
    }

    #[test]
    fn test_single_issue_codes() {
        let df = sample_df();

        let err = validate_columns(&df, "Test", Some(&names(&["ghost"])), &[]).unwrap_err();
        assert_eq!(err.error_code(), "ICE001");

        let err = validate_columns(&df, "Test", Some(&names(&["name"])), &[]).unwrap_err();
        assert_eq!(err.error_code(), "ICE003");

        let nan_df = df!["x" => [1.0, f64::NAN]].unwrap();
        let err = validate_columns(&nan_df, "Test", None, &[]).unwrap_err();
        assert_eq!(err.error_code(), "ICE006");
    }

    #[test]
    fn test_component_is_reported() {
        let err = validate_columns(&sample_df(), "ZScoreDetector", Some(&[]), &[]).unwrap_err();
        assert_eq!(err.component(), Some("ZScoreDetector"));
        assert!(err.to_string().starts_with("[ZScoreDetector] - ICE000"));
    }
}
