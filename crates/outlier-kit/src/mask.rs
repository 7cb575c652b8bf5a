//! The boolean outlier mask that connects detectors to handlers.

use crate::error::{OutlierError, Result};
use polars::prelude::*;

/// One Boolean column per analyzed column, `true` marks an outlier.
///
/// The mask remembers the height of the table it was built for; handlers
/// compare it with the table they clean. Columns that were not analyzed are
/// absent rather than all-false.
#[derive(Debug, Clone)]
pub struct OutlierMask {
    frame: DataFrame,
    height: usize,
}

impl OutlierMask {
    /// Build a mask from `(column, flags)` pairs. Every flag vector must have `height` entries.
    pub(crate) fn from_flags(height: usize, flags: Vec<(String, Vec<bool>)>) -> Result<Self> {
        let columns: Vec<Column> = flags
            .into_iter()
            .map(|(name, values)| {
                debug_assert_eq!(values.len(), height);
                Column::new(name.into(), values)
            })
            .collect();
        let frame = DataFrame::new(columns)?;
        Ok(Self { frame, height })
    }

    /// Reinterpret an arbitrary frame as a mask.
    ///
    /// Fails with `TYP001` when a column is not Boolean or contains nulls.
    pub fn try_from_frame(frame: DataFrame) -> Result<Self> {
        for col in frame.get_columns() {
            if col.dtype() != &DataType::Boolean {
                return Err(OutlierError::type_mismatch(
                    "OutlierMask",
                    format!("Boolean column '{}'", col.name()),
                    col.dtype().to_string(),
                ));
            }
            if col.null_count() > 0 {
                return Err(OutlierError::type_mismatch(
                    "OutlierMask",
                    format!("non-null Boolean column '{}'", col.name()),
                    format!("{} null values", col.null_count()),
                ));
            }
        }
        let height = frame.height();
        Ok(Self { frame, height })
    }

    /// Number of rows of the table the mask describes.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// Flags for one column, or `None` when the column was not analyzed.
    pub fn column(&self, name: &str) -> Option<Vec<bool>> {
        let col = self.frame.column(name).ok()?;
        let flags = col.as_materialized_series().bool().ok()?;
        Some(flags.into_iter().map(|v| v.unwrap_or(false)).collect())
    }

    pub fn outlier_count(&self, name: &str) -> Option<usize> {
        self.column(name)
            .map(|flags| flags.into_iter().filter(|f| *f).count())
    }

    pub fn total_outliers(&self) -> usize {
        self.columns()
            .iter()
            .filter_map(|name| self.outlier_count(name))
            .sum()
    }

    /// Per-row `any` over the given columns; names absent from the mask are ignored.
    pub fn rows_with_outliers(&self, names: &[String]) -> Vec<bool> {
        let mut any = vec![false; self.height];
        for name in names {
            if let Some(flags) = self.column(name) {
                for (row, flag) in any.iter_mut().zip(flags) {
                    *row |= flag;
                }
            }
        }
        any
    }

    pub fn as_frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mask() -> OutlierMask {
        OutlierMask::from_flags(
            4,
            vec![
                ("a".to_string(), vec![false, true, false, false]),
                ("b".to_string(), vec![false, false, false, true]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_columns_and_counts() {
        let mask = sample_mask();
        assert_eq!(mask.height(), 4);
        assert_eq!(mask.columns(), vec!["a", "b"]);
        assert_eq!(mask.outlier_count("a"), Some(1));
        assert_eq!(mask.outlier_count("missing"), None);
        assert_eq!(mask.total_outliers(), 2);
    }

    #[test]
    fn test_rows_with_outliers_ignores_unknown_columns() {
        let mask = sample_mask();
        let names = vec!["a".to_string(), "b".to_string(), "zzz".to_string()];
        assert_eq!(mask.rows_with_outliers(&names), vec![false, true, false, true]);
    }

    #[test]
    fn test_try_from_frame_accepts_boolean_frame() {
        let frame = df!["x" => [true, false, false]].unwrap();
        let mask = OutlierMask::try_from_frame(frame).unwrap();
        assert_eq!(mask.height(), 3);
        assert_eq!(mask.column("x"), Some(vec![true, false, false]));
    }

    #[test]
    fn test_try_from_frame_rejects_non_boolean() {
        let frame = df!["x" => [1.0, 0.0]].unwrap();
        let err = OutlierMask::try_from_frame(frame).unwrap_err();
        assert_eq!(err.error_code(), "TYP001");
    }

    #[test]
    fn test_try_from_frame_rejects_nulls() {
        let frame = df!["x" => [Some(true), None]].unwrap();
        let err = OutlierMask::try_from_frame(frame).unwrap_err();
        assert_eq!(err.error_code(), "TYP001");
    }

    #[test]
    fn test_into_frame_round_trip() {
        let frame = sample_mask().into_frame();
        assert_eq!(frame.shape(), (4, 2));
        assert_eq!(frame.column("a").unwrap().dtype(), &DataType::Boolean);
    }
}
