//! Shared helpers for reading and rebuilding numeric columns.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Names of all numeric columns, in frame order.
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

// =============================================================================
// Series Access Utilities
// =============================================================================

/// Read a column as `f64` values, keeping nulls as `None`.
pub fn column_as_f64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df.column(name)?.as_materialized_series();
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series.f64()?.into_iter().collect())
}

/// Read a column that is known to hold only finite values.
pub fn finite_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    Ok(column_as_f64(df, name)?.into_iter().flatten().collect())
}

/// Whether a series holds any null, NaN or infinite value.
pub fn has_missing_or_infinite(series: &Series) -> PolarsResult<bool> {
    if series.null_count() > 0 {
        return Ok(true);
    }
    if !matches!(series.dtype(), DataType::Float32 | DataType::Float64) {
        return Ok(false);
    }
    let float_series = series.cast(&DataType::Float64)?;
    let has_non_finite = float_series
        .f64()?
        .into_iter()
        .any(|v| v.is_some_and(|val| !val.is_finite()));
    Ok(has_non_finite)
}

/// Overwrite a column with `Float64` values.
pub fn replace_with_f64(df: &mut DataFrame, name: &str, values: Vec<f64>) -> PolarsResult<()> {
    let series = Series::new(name.into(), values);
    df.replace(name, series)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::UInt8));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_numeric_column_names_keeps_frame_order() {
        let df = df![
            "b" => [1.0, 2.0],
            "name" => ["x", "y"],
            "a" => [1i64, 2],
        ]
        .unwrap();
        assert_eq!(numeric_column_names(&df), vec!["b", "a"]);
    }

    #[test]
    fn test_column_as_f64_casts_integers() {
        let df = df!["n" => [Some(1i32), None, Some(3)]].unwrap();
        assert_eq!(
            column_as_f64(&df, "n").unwrap(),
            vec![Some(1.0), None, Some(3.0)]
        );
    }

    #[test]
    fn test_has_missing_or_infinite() {
        let clean = Series::new("a".into(), &[1.0, 2.0]);
        let nan = Series::new("b".into(), &[1.0, f64::NAN]);
        let inf = Series::new("c".into(), &[f64::INFINITY, 2.0]);
        let null = Series::new("d".into(), &[Some(1i64), None]);

        assert!(!has_missing_or_infinite(&clean).unwrap());
        assert!(has_missing_or_infinite(&nan).unwrap());
        assert!(has_missing_or_infinite(&inf).unwrap());
        assert!(has_missing_or_infinite(&null).unwrap());
    }

    #[test]
    fn test_replace_with_f64_changes_dtype() {
        let mut df = df!["n" => [1i64, 2, 3]].unwrap();
        replace_with_f64(&mut df, "n", vec![1.0, 2.5, 3.0]).unwrap();
        assert_eq!(df.column("n").unwrap().dtype(), &DataType::Float64);
    }
}
