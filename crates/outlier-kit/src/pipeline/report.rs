//! Summary of one pipeline run.

use crate::detection::DetectionMethod;
use crate::handling::HandlingStrategy;
use polars::prelude::DataFrame;
use serde::Serialize;

/// Number of flagged values in one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnOutliers {
    pub column: String,
    pub outliers: usize,
}

/// What a pipeline run did, suitable for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct CleaningReport {
    /// Detector description, `None` when detection was skipped (winsorization).
    pub detector: Option<String>,
    pub method: DetectionMethod,
    pub strategy: HandlingStrategy,
    /// Columns the run analyzed.
    pub columns: Vec<String>,
    pub rows_before: usize,
    pub rows_after: usize,
    pub outliers_per_column: Vec<ColumnOutliers>,
    pub total_outliers: usize,
    /// Fitted detector statistics per column (`null` when detection was skipped).
    pub scores: serde_json::Value,
    pub duration_ms: u64,
}

impl CleaningReport {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Cleaned table plus its report.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub data: DataFrame,
    pub report: CleaningReport,
}
