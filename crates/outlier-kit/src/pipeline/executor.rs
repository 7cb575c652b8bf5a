//! Detect-then-handle execution.

use super::report::{CleaningOutcome, CleaningReport, ColumnOutliers};
use crate::config::CleaningPlan;
use crate::error::{Result, ResultExt};
use crate::handling::HandlingStrategy;
use crate::utils::numeric_column_names;
use crate::validation::validate_columns;
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Applies a validated [`CleaningPlan`] to tables.
///
/// # Example
///
/// ```rust,ignore
/// let plan = CleaningPlan::builder().strategy("median").build()?;
/// let outcome = OutlierPipeline::new(plan)?.run(&df)?;
/// println!("{} outliers replaced", outcome.report.total_outliers);
/// ```
#[derive(Debug, Clone)]
pub struct OutlierPipeline {
    plan: CleaningPlan,
}

impl OutlierPipeline {
    const COMPONENT: &'static str = "OutlierPipeline";

    pub fn new(plan: CleaningPlan) -> Result<Self> {
        plan.validate()?;
        Ok(Self { plan })
    }

    pub fn plan(&self) -> &CleaningPlan {
        &self.plan
    }

    /// Run the plan on `df`. The input table is left unchanged.
    pub fn run(&self, df: &DataFrame) -> Result<CleaningOutcome> {
        let start = Instant::now();
        let handler = self.plan.handler.build()?;
        let strategy = handler.strategy();

        info!(
            "[{}] starting on {} rows x {} columns",
            Self::COMPONENT,
            df.height(),
            df.width()
        );

        if strategy == HandlingStrategy::Winsorization {
            info!("Step 1: Skipping detection, winsorization needs no mask");
            let columns = validate_columns(df, Self::COMPONENT, handler.columns(), &[])?;
            info!("Step 2: Winsorizing {} columns...", columns.len());
            let data = handler.apply(df, None).context("Winsorization failed")?;

            let report = CleaningReport {
                detector: None,
                method: self.plan.detector.method,
                strategy,
                columns: columns.into_inner(),
                rows_before: df.height(),
                rows_after: data.height(),
                outliers_per_column: Vec::new(),
                total_outliers: 0,
                scores: serde_json::Value::Null,
                duration_ms: start.elapsed().as_millis() as u64,
            };
            return Ok(CleaningOutcome { data, report });
        }

        let mut detector_config = self.plan.detector.clone();
        if strategy == HandlingStrategy::GroupBased
            && detector_config.columns.is_none()
            && let Some(group_col) = handler.group_col()
        {
            // The grouping key is not a detection target.
            let columns: Vec<String> = numeric_column_names(df)
                .into_iter()
                .filter(|c| c != group_col)
                .collect();
            debug!("[{}] detecting on {:?}", Self::COMPONENT, columns);
            detector_config.columns = Some(columns);
        }
        let mut detector = detector_config.build()?;

        info!("Step 1: Detecting outliers with {}...", detector.name());
        let mask = detector.detect(df).context("Outlier detection failed")?;
        let outliers_per_column: Vec<ColumnOutliers> = mask
            .columns()
            .into_iter()
            .map(|column| {
                let outliers = mask.outlier_count(&column).unwrap_or(0);
                ColumnOutliers { column, outliers }
            })
            .collect();
        let total_outliers = mask.total_outliers();
        info!("Found {} outliers in {} columns", total_outliers, outliers_per_column.len());

        info!("Step 2: Handling outliers with strategy '{}'...", strategy);
        let data = handler
            .apply(df, Some(&mask))
            .context("Outlier handling failed")?;

        info!(
            "[{}] done: {} -> {} rows",
            Self::COMPONENT,
            df.height(),
            data.height()
        );

        let report = CleaningReport {
            detector: Some(detector.to_string()),
            method: detector.method(),
            strategy,
            columns: mask.columns(),
            rows_before: df.height(),
            rows_after: data.height(),
            outliers_per_column,
            total_outliers,
            scores: detector.scores_json()?,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        Ok(CleaningOutcome { data, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DetectionMethod;

    fn sample_df() -> DataFrame {
        df![
            "region" => ["n", "n", "n", "s", "s", "s"],
            "x" => [10.0, 11.0, 12.0, 13.0, 12.0, 500.0],
        ]
        .unwrap()
    }

    #[test]
    fn test_run_median_replacement() {
        let plan = CleaningPlan::builder().strategy("median").build().unwrap();
        let outcome = OutlierPipeline::new(plan).unwrap().run(&sample_df()).unwrap();

        let report = &outcome.report;
        assert_eq!(report.columns, vec!["x".to_string()]);
        assert_eq!(report.total_outliers, 1);
        assert_eq!(report.rows_before, 6);
        assert_eq!(report.rows_after, 6);
        assert_eq!(report.scores["x"]["q1"], serde_json::json!(11.25));

        let x = crate::utils::finite_values(&outcome.data, "x").unwrap();
        assert_eq!(x[5], 12.0);
    }

    #[test]
    fn test_run_remove_reports_rows() {
        let plan = CleaningPlan::builder().strategy("remove").build().unwrap();
        let outcome = OutlierPipeline::new(plan).unwrap().run(&sample_df()).unwrap();
        assert_eq!(outcome.report.rows_after, 5);
        assert_eq!(outcome.report.rows_removed(), 1);
    }

    #[test]
    fn test_run_winsorization_skips_detection() {
        let plan = CleaningPlan::builder()
            .method(DetectionMethod::ZScore)
            .strategy("winsorization")
            .limits(0.0, 0.8)
            .build()
            .unwrap();
        let outcome = OutlierPipeline::new(plan).unwrap().run(&sample_df()).unwrap();

        assert_eq!(outcome.report.detector, None);
        assert_eq!(outcome.report.scores, serde_json::Value::Null);
        let x = crate::utils::finite_values(&outcome.data, "x").unwrap();
        assert_eq!(x[5], 13.0);
    }

    #[test]
    fn test_run_group_based_excludes_group_col_from_detection() {
        let df = df![
            "g" => [1i64, 1, 1, 2, 2, 2],
            "x" => [10.0, 11.0, 12.0, 13.0, 12.0, 500.0],
        ]
        .unwrap();
        let plan = CleaningPlan::builder()
            .strategy("group_based")
            .group_col("g")
            .build()
            .unwrap();
        let outcome = OutlierPipeline::new(plan).unwrap().run(&df).unwrap();
        assert_eq!(outcome.report.columns, vec!["x".to_string()]);

        let x = crate::utils::finite_values(&outcome.data, "x").unwrap();
        assert_eq!(x[5], 12.5);
    }

    #[test]
    fn test_run_error_keeps_code_through_context() {
        let df = df!["x" => [1.0, 1.0, 1.0, 1.0]].unwrap();
        let plan = CleaningPlan::default();
        let err = OutlierPipeline::new(plan).unwrap().run(&df).unwrap_err();
        assert_eq!(err.error_code(), "DET004");
        assert!(err.to_string().starts_with("Outlier detection failed"));
    }
}
