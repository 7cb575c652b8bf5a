//! Serializable configuration for detectors, handlers and cleaning plans.
//!
//! A [`CleaningPlan`] pairs one detector with one handler. Plans can be
//! written by hand as JSON and loaded with [`CleaningPlan::from_json_file`],
//! or assembled in code with the fluent [`CleaningPlanBuilder`].
//!
//! ```rust,ignore
//! use outlier_kit::config::CleaningPlan;
//! use outlier_kit::detection::DetectionMethod;
//!
//! let plan = CleaningPlan::builder()
//!     .method(DetectionMethod::Mad)
//!     .threshold(3.0)
//!     .strategy("median")
//!     .columns(["price", "quantity"])
//!     .build()?;
//! ```
//!
//! The equivalent JSON:
//!
//! ```json
//! {
//!   "detector": { "method": "mad", "threshold": 3.0, "columns": ["price", "quantity"] },
//!   "handler": { "strategy": "median", "columns": ["price", "quantity"] }
//! }
//! ```

use crate::detection::{AnyDetector, DetectionMethod};
use crate::error::{OutlierError, Result, ResultExt};
use crate::handling::{InterpolationMethod, OutlierHandler};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which detector to build and with what parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetectorConfig {
    /// Detection algorithm.
    /// Default: iqr
    pub method: DetectionMethod,

    /// IQR multiplier, z-score or modified z-score threshold.
    /// If None, the method's default is used (1.5, 3.0, 3.5).
    pub threshold: Option<f64>,

    /// Quantile band for the percentile method.
    /// Default: (0.05, 0.95)
    pub percentiles: Option<(f64, f64)>,

    /// Columns to analyze. If None, every numeric column.
    pub columns: Option<Vec<String>>,
}

impl DetectorConfig {
    pub fn build(&self) -> Result<AnyDetector> {
        AnyDetector::from_method(
            self.method,
            self.threshold,
            self.percentiles,
            self.columns.clone(),
        )
    }
}

/// Which handling strategy to build and with what parameters.
///
/// `strategy` and `interpolation` are kept as strings so that unknown names
/// are reported with the crate's error codes rather than as JSON errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Strategy name: remove, mean, median, winsorization, constant,
    /// interpolation or group_based.
    /// Default: "mean"
    pub strategy: String,

    /// Columns to handle. If None, every numeric column.
    pub columns: Option<Vec<String>>,

    /// Replacement for the constant strategy.
    pub fill_value: Option<f64>,

    /// Quantile limits for winsorization.
    /// Default: (0.05, 0.95)
    pub limits: Option<(f64, f64)>,

    /// Grouping column for the group_based strategy.
    pub group_col: Option<String>,

    /// "linear" or "nearest".
    /// Default: "linear"
    pub interpolation: Option<String>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            strategy: "mean".to_string(),
            columns: None,
            fill_value: None,
            limits: None,
            group_col: None,
            interpolation: None,
        }
    }
}

impl HandlerConfig {
    pub fn build(&self) -> Result<OutlierHandler> {
        let mut builder = OutlierHandler::builder()
            .method(self.strategy.as_str())
            .optional_columns(self.columns.clone());
        if let Some(value) = self.fill_value {
            builder = builder.fill_value(value);
        }
        if let Some((lower, upper)) = self.limits {
            builder = builder.limits(lower, upper);
        }
        if let Some(group_col) = &self.group_col {
            builder = builder.group_col(group_col.as_str());
        }
        if let Some(name) = &self.interpolation {
            builder = builder.interpolation(name.parse::<InterpolationMethod>()?);
        }
        builder.build()
    }
}

/// A detector and a handler applied one after the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CleaningPlan {
    pub detector: DetectorConfig,
    pub handler: HandlerConfig,
}

impl CleaningPlan {
    pub fn builder() -> CleaningPlanBuilder {
        CleaningPlanBuilder::default()
    }

    /// Load a plan from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(OutlierError::from)
            .context(format!("Failed to read plan '{}'", path.display()))?;
        Self::from_json_str(&text).context(format!("Invalid plan '{}'", path.display()))
    }

    /// Parse a plan from JSON text and validate it.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let plan: CleaningPlan = serde_json::from_str(text)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Check that both halves build.
    pub fn validate(&self) -> Result<()> {
        self.detector.build()?;
        self.handler.build()?;
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for [`CleaningPlan`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningPlanBuilder {
    detector: DetectorConfig,
    handler: HandlerConfig,
}

impl CleaningPlanBuilder {
    pub fn method(mut self, method: DetectionMethod) -> Self {
        self.detector.method = method;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.detector.threshold = Some(threshold);
        self
    }

    pub fn percentiles(mut self, lower: f64, upper: f64) -> Self {
        self.detector.percentiles = Some((lower, upper));
        self
    }

    /// Set the columns of both the detector and the handler.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.detector.columns = Some(columns.clone());
        self.handler.columns = Some(columns);
        self
    }

    pub fn strategy(mut self, name: impl Into<String>) -> Self {
        self.handler.strategy = name.into();
        self
    }

    pub fn fill_value(mut self, value: f64) -> Self {
        self.handler.fill_value = Some(value);
        self
    }

    pub fn limits(mut self, lower: f64, upper: f64) -> Self {
        self.handler.limits = Some((lower, upper));
        self
    }

    pub fn group_col(mut self, column: impl Into<String>) -> Self {
        self.handler.group_col = Some(column.into());
        self
    }

    pub fn interpolation(mut self, name: impl Into<String>) -> Self {
        self.handler.interpolation = Some(name.into());
        self
    }

    /// Build the plan.
    ///
    /// Returns a validated `CleaningPlan` or the first configuration error.
    pub fn build(self) -> Result<CleaningPlan> {
        let plan = CleaningPlan {
            detector: self.detector,
            handler: self.handler,
        };
        plan.validate()?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handling::HandlingStrategy;

    #[test]
    fn test_default_plan() {
        let plan = CleaningPlan::default();
        assert_eq!(plan.detector.method, DetectionMethod::Iqr);
        assert_eq!(plan.handler.strategy, "mean");
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let plan = CleaningPlan::builder()
            .method(DetectionMethod::ZScore)
            .threshold(2.5)
            .strategy("constant")
            .fill_value(0.0)
            .columns(["a", "b"])
            .build()
            .unwrap();

        assert_eq!(plan.detector.threshold, Some(2.5));
        assert_eq!(plan.detector.columns, plan.handler.columns);

        let handler = plan.handler.build().unwrap();
        assert_eq!(handler.strategy(), HandlingStrategy::Constant);
        assert_eq!(handler.fill_value(), Some(0.0));
    }

    #[test]
    fn test_builder_reports_handler_errors() {
        let err = CleaningPlan::builder().strategy("drop").build().unwrap_err();
        assert_eq!(err.error_code(), "HEX000");

        let err = CleaningPlan::builder().interpolation("spline").build().unwrap_err();
        assert_eq!(err.error_code(), "CON003");
    }

    #[test]
    fn test_builder_reports_detector_errors() {
        let err = CleaningPlan::builder()
            .method(DetectionMethod::Iqr)
            .threshold(-1.0)
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "CON002");
    }

    #[test]
    fn test_from_json_str_with_defaults() {
        let plan = CleaningPlan::from_json_str(
            r#"{ "detector": { "method": "percentile", "percentiles": [0.1, 0.9] },
                 "handler": { "strategy": "winsorization" } }"#,
        )
        .unwrap();

        assert_eq!(plan.detector.method, DetectionMethod::Percentile);
        assert_eq!(plan.detector.percentiles, Some((0.1, 0.9)));
        assert_eq!(plan.detector.threshold, None);
        assert_eq!(plan.handler.strategy, "winsorization");
    }

    #[test]
    fn test_from_json_str_rejects_unknown_method() {
        let err = CleaningPlan::from_json_str(r#"{ "detector": { "method": "lof" } }"#).unwrap_err();
        assert_eq!(err.error_code(), "JSON_ERROR");
        assert!(matches!(err, OutlierError::Json(_)));
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("outlier-kit-plan-{}.json", std::process::id()));
        let plan = CleaningPlan::builder()
            .method(DetectionMethod::Mad)
            .strategy("group_based")
            .group_col("region")
            .build()
            .unwrap();
        std::fs::write(&path, plan.to_json_pretty().unwrap()).unwrap();

        let loaded = CleaningPlan::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, plan);
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = CleaningPlan::from_json_file("/nonexistent/plan.json").unwrap_err();
        assert!(err.to_string().starts_with("Failed to read plan"));
    }
}
