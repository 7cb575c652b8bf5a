//! Univariate outlier detectors.
//!
//! Every detector follows the same lifecycle: validate the table, compute
//! per-column statistics (`fit`), then turn those statistics into a boolean
//! [`OutlierMask`] (`detect`). The statistics and the outlier rule are the
//! only things that vary, so they live behind [`ScoreRule`] and the lifecycle
//! is implemented once in [`Detector`].
//!
//! # Example
//!
//! ```rust,ignore
//! use outlier_kit::detection::IqrDetector;
//!
//! let mut detector = IqrDetector::new(1.5)?.with_columns(["price"]);
//! let mask = detector.detect(&df)?;
//! println!("{} outliers", mask.total_outliers());
//! ```

mod iqr;
mod mad;
mod percentile;
mod zscore;

pub use iqr::{IqrDetector, IqrRule, IqrStats};
pub use mad::{MadDetector, MadRule, MadStats};
pub use percentile::{PercentileDetector, PercentileRule, PercentileStats};
pub use zscore::{ZScoreDetector, ZScoreRule, ZScoreStats};

pub(crate) use percentile::validate_band;

use crate::error::{ColumnIssues, ErrorCode, OutlierError, Result};
use crate::mask::OutlierMask;
use crate::utils::{column_as_f64, finite_values, is_numeric_dtype};
use crate::validation::{ResolvedColumns, validate_columns};
use polars::prelude::*;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Per-column statistics and the rule that turns them into outlier flags.
pub trait ScoreRule {
    /// Statistics bundle stored per column after fitting.
    type Stats: Clone + fmt::Debug + Serialize;

    /// Component name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Human readable threshold, e.g. `1.5` or `(0.05, 0.95)`.
    fn threshold(&self) -> String;

    /// Compute the statistics of one column. `values` are all finite.
    fn compute(&self, column: &str, values: &[f64]) -> Result<Self::Stats>;

    fn is_outlier(&self, stats: &Self::Stats, value: f64) -> bool;
}

/// Ordered mapping column → statistics. Keys equal the resolved columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord<S> {
    entries: Vec<(String, S)>,
}

impl<S> ScoreRecord<S> {
    pub fn get(&self, column: &str) -> Option<&S> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, stats)| stats)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &S)> {
        self.entries.iter().map(|(name, stats)| (name.as_str(), stats))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Serialize> Serialize for ScoreRecord<S> {
    fn serialize<Ser>(&self, serializer: Ser) -> std::result::Result<Ser::Ok, Ser::Error>
    where
        Ser: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, stats) in &self.entries {
            map.serialize_entry(name, stats)?;
        }
        map.end()
    }
}

/// State produced by a successful `fit`.
#[derive(Debug, Clone)]
struct Fitted<S> {
    columns: ResolvedColumns,
    scores: ScoreRecord<S>,
}

/// Generic detector: a [`ScoreRule`] plus the fit/detect lifecycle.
///
/// Re-fitting recomputes and overwrites the scores. `detect` fits on the
/// given table when the detector is unfitted; otherwise it reuses the scores
/// from the last `fit`, even when called on a different table.
#[derive(Debug, Clone)]
pub struct Detector<R: ScoreRule> {
    rule: R,
    requested: Option<Vec<String>>,
    fitted: Option<Fitted<R::Stats>>,
}

impl<R: ScoreRule + Default> Default for Detector<R> {
    fn default() -> Self {
        Self::with_rule(R::default())
    }
}

impl<R: ScoreRule> Detector<R> {
    pub fn with_rule(rule: R) -> Self {
        Self {
            rule,
            requested: None,
            fitted: None,
        }
    }

    /// Restrict analysis to the given columns instead of every numeric column.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn with_optional_columns(mut self, columns: Option<Vec<String>>) -> Self {
        self.requested = columns;
        self
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    pub fn name(&self) -> &'static str {
        self.rule.name()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Columns requested at construction (`None` means all numeric columns).
    pub fn requested_columns(&self) -> Option<&[String]> {
        self.requested.as_deref()
    }

    /// Resolved columns after `fit`, otherwise the requested ones.
    pub fn columns(&self) -> Option<&[String]> {
        match &self.fitted {
            Some(fitted) => Some(fitted.columns.as_slice()),
            None => self.requested_columns(),
        }
    }

    pub fn scores(&self) -> Option<&ScoreRecord<R::Stats>> {
        self.fitted.as_ref().map(|f| &f.scores)
    }

    /// Validate `df` and compute fresh statistics for every resolved column.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.fitted = None;
        self.fitted = Some(self.compute_fit(df)?);
        Ok(self)
    }

    /// Flag outliers in `df`, fitting first if needed.
    pub fn detect(&mut self, df: &DataFrame) -> Result<OutlierMask> {
        let fitted = match self.fitted.take() {
            Some(fitted) => fitted,
            None => self.compute_fit(df)?,
        };
        let mask = self.apply_scores(&fitted, df);
        self.fitted = Some(fitted);
        mask
    }

    fn compute_fit(&self, df: &DataFrame) -> Result<Fitted<R::Stats>> {
        let name = self.rule.name();
        let columns = validate_columns(df, name, self.requested.as_deref(), &[])?;

        let mut entries = Vec::with_capacity(columns.len());
        for column in columns.iter() {
            let values = finite_values(df, column)?;
            let stats = self.rule.compute(column, &values)?;
            debug!("[{}] {}: {:?}", name, column, stats);
            entries.push((column.clone(), stats));
        }

        Ok(Fitted {
            columns,
            scores: ScoreRecord { entries },
        })
    }

    fn apply_scores(&self, fitted: &Fitted<R::Stats>, df: &DataFrame) -> Result<OutlierMask> {
        let name = self.rule.name();

        let mut issues = ColumnIssues::default();
        for column in fitted.columns.iter() {
            match df.column(column) {
                Err(_) => issues.missing.push(column.clone()),
                Ok(col) if !is_numeric_dtype(col.dtype()) => issues.invalid.push(column.clone()),
                Ok(_) => {}
            }
        }
        if !issues.is_empty() {
            return Err(OutlierError::invalid_columns(issues.code(), name, issues)
                .with_suggestion("Detect on a table with the columns the detector was fitted on."));
        }

        let height = df.height();
        let mut flags = Vec::with_capacity(fitted.scores.len());
        for (column, stats) in fitted.scores.iter() {
            let column_flags: Vec<bool> = column_as_f64(df, column)?
                .into_iter()
                .map(|v| v.is_some_and(|x| !x.is_nan() && self.rule.is_outlier(stats, x)))
                .collect();

            let count = column_flags.iter().filter(|f| **f).count();
            if height > 0 && count == height {
                warn!("[{}] every row of '{}' was flagged as an outlier", name, column);
            }
            debug!("[{}] {} outliers in '{}'", name, count, column);
            flags.push((column.to_string(), column_flags));
        }

        OutlierMask::from_flags(height, flags)
    }
}

impl<R: ScoreRule> fmt::Display for Detector<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.columns() {
            Some(cols) => write!(
                f,
                "{} using threshold {} on [{}]",
                self.name(),
                self.rule.threshold(),
                cols.join(", ")
            ),
            None => write!(
                f,
                "{} using threshold {} on all numeric columns",
                self.name(),
                self.rule.threshold()
            ),
        }
    }
}

static_assertions::assert_impl_all!(IqrDetector: Send, Sync);
static_assertions::assert_impl_all!(ZScoreDetector: Send, Sync);
static_assertions::assert_impl_all!(MadDetector: Send, Sync);
static_assertions::assert_impl_all!(PercentileDetector: Send, Sync);

// =============================================================================
// Runtime dispatch
// =============================================================================

/// Detection algorithm selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    /// Interquartile range fences
    #[default]
    Iqr,
    /// Standard score against mean and population std-dev
    ZScore,
    /// Modified z-score against median and MAD
    Mad,
    /// Fixed quantile band
    Percentile,
}

impl DetectionMethod {
    pub const ALL: [DetectionMethod; 4] = [Self::Iqr, Self::ZScore, Self::Mad, Self::Percentile];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Iqr => "iqr",
            Self::ZScore => "zscore",
            Self::Mad => "mad",
            Self::Percentile => "percentile",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMethod {
    type Err = OutlierError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s.to_ascii_lowercase())
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                OutlierError::configuration(
                    ErrorCode::Con003,
                    "DetectionMethod",
                    "method",
                    format!("'{}' is not one of [{}]", s, allowed.join(", ")),
                )
            })
    }
}

/// Any of the built-in detectors, for callers that pick the algorithm at runtime.
#[derive(Debug, Clone)]
pub enum AnyDetector {
    Iqr(IqrDetector),
    ZScore(ZScoreDetector),
    Mad(MadDetector),
    Percentile(PercentileDetector),
}

macro_rules! dispatch {
    ($self:expr, $d:ident => $body:expr) => {
        match $self {
            AnyDetector::Iqr($d) => $body,
            AnyDetector::ZScore($d) => $body,
            AnyDetector::Mad($d) => $body,
            AnyDetector::Percentile($d) => $body,
        }
    };
}

impl AnyDetector {
    /// Build a detector with the method's defaults for any parameter left as `None`.
    ///
    /// `threshold` applies to IQR, Z-score and MAD; `percentiles` to the percentile detector.
    pub fn from_method(
        method: DetectionMethod,
        threshold: Option<f64>,
        percentiles: Option<(f64, f64)>,
        columns: Option<Vec<String>>,
    ) -> Result<Self> {
        let detector = match method {
            DetectionMethod::Iqr => Self::Iqr(
                Detector::with_rule(IqrRule::new(threshold.unwrap_or(IqrRule::DEFAULT_MULTIPLIER))?)
                    .with_optional_columns(columns),
            ),
            DetectionMethod::ZScore => Self::ZScore(
                Detector::with_rule(ZScoreRule::new(
                    threshold.unwrap_or(ZScoreRule::DEFAULT_THRESHOLD),
                )?)
                .with_optional_columns(columns),
            ),
            DetectionMethod::Mad => Self::Mad(
                Detector::with_rule(MadRule::new(threshold.unwrap_or(MadRule::DEFAULT_THRESHOLD))?)
                    .with_optional_columns(columns),
            ),
            DetectionMethod::Percentile => {
                let (lower, upper) = percentiles.unwrap_or(PercentileRule::DEFAULT_BAND);
                Self::Percentile(
                    Detector::with_rule(PercentileRule::new(lower, upper)?)
                        .with_optional_columns(columns),
                )
            }
        };
        Ok(detector)
    }

    pub fn method(&self) -> DetectionMethod {
        match self {
            Self::Iqr(_) => DetectionMethod::Iqr,
            Self::ZScore(_) => DetectionMethod::ZScore,
            Self::Mad(_) => DetectionMethod::Mad,
            Self::Percentile(_) => DetectionMethod::Percentile,
        }
    }

    pub fn name(&self) -> &'static str {
        dispatch!(self, d => d.name())
    }

    pub fn is_fitted(&self) -> bool {
        dispatch!(self, d => d.is_fitted())
    }

    pub fn columns(&self) -> Option<&[String]> {
        dispatch!(self, d => d.columns())
    }

    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        dispatch!(&mut *self, d => {
            d.fit(df)?;
        });
        Ok(self)
    }

    pub fn detect(&mut self, df: &DataFrame) -> Result<OutlierMask> {
        dispatch!(self, d => d.detect(df))
    }

    /// Fitted statistics as JSON (`null` before the first fit).
    pub fn scores_json(&self) -> Result<serde_json::Value> {
        let value = dispatch!(self, d => serde_json::to_value(d.scores())?);
        Ok(value)
    }
}

impl fmt::Display for AnyDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, d => fmt::Display::fmt(d, f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df![
            "x" => [1.0, 2.0, 3.0, 4.0, 5.0, 100.0],
            "y" => [10.0, 11.0, 12.0, 13.0, 14.0, 15.0],
            "label" => ["a", "b", "c", "d", "e", "f"],
        ]
        .unwrap()
    }

    #[test]
    fn test_fit_resolves_columns() {
        let mut detector = IqrDetector::default();
        assert_eq!(detector.columns(), None);
        assert!(!detector.is_fitted());

        detector.fit(&sample_df()).unwrap();

        assert!(detector.is_fitted());
        assert_eq!(detector.columns().unwrap(), &["x".to_string(), "y".to_string()]);
        let scores = detector.scores().unwrap();
        assert_eq!(scores.columns().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_detect_auto_fits() {
        let mut detector = IqrDetector::default();
        let mask = detector.detect(&sample_df()).unwrap();
        assert!(detector.is_fitted());
        assert_eq!(mask.columns(), vec!["x", "y"]);
        assert_eq!(mask.height(), 6);
    }

    #[test]
    fn test_refit_overwrites_scores() {
        let mut detector = ZScoreDetector::default().with_columns(["y"]);
        detector.fit(&sample_df()).unwrap();
        let first = detector.scores().unwrap().get("y").unwrap().mean;

        let shifted = df!["y" => [110.0, 111.0, 112.0, 113.0]].unwrap();
        detector.fit(&shifted).unwrap();
        let second = detector.scores().unwrap().get("y").unwrap().mean;

        assert_eq!(first, 12.5);
        assert_eq!(second, 111.5);
        assert_eq!(detector.scores().unwrap().len(), 1);
    }

    #[test]
    fn test_detect_on_other_table_reuses_fit_scores() {
        let mut detector = IqrDetector::default().with_columns(["y"]);
        detector.fit(&sample_df()).unwrap();
        let before = detector.scores().unwrap().clone();

        // Same column, very different values: no implicit re-fit, so 100 and 200 are outliers
        // against the fences computed from 10..=15.
        let other = df!["y" => [12.0, 100.0, 200.0]].unwrap();
        let mask = detector.detect(&other).unwrap();

        assert_eq!(detector.scores().unwrap(), &before);
        assert_eq!(mask.height(), 3);
        assert_eq!(mask.column("y"), Some(vec![false, true, true]));
    }

    #[test]
    fn test_detect_on_table_missing_fitted_column() {
        let mut detector = IqrDetector::default();
        detector.fit(&sample_df()).unwrap();

        let other = df!["x" => [1.0, 2.0]].unwrap();
        let err = detector.detect(&other).unwrap_err();
        assert_eq!(err.error_code(), "ICE001");
        assert_eq!(err.column_issues().unwrap().missing, vec!["y".to_string()]);
        // The fitted state survives the failed detect.
        assert!(detector.is_fitted());
    }

    #[test]
    fn test_detect_time_nulls_are_not_flagged() {
        let mut detector = IqrDetector::default().with_columns(["y"]);
        detector.fit(&sample_df()).unwrap();

        let other = df!["y" => [Some(1000.0), None, Some(f64::NAN)]].unwrap();
        let mask = detector.detect(&other).unwrap();
        assert_eq!(mask.column("y"), Some(vec![true, false, false]));
    }

    #[test]
    fn test_failed_fit_leaves_detector_unfitted() {
        let mut detector = IqrDetector::default();
        detector.fit(&sample_df()).unwrap();

        let constant = df!["x" => [1.0, 1.0, 1.0, 1.0]].unwrap();
        assert!(detector.fit(&constant).is_err());
        assert!(!detector.is_fitted());
    }

    #[test]
    fn test_display() {
        let detector = IqrDetector::new(2.0).unwrap().with_columns(["a", "b"]);
        assert_eq!(detector.to_string(), "IQRDetector using threshold 2 on [a, b]");

        let detector = PercentileDetector::default();
        assert_eq!(
            detector.to_string(),
            "PercentileDetector using threshold (0.05, 0.95) on all numeric columns"
        );
    }

    #[test]
    fn test_detection_method_from_str() {
        assert_eq!("IQR".parse::<DetectionMethod>().unwrap(), DetectionMethod::Iqr);
        assert_eq!("zscore".parse::<DetectionMethod>().unwrap(), DetectionMethod::ZScore);
        let err = "mahalanobis".parse::<DetectionMethod>().unwrap_err();
        assert_eq!(err.error_code(), "CON003");
    }

    #[test]
    fn test_any_detector_dispatch() {
        let mut detector =
            AnyDetector::from_method(DetectionMethod::Mad, None, None, Some(vec!["x".into()]))
                .unwrap();
        assert_eq!(detector.name(), "MADDetector");
        assert_eq!(detector.scores_json().unwrap(), serde_json::Value::Null);

        let mask = detector.detect(&sample_df()).unwrap();
        assert!(mask.column("x").unwrap()[5]);

        let scores = detector.scores_json().unwrap();
        assert_eq!(scores["x"]["median"], serde_json::json!(3.5));
    }

    #[test]
    fn test_any_detector_rejects_bad_threshold() {
        let err = AnyDetector::from_method(DetectionMethod::ZScore, Some(0.0), None, None)
            .unwrap_err();
        assert_eq!(err.error_code(), "CON002");

        let err = AnyDetector::from_method(DetectionMethod::Percentile, None, Some((0.9, 0.1)), None)
            .unwrap_err();
        assert_eq!(err.error_code(), "CON002");
    }
}
