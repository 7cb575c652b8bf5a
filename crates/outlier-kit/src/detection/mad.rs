//! Modified z-score against the median absolute deviation.

use super::{Detector, ScoreRule};
use crate::error::{ErrorCode, OutlierError, Result};
use crate::stats::{MAD_SCALE, median, median_absolute_deviation};
use serde::Serialize;

/// Flags values with `0.67449 · |x - median| / mad > threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MadRule {
    threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MadStats {
    pub median: f64,
    pub mad: f64,
}

pub type MadDetector = Detector<MadRule>;

impl MadRule {
    pub const NAME: &'static str = "MADDetector";
    pub const DEFAULT_THRESHOLD: f64 = 3.5;

    /// The threshold must be finite and non-negative.
    pub fn new(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(OutlierError::configuration(
                ErrorCode::Con001,
                Self::NAME,
                "threshold",
                format!("{} is not a finite number", threshold),
            ));
        }
        if threshold < 0.0 {
            return Err(OutlierError::configuration(
                ErrorCode::Con002,
                Self::NAME,
                "threshold",
                format!("{} < 0", threshold),
            )
            .with_suggestion("Please input a value greater than or equal to 0."));
        }
        Ok(Self { threshold })
    }

    pub fn value(&self) -> f64 {
        self.threshold
    }

    /// Modified z-score of `value` under `stats`.
    pub fn modified_z(stats: &MadStats, value: f64) -> f64 {
        MAD_SCALE * (value - stats.median).abs() / stats.mad
    }
}

impl Default for MadRule {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

impl ScoreRule for MadRule {
    type Stats = MadStats;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn threshold(&self) -> String {
        self.threshold.to_string()
    }

    fn compute(&self, column: &str, values: &[f64]) -> Result<MadStats> {
        let Some(median) = median(values) else {
            return Err(OutlierError::detection(ErrorCode::Det002, Self::NAME, column));
        };
        let mad = median_absolute_deviation(values, median).unwrap_or(0.0);

        if mad == 0.0 {
            return Err(OutlierError::detection(ErrorCode::Det005, Self::NAME, column)
                .with_suggestion(
                    "Zero median absolute deviation (MAD = 0). Remove constant/uninformative features.",
                ));
        }
        if !median.is_finite() || !mad.is_finite() {
            return Err(OutlierError::detection(ErrorCode::Det006, Self::NAME, column));
        }

        Ok(MadStats { median, mad })
    }

    fn is_outlier(&self, stats: &MadStats, value: f64) -> bool {
        Self::modified_z(stats, value) > self.threshold
    }
}

impl Detector<MadRule> {
    pub fn new(threshold: f64) -> Result<Self> {
        Ok(Self::with_rule(MadRule::new(threshold)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_flags_spike() {
        let df = df!["x" => [10.0, 12.0, 11.0, 13.0, 12.0, 11.0, 95.0]].unwrap();
        let mut detector = MadDetector::default();
        let mask = detector.detect(&df).unwrap();

        assert_eq!(
            mask.column("x"),
            Some(vec![false, false, false, false, false, false, true])
        );
        let stats = detector.scores().unwrap().get("x").unwrap();
        assert_eq!(stats.median, 12.0);
        assert_eq!(stats.mad, 1.0);
    }

    #[test]
    fn test_threshold_boundary_is_exclusive() {
        let stats = MadStats {
            median: 0.0,
            mad: MAD_SCALE,
        };
        let rule = MadRule::new(2.0).unwrap();
        assert!(!rule.is_outlier(&stats, 2.0));
        assert!(rule.is_outlier(&stats, 2.5));
        assert!(rule.is_outlier(&stats, -2.5));
    }

    #[test]
    fn test_zero_median_is_fine_when_mad_is_not() {
        // Centered data: median 0 must not be mistaken for a degenerate spread.
        let df = df!["x" => [-2.0, -1.0, 0.0, 1.0, 2.0, 40.0, -3.0]].unwrap();
        let mut detector = MadDetector::default();
        let mask = detector.detect(&df).unwrap();
        assert_eq!(mask.outlier_count("x"), Some(1));
    }

    #[test]
    fn test_zero_mad_is_detection_error() {
        // More than half the values are identical, so MAD collapses to 0.
        let df = df!["x" => [5.0, 5.0, 5.0, 5.0, 9.0]].unwrap();
        let err = MadDetector::default().detect(&df).unwrap_err();
        assert_eq!(err.error_code(), "DET005");
    }

    #[test]
    fn test_negative_threshold_rejected() {
        assert_eq!(MadDetector::new(-1.0).unwrap_err().error_code(), "CON002");
        assert!(MadDetector::new(0.0).is_ok());
    }
}
