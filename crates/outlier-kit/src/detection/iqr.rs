//! Interquartile-range fences.

use super::{Detector, ScoreRule};
use crate::error::{ErrorCode, OutlierError, Result};
use crate::stats::{quantile_sorted, sorted};
use serde::Serialize;

/// Flags values outside `[q1 - t·iqr, q3 + t·iqr]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrRule {
    multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrStats {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

pub type IqrDetector = Detector<IqrRule>;

impl IqrRule {
    pub const NAME: &'static str = "IQRDetector";
    pub const DEFAULT_MULTIPLIER: f64 = 1.5;

    /// The multiplier must be finite and non-negative.
    pub fn new(multiplier: f64) -> Result<Self> {
        if !multiplier.is_finite() {
            return Err(OutlierError::configuration(
                ErrorCode::Con001,
                Self::NAME,
                "threshold",
                format!("{} is not a finite number", multiplier),
            ));
        }
        if multiplier < 0.0 {
            return Err(OutlierError::configuration(
                ErrorCode::Con002,
                Self::NAME,
                "threshold",
                format!("{} < 0", multiplier),
            )
            .with_suggestion("Please input a value greater than or equal to 0."));
        }
        Ok(Self { multiplier })
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

impl Default for IqrRule {
    fn default() -> Self {
        Self {
            multiplier: Self::DEFAULT_MULTIPLIER,
        }
    }
}

impl ScoreRule for IqrRule {
    type Stats = IqrStats;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn threshold(&self) -> String {
        self.multiplier.to_string()
    }

    fn compute(&self, column: &str, values: &[f64]) -> Result<IqrStats> {
        let sorted = sorted(values);
        let (Some(q1), Some(q3)) = (quantile_sorted(&sorted, 0.25), quantile_sorted(&sorted, 0.75))
        else {
            return Err(OutlierError::detection(ErrorCode::Det002, Self::NAME, column));
        };
        let iqr = q3 - q1;

        if iqr == 0.0 {
            return Err(OutlierError::detection(ErrorCode::Det004, Self::NAME, column));
        }
        if !iqr.is_finite() {
            return Err(OutlierError::detection(ErrorCode::Det006, Self::NAME, column));
        }

        Ok(IqrStats {
            q1,
            q3,
            iqr,
            lower: q1 - self.multiplier * iqr,
            upper: q3 + self.multiplier * iqr,
        })
    }

    fn is_outlier(&self, stats: &IqrStats, value: f64) -> bool {
        value < stats.lower || value > stats.upper
    }
}

impl Detector<IqrRule> {
    pub fn new(threshold: f64) -> Result<Self> {
        Ok(Self::with_rule(IqrRule::new(threshold)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_flags_single_high_value() {
        let df = df!["x" => [1.0, 2.0, 3.0, 4.0, 5.0, 100.0]].unwrap();
        let mut detector = IqrDetector::new(1.5).unwrap();
        let mask = detector.detect(&df).unwrap();

        assert_eq!(
            mask.column("x"),
            Some(vec![false, false, false, false, false, true])
        );
        let stats = detector.scores().unwrap().get("x").unwrap();
        assert_eq!(stats.q1, 2.25);
        assert_eq!(stats.q3, 4.75);
        assert_eq!(stats.iqr, 2.5);
        assert_eq!(stats.lower, -1.5);
        assert_eq!(stats.upper, 8.5);
    }

    #[test]
    fn test_flags_both_tails() {
        let df = df!["x" => [-50.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 90.0]].unwrap();
        let mask = IqrDetector::default().detect(&df).unwrap();
        assert_eq!(
            mask.column("x"),
            Some(vec![true, false, false, false, false, false, false, true])
        );
    }

    #[test]
    fn test_zero_multiplier_uses_quartiles_as_fences() {
        let df = df!["x" => [1.0, 2.0, 3.0, 4.0, 5.0]].unwrap();
        let mask = IqrDetector::new(0.0).unwrap().detect(&df).unwrap();
        // q1 = 2, q3 = 4: only strictly outside values are flagged.
        assert_eq!(mask.column("x"), Some(vec![true, false, false, false, true]));
    }

    #[test]
    fn test_zero_iqr_is_detection_error() {
        let df = df!["x" => [7.0, 7.0, 7.0, 7.0, 8.0]].unwrap();
        let err = IqrDetector::default().detect(&df).unwrap_err();
        assert_eq!(err.error_code(), "DET004");
        assert_eq!(err.component(), Some("IQRDetector"));
        assert!(err.to_string().contains("Column: x"));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err = IqrDetector::new(-0.5).unwrap_err();
        assert_eq!(err.error_code(), "CON002");

        let err = IqrDetector::new(f64::NAN).unwrap_err();
        assert_eq!(err.error_code(), "CON001");
    }
}
