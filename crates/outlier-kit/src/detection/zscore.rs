//! Standard score against the column mean.

use super::{Detector, ScoreRule};
use crate::error::{ErrorCode, OutlierError, Result};
use crate::stats::{mean, population_std};
use serde::Serialize;

/// Flags values with `|x - mean| / std > threshold` (population std-dev).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreRule {
    threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZScoreStats {
    pub mean: f64,
    pub std_dev: f64,
}

pub type ZScoreDetector = Detector<ZScoreRule>;

impl ZScoreRule {
    pub const NAME: &'static str = "ZScoreDetector";
    pub const DEFAULT_THRESHOLD: f64 = 3.0;

    /// The threshold must be finite and strictly positive.
    pub fn new(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(OutlierError::configuration(
                ErrorCode::Con001,
                Self::NAME,
                "threshold",
                format!("{} is not a finite number", threshold),
            ));
        }
        if threshold <= 0.0 {
            return Err(OutlierError::configuration(
                ErrorCode::Con002,
                Self::NAME,
                "threshold",
                format!("{} <= 0", threshold),
            )
            .with_suggestion("Please input a value greater than 0."));
        }
        Ok(Self { threshold })
    }

    pub fn value(&self) -> f64 {
        self.threshold
    }
}

impl Default for ZScoreRule {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

impl ScoreRule for ZScoreRule {
    type Stats = ZScoreStats;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn threshold(&self) -> String {
        self.threshold.to_string()
    }

    fn compute(&self, column: &str, values: &[f64]) -> Result<ZScoreStats> {
        let Some(mean) = mean(values) else {
            return Err(OutlierError::detection(ErrorCode::Det002, Self::NAME, column));
        };
        let std_dev = population_std(values, mean).unwrap_or(0.0);

        if !mean.is_finite() || !std_dev.is_finite() {
            return Err(OutlierError::detection(ErrorCode::Det006, Self::NAME, column));
        }
        if std_dev == 0.0 {
            return Err(OutlierError::detection(ErrorCode::Det003, Self::NAME, column)
                .with_suggestion(
                    "Remove constant/uninformative features or verify data preprocessing (standard deviation is zero).",
                ));
        }

        Ok(ZScoreStats { mean, std_dev })
    }

    fn is_outlier(&self, stats: &ZScoreStats, value: f64) -> bool {
        ((value - stats.mean) / stats.std_dev).abs() > self.threshold
    }
}

impl Detector<ZScoreRule> {
    pub fn new(threshold: f64) -> Result<Self> {
        Ok(Self::with_rule(ZScoreRule::new(threshold)?))
    }
}
