//! Fixed quantile band.

use super::{Detector, ScoreRule};
use crate::error::{ErrorCode, OutlierError, Result};
use crate::stats::{quantile_sorted, sorted};
use serde::Serialize;

/// Flags values below the `lower_q` quantile or above the `upper_q` quantile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileRule {
    lower_q: f64,
    upper_q: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileStats {
    pub lower_bound: f64,
    pub upper_bound: f64,
}

pub type PercentileDetector = Detector<PercentileRule>;

/// Check a `(lower, upper)` quantile pair: finite, `0 <= lower < upper <= 1`.
pub(crate) fn validate_band(component: &str, parameter: &str, lower: f64, upper: f64) -> Result<()> {
    if !lower.is_finite() || !upper.is_finite() {
        return Err(OutlierError::configuration(
            ErrorCode::Con001,
            component,
            parameter,
            format!("({}, {}) contains a non-finite value", lower, upper),
        ));
    }
    if !(0.0 <= lower && lower < upper && upper <= 1.0) {
        return Err(OutlierError::configuration(
            ErrorCode::Con002,
            component,
            parameter,
            format!(
                "({}, {}) must satisfy 0 <= lower < upper <= 1",
                lower, upper
            ),
        )
        .with_suggestion("Example: (0.05, 0.95) for the 5th and 95th percentiles."));
    }
    Ok(())
}

impl PercentileRule {
    pub const NAME: &'static str = "PercentileDetector";
    pub const DEFAULT_BAND: (f64, f64) = (0.05, 0.95);

    pub fn new(lower_q: f64, upper_q: f64) -> Result<Self> {
        validate_band(Self::NAME, "threshold", lower_q, upper_q)?;
        Ok(Self { lower_q, upper_q })
    }

    pub fn band(&self) -> (f64, f64) {
        (self.lower_q, self.upper_q)
    }
}

impl Default for PercentileRule {
    fn default() -> Self {
        let (lower_q, upper_q) = Self::DEFAULT_BAND;
        Self { lower_q, upper_q }
    }
}

impl ScoreRule for PercentileRule {
    type Stats = PercentileStats;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn threshold(&self) -> String {
        format!("({}, {})", self.lower_q, self.upper_q)
    }

    fn compute(&self, column: &str, values: &[f64]) -> Result<PercentileStats> {
        let sorted = sorted(values);
        let (Some(lower_bound), Some(upper_bound)) = (
            quantile_sorted(&sorted, self.lower_q),
            quantile_sorted(&sorted, self.upper_q),
        ) else {
            return Err(OutlierError::detection(ErrorCode::Det002, Self::NAME, column));
        };

        if lower_bound == upper_bound {
            return Err(OutlierError::detection(ErrorCode::Det003, Self::NAME, column)
                .with_suggestion(
                    "The percentile range collapsed to a single value. Remove constant/uninformative features.",
                ));
        }

        Ok(PercentileStats {
            lower_bound,
            upper_bound,
        })
    }

    fn is_outlier(&self, stats: &PercentileStats, value: f64) -> bool {
        value < stats.lower_bound || value > stats.upper_bound
    }
}

impl Detector<PercentileRule> {
    pub fn new(lower_q: f64, upper_q: f64) -> Result<Self> {
        Ok(Self::with_rule(PercentileRule::new(lower_q, upper_q)?))
    }
}
