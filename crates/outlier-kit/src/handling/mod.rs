//! Outlier handling strategies.
//!
//! An [`OutlierHandler`] is built once from a strategy name and its
//! parameters, then applied to a table together with the mask a detector
//! produced. Winsorization is the only strategy that works without a mask.
//! The caller's table is never modified; `apply` returns a new frame.
//!
//! # Example
//!
//! ```rust,ignore
//! use outlier_kit::detection::IqrDetector;
//! use outlier_kit::handling::OutlierHandler;
//!
//! let mask = IqrDetector::default().detect(&df)?;
//! let handler = OutlierHandler::builder().method("median").build()?;
//! let cleaned = handler.apply(&df, Some(&mask))?;
//! ```

mod group;
mod replace;
mod winsorize;

use crate::detection::validate_band;
use crate::error::{ErrorCode, OutlierError, Result};
use crate::mask::OutlierMask;
use crate::validation::validate_columns;
use polars::prelude::*;
use replace::Central;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

pub(crate) const COMPONENT: &str = "OutlierHandler";

/// Quantile limits used by winsorization when none are given.
pub const DEFAULT_LIMITS: (f64, f64) = (0.05, 0.95);

/// How flagged values are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HandlingStrategy {
    /// Drop rows with an outlier in any handled column
    Remove,
    /// Replace outliers with the mean of the remaining values
    #[default]
    Mean,
    /// Replace outliers with the median of the remaining values
    Median,
    /// Clip every value to a quantile band (no mask needed)
    Winsorization,
    /// Replace outliers with a fixed value
    Constant,
    /// Fill outliers from neighbouring rows
    Interpolation,
    /// Replace outliers with the median of their group
    GroupBased,
}

impl HandlingStrategy {
    pub const ALL: [HandlingStrategy; 7] = [
        Self::Remove,
        Self::Mean,
        Self::Median,
        Self::Winsorization,
        Self::Constant,
        Self::Interpolation,
        Self::GroupBased,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remove => "remove",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Winsorization => "winsorization",
            Self::Constant => "constant",
            Self::Interpolation => "interpolation",
            Self::GroupBased => "group_based",
        }
    }

    /// Whether `apply` needs an outlier mask for this strategy.
    pub fn requires_mask(self) -> bool {
        self != Self::Winsorization
    }
}

impl fmt::Display for HandlingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandlingStrategy {
    type Err = OutlierError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                OutlierError::handling(
                    ErrorCode::Hex000,
                    COMPONENT,
                    format!("'{}' is not one of [{}]", s, allowed.join(", ")),
                )
            })
    }
}

/// Gap filling used by the interpolation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    #[default]
    Linear,
    Nearest,
}

impl InterpolationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Nearest => "nearest",
        }
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpolationMethod {
    type Err = OutlierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "nearest" => Ok(Self::Nearest),
            _ => Err(OutlierError::configuration(
                ErrorCode::Con003,
                COMPONENT,
                "interpolation",
                format!("'{}' is not one of [linear, nearest]", s),
            )),
        }
    }
}

/// A validated handling strategy with its parameters.
///
/// Use [`OutlierHandler::builder()`] to create one.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierHandler {
    strategy: HandlingStrategy,
    columns: Option<Vec<String>>,
    fill_value: Option<f64>,
    limits: (f64, f64),
    group_col: Option<String>,
    interpolation: InterpolationMethod,
}

static_assertions::assert_impl_all!(OutlierHandler: Send, Sync);

impl OutlierHandler {
    pub fn builder() -> OutlierHandlerBuilder {
        OutlierHandlerBuilder::default()
    }

    pub fn strategy(&self) -> HandlingStrategy {
        self.strategy
    }

    /// Requested columns (`None` means every numeric column).
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn fill_value(&self) -> Option<f64> {
        self.fill_value
    }

    pub fn limits(&self) -> (f64, f64) {
        self.limits
    }

    pub fn group_col(&self) -> Option<&str> {
        self.group_col.as_deref()
    }

    pub fn interpolation(&self) -> InterpolationMethod {
        self.interpolation
    }

    /// Apply the strategy to a copy of `df`.
    ///
    /// Every strategy except winsorization needs `mask`, built from a table
    /// with the same number of rows as `df`. Columns absent from the mask are
    /// left alone, and so are columns without a single flagged value.
    pub fn apply(&self, df: &DataFrame, mask: Option<&OutlierMask>) -> Result<DataFrame> {
        let exclude: Vec<String> = match self.strategy {
            HandlingStrategy::GroupBased => self.group_col.iter().cloned().collect(),
            _ => Vec::new(),
        };
        let columns = validate_columns(df, COMPONENT, self.columns.as_deref(), &exclude)?;
        let mut out = df.clone();

        if self.strategy == HandlingStrategy::Winsorization {
            let mut total = 0;
            for column in columns.iter() {
                let clipped = winsorize::clip_column(&mut out, column, self.limits)?;
                debug!("[{}] clipped {} values in '{}'", COMPONENT, clipped, column);
                total += clipped;
            }
            info!(
                "[{}] winsorized {} columns at {:?}, {} values clipped",
                COMPONENT,
                columns.len(),
                self.limits,
                total
            );
            return Ok(out);
        }

        let Some(mask) = mask else {
            return Err(OutlierError::handling(
                ErrorCode::Hex001,
                COMPONENT,
                format!("strategy '{}' requires an outlier mask", self.strategy),
            ));
        };
        if mask.height() != df.height() {
            return Err(OutlierError::handling(
                ErrorCode::Hex002,
                COMPONENT,
                format!("table has {} rows, mask has {}", df.height(), mask.height()),
            ));
        }

        let skipped: Vec<&str> = columns
            .iter()
            .filter(|c| !mask.contains(c))
            .map(String::as_str)
            .collect();
        if !skipped.is_empty() {
            warn!("[{}] no mask for columns {:?}, left unchanged", COMPONENT, skipped);
        }

        if self.strategy == HandlingStrategy::Remove {
            let keep: Vec<bool> = mask
                .rows_with_outliers(&columns)
                .into_iter()
                .map(|flagged| !flagged)
                .collect();
            let keep = BooleanChunked::from_slice("keep".into(), &keep);
            let out = out.filter(&keep)?;
            info!(
                "[{}] removed {} rows containing outliers",
                COMPONENT,
                df.height() - out.height()
            );
            return Ok(out);
        }

        let group_keys = match (self.strategy, self.group_col.as_deref()) {
            (HandlingStrategy::GroupBased, Some(group_col)) => {
                if df.column(group_col).is_err() {
                    return Err(OutlierError::handling(
                        ErrorCode::Hex001,
                        COMPONENT,
                        format!("group column '{}' is not in the table", group_col),
                    )
                    .with_suggestion("Pass a valid 'group_col' for the group_based strategy."));
                }
                Some(group::group_keys(df, group_col)?)
            }
            _ => None,
        };

        let mut replaced = 0;
        for column in columns.iter() {
            if self.group_col.as_deref() == Some(column.as_str())
                && self.strategy == HandlingStrategy::GroupBased
            {
                continue;
            }
            let Some(flags) = mask.column(column) else {
                continue;
            };
            let count = flags.iter().filter(|f| **f).count();
            if count == 0 {
                continue;
            }

            match self.strategy {
                HandlingStrategy::Mean | HandlingStrategy::Median => {
                    let central = if self.strategy == HandlingStrategy::Mean {
                        Central::Mean
                    } else {
                        Central::Median
                    };
                    let value = replace::fill_central(&mut out, column, &flags, central)?;
                    debug!(
                        "[{}] '{}': {} outliers -> {} {}",
                        COMPONENT, column, count, self.strategy, value
                    );
                }
                HandlingStrategy::Constant => {
                    let value = self.fill_value.ok_or_else(|| self.missing_parameter("fill_value"))?;
                    replace::fill_constant(&mut out, column, &flags, value)?;
                    debug!("[{}] '{}': {} outliers -> {}", COMPONENT, column, count, value);
                }
                HandlingStrategy::Interpolation => {
                    replace::fill_interpolated(&mut out, column, &flags, self.interpolation)?;
                    debug!(
                        "[{}] '{}': {} outliers interpolated ({})",
                        COMPONENT, column, count, self.interpolation
                    );
                }
                HandlingStrategy::GroupBased => {
                    let keys = group_keys
                        .as_deref()
                        .ok_or_else(|| self.missing_parameter("group_col"))?;
                    let fallbacks = group::fill_group_median(&mut out, column, &flags, keys)?;
                    debug!(
                        "[{}] '{}': {} outliers -> group median ({} from global median)",
                        COMPONENT, column, count, fallbacks
                    );
                }
                HandlingStrategy::Remove | HandlingStrategy::Winsorization => {}
            }
            replaced += count;
        }

        info!(
            "[{}] {} replaced {} outliers",
            COMPONENT, self.strategy, replaced
        );
        Ok(out)
    }

    fn missing_parameter(&self, parameter: &str) -> OutlierError {
        OutlierError::handling(
            ErrorCode::Hex001,
            COMPONENT,
            format!("strategy '{}' requires '{}'", self.strategy, parameter),
        )
    }
}

impl fmt::Display for OutlierHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} strategy '{}'", COMPONENT, self.strategy)?;
        match &self.columns {
            Some(cols) => write!(f, " on [{}]", cols.join(", ")),
            None => write!(f, " on all numeric columns"),
        }
    }
}

/// Builder for [`OutlierHandler`] with fluent API.
#[derive(Debug, Default)]
pub struct OutlierHandlerBuilder {
    method: Option<String>,
    columns: Option<Vec<String>>,
    fill_value: Option<f64>,
    limits: Option<(f64, f64)>,
    group_col: Option<String>,
    interpolation: Option<InterpolationMethod>,
}

impl OutlierHandlerBuilder {
    /// Select the strategy by name, e.g. `"median"` or `"group_based"`.
    ///
    /// Unknown names are reported by [`build`](Self::build).
    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.method = Some(name.into());
        self
    }

    pub fn strategy(mut self, strategy: HandlingStrategy) -> Self {
        self.method = Some(strategy.as_str().to_string());
        self
    }

    /// Restrict handling to the given columns instead of every numeric column.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn optional_columns(mut self, columns: Option<Vec<String>>) -> Self {
        self.columns = columns;
        self
    }

    /// Replacement value for the constant strategy.
    pub fn fill_value(mut self, value: f64) -> Self {
        self.fill_value = Some(value);
        self
    }

    /// Quantile limits for winsorization. Default: (0.05, 0.95)
    pub fn limits(mut self, lower: f64, upper: f64) -> Self {
        self.limits = Some((lower, upper));
        self
    }

    /// Grouping column for the group_based strategy.
    pub fn group_col(mut self, column: impl Into<String>) -> Self {
        self.group_col = Some(column.into());
        self
    }

    pub fn interpolation(mut self, method: InterpolationMethod) -> Self {
        self.interpolation = Some(method);
        self
    }

    /// Build the handler.
    ///
    /// Fails with `HEX000` for an unknown strategy name, `HEX001` when the
    /// strategy's required parameter is missing and `CON001`/`CON002` for
    /// invalid limits or fill value.
    pub fn build(self) -> Result<OutlierHandler> {
        let strategy = match &self.method {
            Some(name) => name.parse()?,
            None => HandlingStrategy::default(),
        };

        let limits = self.limits.unwrap_or(DEFAULT_LIMITS);
        validate_band(COMPONENT, "limits", limits.0, limits.1)?;

        if let Some(value) = self.fill_value
            && !value.is_finite()
        {
            return Err(OutlierError::configuration(
                ErrorCode::Con001,
                COMPONENT,
                "fill_value",
                format!("{} is not a finite number", value),
            ));
        }

        let group_col = self.group_col.filter(|g| !g.is_empty());
        let required = match strategy {
            HandlingStrategy::Constant if self.fill_value.is_none() => Some("fill_value"),
            HandlingStrategy::GroupBased if group_col.is_none() => Some("group_col"),
            _ => None,
        };
        if let Some(parameter) = required {
            return Err(OutlierError::handling(
                ErrorCode::Hex001,
                COMPONENT,
                format!("strategy '{}' requires '{}'", strategy, parameter),
            ));
        }

        Ok(OutlierHandler {
            strategy,
            columns: self.columns,
            fill_value: self.fill_value,
            limits,
            group_col,
            interpolation: self.interpolation.unwrap_or_default(),
        })
    }
}
