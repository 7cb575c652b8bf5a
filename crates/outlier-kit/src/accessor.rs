//! Method-per-operation access to detectors and handlers on a `DataFrame`.
//!
//! ```rust,ignore
//! use outlier_kit::OutlierFrameExt;
//!
//! let mask = df.outli().columns(["price"]).iqr(1.5)?;
//! let cleaned = df.outli().median(&mask)?;
//! ```

use crate::detection::{
    IqrDetector, MadDetector, PercentileDetector, ZScoreDetector,
};
use crate::error::Result;
use crate::handling::{HandlingStrategy, InterpolationMethod, OutlierHandler, OutlierHandlerBuilder};
use crate::mask::OutlierMask;
use polars::prelude::*;

/// Adds the [`outli`](OutlierFrameExt::outli) accessor to `DataFrame`.
pub trait OutlierFrameExt {
    fn outli(&self) -> OutlierAccessor<'_>;
}

impl OutlierFrameExt for DataFrame {
    fn outli(&self) -> OutlierAccessor<'_> {
        OutlierAccessor {
            df: self,
            columns: None,
        }
    }
}

/// Borrowed view of a table with an optional column selection.
///
/// Every method builds a fresh detector or handler, so calls are independent.
#[derive(Debug, Clone)]
pub struct OutlierAccessor<'a> {
    df: &'a DataFrame,
    columns: Option<Vec<String>>,
}

impl<'a> OutlierAccessor<'a> {
    /// Restrict the following operation to these columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    // -------------------------------------------------------------------------
    // Detection
    // -------------------------------------------------------------------------

    pub fn iqr(&self, threshold: f64) -> Result<OutlierMask> {
        IqrDetector::new(threshold)?
            .with_optional_columns(self.columns.clone())
            .detect(self.df)
    }

    pub fn zscore(&self, threshold: f64) -> Result<OutlierMask> {
        ZScoreDetector::new(threshold)?
            .with_optional_columns(self.columns.clone())
            .detect(self.df)
    }

    pub fn mad(&self, threshold: f64) -> Result<OutlierMask> {
        MadDetector::new(threshold)?
            .with_optional_columns(self.columns.clone())
            .detect(self.df)
    }

    pub fn percentile(&self, lower: f64, upper: f64) -> Result<OutlierMask> {
        PercentileDetector::new(lower, upper)?
            .with_optional_columns(self.columns.clone())
            .detect(self.df)
    }

    // -------------------------------------------------------------------------
    // Handling
    // -------------------------------------------------------------------------

    fn handler(&self, strategy: HandlingStrategy) -> OutlierHandlerBuilder {
        OutlierHandler::builder()
            .strategy(strategy)
            .optional_columns(self.columns.clone())
    }

    pub fn mean(&self, mask: &OutlierMask) -> Result<DataFrame> {
        self.handler(HandlingStrategy::Mean).build()?.apply(self.df, Some(mask))
    }

    pub fn median(&self, mask: &OutlierMask) -> Result<DataFrame> {
        self.handler(HandlingStrategy::Median).build()?.apply(self.df, Some(mask))
    }

    pub fn remove(&self, mask: &OutlierMask) -> Result<DataFrame> {
        self.handler(HandlingStrategy::Remove).build()?.apply(self.df, Some(mask))
    }

    /// Winsorize at the given quantile limits; no mask needed.
    pub fn winsor(&self, lower: f64, upper: f64) -> Result<DataFrame> {
        self.handler(HandlingStrategy::Winsorization)
            .limits(lower, upper)
            .build()?
            .apply(self.df, None)
    }

    /// Constant replacement.
    pub fn conrep(&self, mask: &OutlierMask, fill_value: f64) -> Result<DataFrame> {
        self.handler(HandlingStrategy::Constant)
            .fill_value(fill_value)
            .build()?
            .apply(self.df, Some(mask))
    }

    pub fn interpolate(&self, mask: &OutlierMask, method: InterpolationMethod) -> Result<DataFrame> {
        self.handler(HandlingStrategy::Interpolation)
            .interpolation(method)
            .build()?
            .apply(self.df, Some(mask))
    }

    /// Group-wise median replacement keyed by `group_col`.
    pub fn group(&self, mask: &OutlierMask, group_col: &str) -> Result<DataFrame> {
        self.handler(HandlingStrategy::GroupBased)
            .group_col(group_col)
            .build()?
            .apply(self.df, Some(mask))
    }
}
