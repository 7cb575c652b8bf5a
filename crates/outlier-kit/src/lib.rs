//! Outlier Detection and Handling Library
//!
//! Univariate outlier detection and treatment for polars `DataFrame`s.
//!
//! # Overview
//!
//! - **Detection**: IQR fences, z-score, modified z-score (MAD) and fixed
//!   percentile bands. Every detector fits per-column statistics and returns
//!   a Boolean [`OutlierMask`].
//! - **Handling**: remove, mean, median, winsorization, constant,
//!   interpolation and group-based median replacement, all driven by the mask.
//! - **Validation**: one column validator shared by detectors and handlers,
//!   reporting every problem at once with a stable error code.
//! - **Plans**: JSON-serializable [`CleaningPlan`]s and an [`OutlierPipeline`]
//!   that runs them end to end.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use outlier_kit::{IqrDetector, OutlierHandler};
//! use polars::prelude::*;
//!
//! let df = df!["price" => [10.0, 11.0, 12.0, 13.0, 500.0]]?;
//!
//! let mut detector = IqrDetector::new(1.5)?;
//! let mask = detector.detect(&df)?;
//!
//! let cleaned = OutlierHandler::builder()
//!     .method("median")
//!     .build()?
//!     .apply(&df, Some(&mask))?;
//! ```
//!
//! # Plans
//!
//! ```rust,ignore
//! use outlier_kit::{CleaningPlan, DetectionMethod, OutlierPipeline};
//!
//! let plan = CleaningPlan::builder()
//!     .method(DetectionMethod::Mad)
//!     .strategy("group_based")
//!     .group_col("region")
//!     .build()?;
//!
//! let outcome = OutlierPipeline::new(plan)?.run(&df)?;
//! println!("{}", serde_json::to_string_pretty(&outcome.report)?);
//! ```
//!
//! # Errors
//!
//! Every fallible operation returns [`OutlierError`]. Its
//! [`error_code`](OutlierError::error_code) is one of the registered codes
//! (`ICE001`, `DET004`, `HEX002`, ...) and its message follows the layout
//!
//! ```text
//! [IQRDetector] - DET004
//!
//! Zero inter-quartile range, IQR bounds cannot be computed.
//! Column: price
//!
//! Suggestion: ...
//! ```

pub mod accessor;
pub mod config;
pub mod detection;
pub mod error;
pub mod handling;
pub mod mask;
pub mod pipeline;
pub mod stats;
pub mod utils;
pub mod validation;

// Re-exports for convenient access
pub use accessor::{OutlierAccessor, OutlierFrameExt};
pub use config::{CleaningPlan, CleaningPlanBuilder, DetectorConfig, HandlerConfig};
pub use detection::{
    AnyDetector, DetectionMethod, Detector, IqrDetector, MadDetector, PercentileDetector,
    ScoreRecord, ScoreRule, ZScoreDetector,
};
pub use error::{
    ColumnIssues, ErrorCode, ErrorKind, OutlierError, Result as OutlierResult, ResultExt,
    describe_code,
};
pub use handling::{HandlingStrategy, InterpolationMethod, OutlierHandler, OutlierHandlerBuilder};
pub use mask::OutlierMask;
pub use pipeline::{CleaningOutcome, CleaningReport, ColumnOutliers, OutlierPipeline};
pub use validation::{ResolvedColumns, validate_columns};
