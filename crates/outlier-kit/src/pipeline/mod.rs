//! Pipeline module.
//!
//! Runs a [`CleaningPlan`](crate::config::CleaningPlan) end to end: detect,
//! handle, and summarize what changed.

mod executor;
mod report;

pub use executor::OutlierPipeline;
pub use report::{CleaningOutcome, CleaningReport, ColumnOutliers};
