//! Error taxonomy for outlier detection and handling.
//!
//! Every failure carries a stable error code (`ICE005`, `DET003`, `CON002`,
//! `HEX001`, ...), the name of the component that raised it, a suggestion and
//! strongly typed context. Message headlines live in a static table on
//! [`ErrorCode`], so there is no registration step and no global state.
//!
//! Errors are serializable, which lets callers forward them as
//! `{ code, component, message }` objects.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::fmt;
use thiserror::Error;

/// Code reported for anything that is not in the static table.
pub const UNKNOWN_CODE: &str = "OE000";

const UNKNOWN_HEADLINE: &str = "Unknown outlier-kit error";

/// Broad family an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad thresholds, limits or option values, raised before any data is read.
    Configuration,
    /// Structural or content problems with the column selection.
    InvalidColumns,
    /// Numeric degeneracy while computing scores.
    Detection,
    /// Reserved for covariance-based detection.
    Multivariate,
    /// Strategy, parameter or mask problems while handling outliers.
    Handling,
    /// An input had the wrong shape or dtype to be interpreted.
    TypeMismatch,
}

/// Closed set of error codes with their message headlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ice000,
    Ice001,
    Ice002,
    Ice003,
    Ice004,
    Ice005,
    Ice006,
    Ice007,
    Det001,
    Det002,
    Det003,
    Det004,
    Det005,
    Det006,
    Det007,
    Det008,
    Det009,
    Mvt001,
    Mvt002,
    Mvt003,
    Mvt004,
    Mvt005,
    Con001,
    Con002,
    Con003,
    Hex000,
    Hex001,
    Hex002,
    Hex003,
    Hex004,
    Typ001,
}

impl ErrorCode {
    /// Every registered code, in table order.
    pub const ALL: [ErrorCode; 31] = [
        Self::Ice000,
        Self::Ice001,
        Self::Ice002,
        Self::Ice003,
        Self::Ice004,
        Self::Ice005,
        Self::Ice006,
        Self::Ice007,
        Self::Det001,
        Self::Det002,
        Self::Det003,
        Self::Det004,
        Self::Det005,
        Self::Det006,
        Self::Det007,
        Self::Det008,
        Self::Det009,
        Self::Mvt001,
        Self::Mvt002,
        Self::Mvt003,
        Self::Mvt004,
        Self::Mvt005,
        Self::Con001,
        Self::Con002,
        Self::Con003,
        Self::Hex000,
        Self::Hex001,
        Self::Hex002,
        Self::Hex003,
        Self::Hex004,
        Self::Typ001,
    ];

    /// The stable string identifier, e.g. `"ICE005"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ice000 => "ICE000",
            Self::Ice001 => "ICE001",
            Self::Ice002 => "ICE002",
            Self::Ice003 => "ICE003",
            Self::Ice004 => "ICE004",
            Self::Ice005 => "ICE005",
            Self::Ice006 => "ICE006",
            Self::Ice007 => "ICE007",
            Self::Det001 => "DET001",
            Self::Det002 => "DET002",
            Self::Det003 => "DET003",
            Self::Det004 => "DET004",
            Self::Det005 => "DET005",
            Self::Det006 => "DET006",
            Self::Det007 => "DET007",
            Self::Det008 => "DET008",
            Self::Det009 => "DET009",
            Self::Mvt001 => "MVT001",
            Self::Mvt002 => "MVT002",
            Self::Mvt003 => "MVT003",
            Self::Mvt004 => "MVT004",
            Self::Mvt005 => "MVT005",
            Self::Con001 => "CON001",
            Self::Con002 => "CON002",
            Self::Con003 => "CON003",
            Self::Hex000 => "HEX000",
            Self::Hex001 => "HEX001",
            Self::Hex002 => "HEX002",
            Self::Hex003 => "HEX003",
            Self::Hex004 => "HEX004",
            Self::Typ001 => "TYP001",
        }
    }

    /// One-line description used as the message headline.
    pub fn headline(self) -> &'static str {
        match self {
            Self::Ice000 => "Empty list of columns.",
            Self::Ice001 => "The following columns are missing.",
            Self::Ice002 => "No numeric columns found for detection.",
            Self::Ice003 => "The following columns are invalid or non-numeric.",
            Self::Ice004 => "The following columns are invalid and missing.",
            Self::Ice005 => "The following columns are duplicated.",
            Self::Ice006 => "The following columns contain null, NaN or infinite values.",
            Self::Ice007 => "The table is empty.",
            Self::Det001 => "No data left after preprocessing.",
            Self::Det002 => "No numeric data available for computation.",
            Self::Det003 => "Zero variance.",
            Self::Det004 => "Zero inter-quartile range, IQR bounds cannot be computed.",
            Self::Det005 => "Zero median absolute deviation, modified z-score fails.",
            Self::Det006 => "Score computation produced a non-finite value.",
            Self::Det007 => "Detection flagged zero rows unexpectedly.",
            Self::Det008 => "Detection flagged all rows.",
            Self::Det009 => "Custom detector returned the wrong shape or dtype.",
            Self::Mvt001 => "Singular covariance matrix, cannot invert.",
            Self::Mvt002 => "Too few samples for a multivariate method.",
            Self::Mvt003 => "Non-positive-definite covariance matrix.",
            Self::Mvt004 => "Mahalanobis distance computation failed.",
            Self::Mvt005 => "Corrupted or ill-conditioned matrix.",
            Self::Con001 => "Invalid parameter value.",
            Self::Con002 => "Parameter out of range.",
            Self::Con003 => "Unsupported option.",
            Self::Hex000 => "Unknown handling strategy.",
            Self::Hex001 => "Missing required parameter.",
            Self::Hex002 => "Index mismatch between table and outlier mask.",
            Self::Hex003 => "Winsorization bounds are identical or reversed.",
            Self::Hex004 => "No non-outlier values left to compute a replacement from.",
            Self::Typ001 => "Input has the wrong type.",
        }
    }

    /// Suggestion used when the raising site does not provide its own.
    pub fn default_suggestion(self) -> &'static str {
        match self {
            Self::Ice000 => "You provided an empty list of columns. Please specify columns.",
            Self::Ice001 => "Add the missing columns or fix their names.",
            Self::Ice002 => "Ensure the table has numeric columns.",
            Self::Ice003 => "Remove invalid columns from the selection.",
            Self::Ice004 => "Check column names and dtypes.",
            Self::Ice005 => "Remove duplicate column names from the selection.",
            Self::Ice006 => "Remove or impute null, NaN and infinite values first.",
            Self::Ice007 => "Please provide a non-empty table.",
            Self::Det003 | Self::Det004 | Self::Det005 => {
                "Remove constant/uninformative features or verify data preprocessing."
            }
            Self::Det006 => "Rescale the column; its values overflow floating point arithmetic.",
            Self::Con001 | Self::Con002 | Self::Con003 => "Please check your configuration.",
            Self::Hex000 => "Use one of the allowed strategies.",
            Self::Hex001 => "Provide the parameter required by the chosen strategy.",
            Self::Hex002 => "Build the mask from the same table you are cleaning.",
            Self::Hex003 => "The column may be constant; exclude it from winsorization.",
            Self::Hex004 => "Every value is flagged; loosen the detector threshold.",
            Self::Typ001 => "Pass a value of the expected type.",
            _ => "Please check your table.",
        }
    }

    pub fn kind(self) -> ErrorKind {
        match self {
            Self::Ice000
            | Self::Ice001
            | Self::Ice002
            | Self::Ice003
            | Self::Ice004
            | Self::Ice005
            | Self::Ice006
            | Self::Ice007 => ErrorKind::InvalidColumns,
            Self::Det001
            | Self::Det002
            | Self::Det003
            | Self::Det004
            | Self::Det005
            | Self::Det006
            | Self::Det007
            | Self::Det008
            | Self::Det009 => ErrorKind::Detection,
            Self::Mvt001 | Self::Mvt002 | Self::Mvt003 | Self::Mvt004 | Self::Mvt005 => {
                ErrorKind::Multivariate
            }
            Self::Con001 | Self::Con002 | Self::Con003 => ErrorKind::Configuration,
            Self::Hex000 | Self::Hex001 | Self::Hex002 | Self::Hex003 | Self::Hex004 => {
                ErrorKind::Handling
            }
            Self::Typ001 => ErrorKind::TypeMismatch,
        }
    }

    /// Look a code up by its string identifier.
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Headline for an arbitrary code string, falling back to a generic message.
pub fn describe_code(code: &str) -> &'static str {
    ErrorCode::parse(code)
        .map(ErrorCode::headline)
        .unwrap_or(UNKNOWN_HEADLINE)
}

/// Accumulated column-level problems, reported together in one error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnIssues {
    pub missing: Vec<String>,
    pub invalid: Vec<String>,
    pub nan_cols: Vec<String>,
    pub duplicated: Vec<String>,
}

impl ColumnIssues {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
            && self.invalid.is_empty()
            && self.nan_cols.is_empty()
            && self.duplicated.is_empty()
    }

    /// Pick the most specific code for the accumulated problems.
    pub fn code(&self) -> ErrorCode {
        if !self.duplicated.is_empty() {
            ErrorCode::Ice005
        } else if !self.invalid.is_empty() && !self.missing.is_empty() {
            ErrorCode::Ice004
        } else if !self.invalid.is_empty() {
            ErrorCode::Ice003
        } else if !self.nan_cols.is_empty() {
            ErrorCode::Ice006
        } else {
            ErrorCode::Ice001
        }
    }
}

impl fmt::Display for ColumnIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = [
            ("Duplicated", &self.duplicated),
            ("Missing", &self.missing),
            ("Invalid", &self.invalid),
            ("NaN/inf", &self.nan_cols),
        ];
        for (label, names) in groups {
            if !names.is_empty() {
                write!(f, "\n{}: {}", label, names.join(", "))?;
            }
        }
        Ok(())
    }
}

/// The main error type for outlier detection and handling.
#[derive(Error, Debug)]
pub enum OutlierError {
    /// Invalid configuration, raised before any data is touched.
    #[error(
        "[{component}] - {code}\n\n{headline}\n{parameter}: {detail}\n\nSuggestion: {suggestion}",
        headline = .code.headline()
    )]
    Configuration {
        code: ErrorCode,
        component: String,
        parameter: String,
        detail: String,
        suggestion: String,
    },

    /// Problems with the column selection.
    #[error(
        "[{component}] - {code}\n\n{headline}{issues}\n\nSuggestion: {suggestion}",
        headline = .code.headline()
    )]
    InvalidColumns {
        code: ErrorCode,
        component: String,
        issues: ColumnIssues,
        suggestion: String,
    },

    /// Numeric degeneracy while computing per-column scores.
    #[error(
        "[{component}] - {code}\n\n{headline}\nColumn: {column}\n\nSuggestion: {suggestion}",
        headline = .code.headline()
    )]
    Detection {
        code: ErrorCode,
        component: String,
        column: String,
        suggestion: String,
    },

    /// Strategy, parameter or mask problems while handling outliers.
    #[error(
        "[{component}] - {code}\n\n{headline}\n{detail}\n\nSuggestion: {suggestion}",
        headline = .code.headline()
    )]
    Handling {
        code: ErrorCode,
        component: String,
        detail: String,
        suggestion: String,
    },

    /// An input could not be interpreted as the expected type.
    #[error("[{component}] - TYP001\n\nExpected {expected}, got {found}\n\nSuggestion: {suggestion}")]
    TypeMismatch {
        component: String,
        expected: String,
        found: String,
        suggestion: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<OutlierError>,
    },
}

impl OutlierError {
    pub fn configuration(
        code: ErrorCode,
        component: impl Into<String>,
        parameter: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            code,
            component: component.into(),
            parameter: parameter.into(),
            detail: detail.into(),
            suggestion: code.default_suggestion().to_string(),
        }
    }

    pub fn invalid_columns(code: ErrorCode, component: impl Into<String>, issues: ColumnIssues) -> Self {
        Self::InvalidColumns {
            code,
            component: component.into(),
            issues,
            suggestion: code.default_suggestion().to_string(),
        }
    }

    pub fn detection(code: ErrorCode, component: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Detection {
            code,
            component: component.into(),
            column: column.into(),
            suggestion: code.default_suggestion().to_string(),
        }
    }

    pub fn handling(code: ErrorCode, component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Handling {
            code,
            component: component.into(),
            detail: detail.into(),
            suggestion: code.default_suggestion().to_string(),
        }
    }

    pub fn type_mismatch(
        component: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            component: component.into(),
            expected: expected.into(),
            found: found.into(),
            suggestion: ErrorCode::Typ001.default_suggestion().to_string(),
        }
    }

    /// Replace the default suggestion.
    pub fn with_suggestion(self, text: impl Into<String>) -> Self {
        match self {
            Self::WithContext { context, source } => Self::WithContext {
                context,
                source: Box::new(source.with_suggestion(text)),
            },
            mut other => {
                match &mut other {
                    Self::Configuration { suggestion, .. }
                    | Self::InvalidColumns { suggestion, .. }
                    | Self::Detection { suggestion, .. }
                    | Self::Handling { suggestion, .. }
                    | Self::TypeMismatch { suggestion, .. } => *suggestion = text.into(),
                    _ => {}
                }
                other
            }
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        OutlierError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Structured code, when the error comes from the taxonomy.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Configuration { code, .. }
            | Self::InvalidColumns { code, .. }
            | Self::Detection { code, .. }
            | Self::Handling { code, .. } => Some(*code),
            Self::TypeMismatch { .. } => Some(ErrorCode::Typ001),
            Self::WithContext { source, .. } => source.code(),
            Self::Io(_) | Self::Polars(_) | Self::Json(_) => None,
        }
    }

    /// Get the error code string for callers that match on it.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
            other => other.code().map(ErrorCode::as_str).unwrap_or(UNKNOWN_CODE),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.code().map(ErrorCode::kind)
    }

    /// Name of the detector or handler that raised the error.
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::Configuration { component, .. }
            | Self::InvalidColumns { component, .. }
            | Self::Detection { component, .. }
            | Self::Handling { component, .. }
            | Self::TypeMismatch { component, .. } => Some(component),
            Self::WithContext { source, .. } => source.component(),
            Self::Io(_) | Self::Polars(_) | Self::Json(_) => None,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Configuration { suggestion, .. }
            | Self::InvalidColumns { suggestion, .. }
            | Self::Detection { suggestion, .. }
            | Self::Handling { suggestion, .. }
            | Self::TypeMismatch { suggestion, .. } => Some(suggestion),
            Self::WithContext { source, .. } => source.suggestion(),
            Self::Io(_) | Self::Polars(_) | Self::Json(_) => None,
        }
    }

    /// Column issues carried by an `InvalidColumns` error.
    pub fn column_issues(&self) -> Option<&ColumnIssues> {
        match self {
            Self::InvalidColumns { issues, .. } => Some(issues),
            Self::WithContext { source, .. } => source.column_issues(),
            _ => None,
        }
    }
}

impl Serialize for OutlierError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("OutlierError", 3)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("component", &self.component())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for outlier operations.
pub type Result<T> = std::result::Result<T, OutlierError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| OutlierError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_parse() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::parse(code.as_str()), Some(code));
        }
    }

    #[test]
    fn test_codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in ErrorCode::ALL {
            assert!(seen.insert(code.as_str()), "duplicate code {}", code);
        }
    }

    #[test]
    fn test_unknown_code_falls_back() {
        assert_eq!(ErrorCode::parse("XYZ999"), None);
        assert_eq!(describe_code("XYZ999"), "Unknown outlier-kit error");
        assert_eq!(describe_code("DET004"), ErrorCode::Det004.headline());
    }

    #[test]
    fn test_kind_prefixes() {
        assert_eq!(ErrorCode::Ice005.kind(), ErrorKind::InvalidColumns);
        assert_eq!(ErrorCode::Det003.kind(), ErrorKind::Detection);
        assert_eq!(ErrorCode::Con002.kind(), ErrorKind::Configuration);
        assert_eq!(ErrorCode::Hex001.kind(), ErrorKind::Handling);
        assert_eq!(ErrorCode::Mvt001.kind(), ErrorKind::Multivariate);
        assert_eq!(ErrorCode::Typ001.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_issue_code_priority() {
        let mut issues = ColumnIssues {
            missing: vec!["a".to_string()],
            ..Default::default()
        };
        assert_eq!(issues.code(), ErrorCode::Ice001);

        issues.nan_cols.push("b".to_string());
        assert_eq!(issues.code(), ErrorCode::Ice006);

        issues.invalid.push("c".to_string());
        assert_eq!(issues.code(), ErrorCode::Ice004);

        issues.duplicated.push("d".to_string());
        assert_eq!(issues.code(), ErrorCode::Ice005);
    }

    #[test]
    fn test_invalid_columns_message_lists_every_group() {
        let issues = ColumnIssues {
            missing: vec!["height".to_string()],
            invalid: vec!["name".to_string()],
            nan_cols: vec!["weight".to_string()],
            duplicated: vec![],
        };
        let error = OutlierError::invalid_columns(issues.code(), "IQRDetector", issues);
        let message = error.to_string();

        assert!(message.starts_with("[IQRDetector] - ICE004"));
        assert!(message.contains("Missing: height"));
        assert!(message.contains("Invalid: name"));
        assert!(message.contains("NaN/inf: weight"));
        assert!(message.contains("Suggestion:"));
    }

    #[test]
    fn test_detection_message() {
        let error = OutlierError::detection(ErrorCode::Det004, "IQRDetector", "age");
        let message = error.to_string();
        assert!(message.contains("DET004"));
        assert!(message.contains("Column: age"));
        assert_eq!(error.error_code(), "DET004");
        assert_eq!(error.component(), Some("IQRDetector"));
        assert_eq!(error.kind(), Some(ErrorKind::Detection));
    }

    #[test]
    fn test_with_suggestion_overrides_default() {
        let error = OutlierError::handling(ErrorCode::Hex001, "OutlierHandler", "group_col")
            .with_suggestion("Pass group_col");
        assert_eq!(error.suggestion(), Some("Pass group_col"));
    }

    #[test]
    fn test_with_context_preserves_code() {
        let error = OutlierError::detection(ErrorCode::Det003, "ZScoreDetector", "x")
            .with_context("While cleaning");
        assert!(error.to_string().contains("While cleaning"));
        assert_eq!(error.error_code(), "DET003");
        assert_eq!(error.component(), Some("ZScoreDetector"));
    }

    #[test]
    fn test_error_serialization() {
        let error = OutlierError::type_mismatch("OutlierMask", "Boolean", "Float64");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("TYP001"));
        assert!(json.contains("OutlierMask"));
        assert!(json.contains("Float64"));
    }
}
