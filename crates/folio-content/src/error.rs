//! Error types for content rendering.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, ContentError>;

/// A 1-based line/column position in the source markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Severity of a schema violation.
///
/// Only [`ErrorLevel::Critical`] aborts a render; lower levels are reported
/// and the offending attribute or children are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    Warning,
    Error,
    Critical,
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        })
    }
}

/// A tag that does not satisfy its declared schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Tag name as written in the source.
    pub tag: String,
    /// Offending attribute, if the issue concerns one.
    pub attribute: Option<String>,
    pub level: ErrorLevel,
    pub message: String,
    pub location: Location,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attr) => write!(
                f,
                "{} at {}: tag `{}` attribute `{}`: {}",
                self.level, self.location, self.tag, attr, self.message
            ),
            None => write!(
                f,
                "{} at {}: tag `{}`: {}",
                self.level, self.location, self.tag, self.message
            ),
        }
    }
}

/// Errors that abort a render.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    /// The markup is malformed (unbalanced tags, bad attribute syntax).
    #[error("parse error at {location}: {message}")]
    Parse { location: Location, message: String },

    /// A tag violates its schema at critical level.
    #[error("schema validation failed: {0}")]
    SchemaValidation(ValidationIssue),
}

impl ContentError {
    pub(crate) fn parse(location: Location, message: impl Into<String>) -> Self {
        Self::Parse {
            location,
            message: message.into(),
        }
    }

    /// Source position the error points at.
    pub fn location(&self) -> Location {
        match self {
            Self::Parse { location, .. } => *location,
            Self::SchemaValidation(issue) => issue.location,
        }
    }
}
