//! Error and warning types for IBIS parsing.
//!
//! Only I/O and configuration problems are errors. Everything that can go
//! wrong inside a file is a [`ParseWarning`]: the offending row or section is
//! skipped and parsing carries on.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a parse.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The file could not be opened or read.
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parser options could not be loaded.
    #[error("Invalid parser configuration in {path:?}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// Invalid value for a field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Nom parsing error (internal).
    #[error("Parse error: {0}")]
    Nom(String),
}

impl ParseError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_config(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::InvalidConfig {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Convert nom errors to our error type.
impl<'a> From<nom::Err<nom::error::Error<&'a str>>> for ParseError {
    fn from(err: nom::Err<nom::error::Error<&'a str>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => ParseError::Nom("Incomplete input".to_string()),
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                let preview: String = e.input.chars().take(20).collect();
                ParseError::Nom(format!("{:?} at '{}'", e.code, preview))
            }
        }
    }
}

/// Result type for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors raised when querying an I-V curve.
#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    /// Curve has too few points for the requested operation.
    #[error("Insufficient data: need at least {needed} point(s), got {got}")]
    InsufficientData { needed: usize, got: usize },
}

/// Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Non-fatal problems found while parsing. Line numbers are 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseWarning {
    /// Malformed numeric token or unparseable row; the row was skipped.
    Syntax { line: usize, message: String },

    /// Known keyword this parser does not model; the whole section was skipped.
    UnsupportedSection { line: usize, keyword: String },

    /// `[Model]` header without a usable name; the model was dropped.
    DroppedModel { line: usize },

    /// A second `[Model]` with a name already seen.
    DuplicateModel { line: usize, name: String },
}

impl ParseWarning {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Source line the warning refers to.
    pub fn line(&self) -> usize {
        match self {
            Self::Syntax { line, .. }
            | Self::UnsupportedSection { line, .. }
            | Self::DroppedModel { line }
            | Self::DuplicateModel { line, .. } => *line,
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { line, message } => {
                write!(f, "line {}: syntax warning: {}", line, message)
            }
            Self::UnsupportedSection { line, keyword } => {
                write!(f, "line {}: unsupported section [{}] skipped", line, keyword)
            }
            Self::DroppedModel { line } => {
                write!(f, "line {}: [Model] without a name, model dropped", line)
            }
            Self::DuplicateModel { line, name } => {
                write!(f, "line {}: duplicate model '{}'", line, name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display_includes_line() {
        let w = ParseWarning::UnsupportedSection {
            line: 42,
            keyword: "Rising Waveform".to_string(),
        };
        assert_eq!(w.line(), 42);
        assert_eq!(
            w.to_string(),
            "line 42: unsupported section [Rising Waveform] skipped"
        );
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = ParseError::io(
            "missing.ibs",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("missing.ibs"));
    }
}
