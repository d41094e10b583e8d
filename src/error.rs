//! Error types for CloudGuard SDK operations.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring or using the CloudGuard SDK.
#[derive(Debug, Error)]
pub enum CloudGuardError {
    /// A configuration or credentials file could not be read.
    #[error("Could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file exists but is not valid INI text.
    #[error("Unable to parse configuration file: {}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: IniError,
    },

    /// A region name or code that is not in the registry.
    #[error("unknown region: {0}")]
    UnknownRegion(String),

    /// A configuration field received a value of the wrong type.
    #[error("expected {expected} for `{field}`, got: {found}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    /// A configuration field outside the recognized set.
    #[error("Config got an unexpected field '{0}'")]
    UnknownField(String),

    /// Mutually exclusive options were requested together.
    #[error("conflicting options: {0}")]
    ConflictingOptions(String),

    /// A session was entered twice, or in a context it cannot run in.
    #[error("invalid session use: {0}")]
    SessionMisuse(String),

    /// Configuration is missing or incomplete.
    #[error("CloudGuard configuration required: {0}")]
    ConfigMissing(String),

    /// API request failed.
    #[error("CloudGuard API error: {message}")]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

/// Syntax error found while reading INI text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniError {
    /// 1-based line number, when the error is tied to a line.
    pub line: Option<usize>,
    /// What was wrong.
    pub reason: String,
}

impl IniError {
    pub(crate) fn at(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for IniError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

impl std::error::Error for IniError {}

/// Result type alias for CloudGuard operations.
pub type Result<T> = core::result::Result<T, CloudGuardError>;
