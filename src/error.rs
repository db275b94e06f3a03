//! Centralized error handling for nutriscope.
//!
//! Every fallible library operation returns [`Result<T>`], whose error side is
//! [`NutriError`]. The statistics engine reports its failures through the
//! dedicated variants so callers can branch on them:
//!
//! ```
//! use nutriscope::error::NutriError;
//!
//! fn describe(err: &NutriError) -> &'static str {
//!     match err {
//!         NutriError::InsufficientCategories { .. } => "skip the comparison",
//!         NutriError::UnknownColumn { .. } | NutriError::UnsupportedOperator(_) => "re-prompt",
//!         _ => "abort",
//!     }
//! }
//! ```
//!
//! ## Context Extension Trait
//!
//! The [`ResultExt`] trait adds `.context()` to any `Result` whose error
//! converts into [`NutriError`]:
//!
//! ```no_run
//! use nutriscope::error::ResultExt as _;
//!
//! fn read_menu() -> nutriscope::error::Result<String> {
//!     std::fs::read_to_string("menu.csv").context("Failed to read menu")
//! }
//! ```

use std::fmt;

/// Main error type for nutriscope operations.
#[derive(Debug)]
pub enum NutriError {
    /// A comparison was requested with fewer than two registered categories.
    InsufficientCategories { found: usize },

    /// A filter or statistic referenced a column the table does not have.
    UnknownColumn { category: String, column: String },

    /// A filter operator outside `>`, `<`, `==`, `between`.
    UnsupportedOperator(String),

    /// A query named a category that was never registered.
    UnknownCategory(String),

    /// The operand does not fit the operator (e.g. a range for `>`).
    InvalidOperand { operator: String, reason: String },

    /// A filter expression that could not be parsed.
    InvalidExpression(String),

    /// I/O errors (file operations)
    Io(std::io::Error),

    /// Data processing errors (Polars, CSV parsing, decoding)
    DataProcessing(String),

    /// Configuration errors
    Config(String),

    /// Conversational assistant errors (API, empty responses)
    Assistant(String),

    /// File not found or invalid path
    InvalidPath(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for NutriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientCategories { found } => write!(
                f,
                "Need at least 2 datasets to compare, but only {found} registered"
            ),
            Self::UnknownColumn { category, column } => {
                write!(f, "Column '{column}' not found in '{category}' dataset")
            }
            Self::UnsupportedOperator(op) => write!(
                f,
                "Operator '{op}' not recognized (expected >, <, == or between)"
            ),
            Self::UnknownCategory(name) => write!(f, "'{name}' not found in datasets"),
            Self::InvalidOperand { operator, reason } => {
                write!(f, "Invalid operand for '{operator}': {reason}")
            }
            Self::InvalidExpression(msg) => write!(f, "Invalid filter expression: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Assistant(msg) => write!(f, "Assistant error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for NutriError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NutriError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for NutriError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for NutriError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for NutriError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

/// Result type alias for nutriscope operations.
pub type Result<T> = std::result::Result<T, NutriError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<NutriError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: NutriError = e.into();
            NutriError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: NutriError = e.into();
            NutriError::Other(format!("{}: {}", f(), err))
        })
    }
}
