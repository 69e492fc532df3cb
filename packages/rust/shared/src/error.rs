//! Error types for msgview.
//!
//! Library crates use [`MsgviewError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all msgview operations.
#[derive(Debug, thiserror::Error)]
pub enum MsgviewError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid file-name glob pattern.
    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Dataset could not be serialized to JSON.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Data validation error (bad file name, malformed input, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MsgviewError>;

impl MsgviewError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a pattern error for the given glob.
    pub fn pattern(pattern: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
