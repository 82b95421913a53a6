//! Error types for Vitrine.
//!
//! Library crates use [`VitrineError`] via `thiserror`.
//! The binary wraps this with `color-eyre` for rich diagnostics, and the HTTP
//! layer maps each variant onto a status code.

use std::path::PathBuf;

/// Top-level error type for all Vitrine operations.
#[derive(Debug, thiserror::Error)]
pub enum VitrineError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure talking to the CMS (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The CMS answered with a non-success status.
    #[error("upstream returned HTTP {status} for {url}")]
    Upstream { status: u16, url: String },

    /// Response body or document could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The requested entity does not exist.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// A resource with the same identity already exists.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (bad route parameter, malformed upload, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VitrineError>;

impl VitrineError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a not-found error naming the missing entity.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a conflict error from any displayable message.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict {
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

    /// Whether this error means "the thing is not there" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = VitrineError::config("missing CMS base URL");
        assert_eq!(err.to_string(), "config error: missing CMS base URL");

        let err = VitrineError::Upstream {
            status: 502,
            url: "https://cms.example.com/wp-json/wp/v2/posts".into(),
        };
        assert!(err.to_string().contains("HTTP 502"));

        let err = VitrineError::conflict("document already uploaded");
        assert!(err.to_string().starts_with("conflict:"));
    }

    #[test]
    fn not_found_is_classified() {
        assert!(VitrineError::not_found("post 'hello'").is_not_found());
        assert!(!VitrineError::Network("timeout".into()).is_not_found());
    }
}
