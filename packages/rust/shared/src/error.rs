//! Error types for babelwiki.
//!
//! Library crates use [`BabelWikiError`] via `thiserror`.
//! The server binary wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all babelwiki operations.
#[derive(Debug, thiserror::Error)]
pub enum BabelWikiError {
    /// Keyword is empty after normalization — a client input error.
    #[error("invalid keyword: {input:?} is empty after normalization")]
    InvalidKeyword { input: String },

    /// Generation capability error (HTTP failure, bad response, timeout).
    #[error("generation error: {0}")]
    Generation(String),

    /// Uniqueness violation on article insert — another pipeline won the
    /// race. Recovered internally by re-reading; never surfaced to callers.
    #[error("article already exists for keyword {keyword:?}")]
    DuplicateKeyword { keyword: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BabelWikiError>;

impl BabelWikiError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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
