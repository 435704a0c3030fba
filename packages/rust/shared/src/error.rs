//! Error types for crawlqa.
//!
//! Library crates use [`CrawlQaError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all crawlqa operations.
#[derive(Debug, thiserror::Error)]
pub enum CrawlQaError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while scraping or downloading model files.
    #[error("network error: {0}")]
    Network(String),

    /// HTML parsing or URL parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Model loading or forward-pass error.
    #[error("model error: {0}")]
    Model(String),

    /// Tokenizer loading, encoding, or decoding error.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Workflow graph construction or execution error.
    #[error("graph error: {message}")]
    Graph { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (empty question, bad flag value, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CrawlQaError>;

impl CrawlQaError {
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

    /// Create a graph error from any displayable message.
    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CrawlQaError::config("timeout_secs must be positive");
        assert_eq!(err.to_string(), "config error: timeout_secs must be positive");

        let err = CrawlQaError::graph("no entry point set");
        assert_eq!(err.to_string(), "graph error: no entry point set");

        let err = CrawlQaError::Model("shape mismatch".into());
        assert!(err.to_string().contains("shape mismatch"));
    }

    #[test]
    fn io_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = CrawlQaError::io("/tmp/crawlqa.toml", source);
        let msg = err.to_string();
        assert!(msg.contains("crawlqa.toml"));
        assert!(msg.contains("gone"));
    }
}
