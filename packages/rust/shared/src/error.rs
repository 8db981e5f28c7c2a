//! Error types for mdx-go.
//!
//! Library crates use [`MdxGoError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all mdx-go operations.
#[derive(Debug, thiserror::Error)]
pub enum MdxGoError {
    /// Configuration loading or resolution error. Fatal before dispatch.
    #[error("config error: {message}")]
    Config { message: String },

    /// Package manifest reading or parsing error.
    #[error("manifest error: {message}")]
    Manifest { message: String },

    /// Static export (build) failure.
    #[error("build error: {0}")]
    Build(String),

    /// Dev server failure (bind, serve, render).
    #[error("server error: {0}")]
    Server(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MdxGoError>;

impl MdxGoError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a manifest error from any displayable message.
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest {
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
        let err = MdxGoError::config("webpack config failed to load");
        assert_eq!(
            err.to_string(),
            "config error: webpack config failed to load"
        );

        let err = MdxGoError::Server("address already in use".into());
        assert!(err.to_string().contains("address already in use"));
    }
}
