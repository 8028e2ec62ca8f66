//! Error types for treescribe.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Rejected configuration values, reported before any traversal starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max depth must not be negative (got {0})")]
    NegativeDepth(i64),

    #[error("compression threshold must be at least 1 (got {0})")]
    InvalidThreshold(i64),
}

/// Top-level error type for a generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("path not found: {0}")]
    RootNotFound(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),

    #[error("worker failed: {0}")]
    Worker(String),

    /// A sink received stream events out of order.
    #[error("unexpected stream event: {0}")]
    EventOrder(String),
}

impl GenerateError {
    /// Whether this is the cooperative cancellation signal rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The path this error occurred at, if applicable.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::RootNotFound(p) | Self::NotADirectory(p) | Self::Io { path: p, .. } => Some(p),
            _ => None,
        }
    }
}

/// Map an error to the CLI exit code.
pub fn exit_code(error: &GenerateError) -> i32 {
    match error {
        GenerateError::Cancelled => 130,
        GenerateError::Config(_) => 2,
        GenerateError::RootNotFound(_) | GenerateError::NotADirectory(_) => 3,
        GenerateError::Io { .. }
        | GenerateError::Json(_)
        | GenerateError::Write(_)
        | GenerateError::Worker(_)
        | GenerateError::EventOrder(_) => 1,
    }
}
