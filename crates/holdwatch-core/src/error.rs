//! Error types for the holdwatch system
//!
//! Every failure a monitor cycle can hit maps onto one of four operational
//! kinds: the snapshot source failed, the snapshot it returned is invalid,
//! the snapshot store failed, or the notifier failed. The remaining variants
//! cover configuration and plumbing errors raised outside the cycle.

use std::fmt;
use thiserror::Error;

/// Result type alias for holdwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a snapshot source failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceErrorKind {
    /// The source could not be reached (connect error, timeout, 5xx)
    Unreachable,
    /// The source answered with data that could not be parsed
    MalformedData,
    /// The source refused the request because of rate limiting
    RateLimited,
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceErrorKind::Unreachable => "unreachable",
            SourceErrorKind::MalformedData => "malformed data",
            SourceErrorKind::RateLimited => "rate limited",
        };
        f.write_str(name)
    }
}

/// Core error type for the holdwatch system
#[derive(Error, Debug)]
pub enum Error {
    /// Snapshot source errors
    #[error("Snapshot source error ({kind}): {message}")]
    Source {
        /// Failure category
        kind: SourceErrorKind,
        /// Human-readable detail
        message: String,
    },

    /// A fetched snapshot failed dense-rank or uniqueness validation
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Snapshot store errors
    #[error("Snapshot store error: {0}")]
    Storage(String),

    /// Notification delivery errors
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "unreachable" source error
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Source {
            kind: SourceErrorKind::Unreachable,
            message: msg.into(),
        }
    }

    /// Create a "malformed data" source error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Source {
            kind: SourceErrorKind::MalformedData,
            message: msg.into(),
        }
    }

    /// Create a "rate limited" source error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::Source {
            kind: SourceErrorKind::RateLimited,
            message: msg.into(),
        }
    }

    /// Create an invalid snapshot error
    pub fn invalid_snapshot(msg: impl Into<String>) -> Self {
        Self::InvalidSnapshot(msg.into())
    }

    /// Create a snapshot store error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a delivery error
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The source error kind, if this is a source error
    pub fn source_kind(&self) -> Option<SourceErrorKind> {
        match self {
            Error::Source { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
