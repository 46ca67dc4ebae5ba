//! Error types for Juice Trace operations.
//!
//! Three layers of errors live here:
//!
//! - [`StoreError`]: failures reported by a persistence collaborator
//! - [`TraceError`]: the outcome taxonomy of a trace request
//! - [`Error`]: the operational error used by server and CLI wiring
//!
//! The parser and shelf-life resolver have their own error types
//! ([`ParseError`](crate::code::ParseError),
//! [`ResolveError`](crate::shelf_life::ResolveError)) which convert into
//! [`TraceError`].

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::code::ParseError;
use crate::shelf_life::ResolveError;

// ============================================================================
// StoreError
// ============================================================================

/// Failures reported by a product catalog or provenance source.
///
/// The message carries the raw driver detail. It is meant for logs and is
/// never sent to HTTP clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The query was rejected or failed while executing.
    #[error("query error: {0}")]
    Query(String),

    /// Waiting for a connection or a result took too long.
    #[error("timed out: {0}")]
    Timeout(String),

    /// A row could not be decoded into a domain value.
    #[error("decode error: {0}")]
    Decode(String),

    /// The store was shut down or otherwise refused service.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Connection, timeout and availability problems are transient; query
    /// and decode errors will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::Unavailable(_)
        )
    }
}

/// Result type alias for collaborator calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ============================================================================
// TraceError
// ============================================================================

/// Why a trace request did not produce a provenance list.
///
/// An empty provenance list is not an error: a known product with no
/// matching batch is reported as `Ok(vec![])`.
#[derive(Error, Debug)]
pub enum TraceError {
    /// The request was malformed: missing product or code, or a code that
    /// does not parse. The detail is safe to show to the caller.
    #[error("{0}")]
    InvalidInput(String),

    /// No product with this exact name exists.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A collaborator failed. The source is kept for logging only.
    #[error("Trace query failed")]
    QueryFailed(#[source] StoreError),
}

impl TraceError {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the caller can fix the request and try again.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::QueryFailed(_))
    }

    /// The HTTP status code this outcome maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::ProductNotFound(_) => 404,
            Self::QueryFailed(_) => 500,
        }
    }
}

impl From<ParseError> for TraceError {
    fn from(err: ParseError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<ResolveError> for TraceError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::ProductNotFound(name) => Self::ProductNotFound(name),
            ResolveError::DateOutOfRange { .. } => Self::InvalidInput(err.to_string()),
            ResolveError::Store(source) => Self::QueryFailed(source),
        }
    }
}

impl From<StoreError> for TraceError {
    fn from(err: StoreError) -> Self {
        Self::QueryFailed(err)
    }
}

// ============================================================================
// Error
// ============================================================================

/// Operational errors raised while configuring, starting or driving the
/// service.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error on a specific path.
    #[error("I/O error on {path}: {source}")]
    IoWithPath {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Persistence collaborator error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Trace request failed.
    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Wrap an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Result type alias using Juice Trace's operational Error type.
pub type Result<T> = std::result::Result<T, Error>;
