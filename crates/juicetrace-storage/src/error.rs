//! Mapping from `sqlx` errors to [`StoreError`].

use juicetrace_core::StoreError;

/// Classify a driver error.
///
/// The full driver message is preserved for logs; only the variant decides
/// whether a retry is worthwhile.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => StoreError::timeout("timed out acquiring a connection"),
        sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
            StoreError::unavailable(err.to_string())
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Configuration(_) => {
            StoreError::connection(err.to_string())
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::decode(err.to_string()),
        other => StoreError::query(other.to_string()),
    }
}
