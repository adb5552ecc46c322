//! Storage-specific error types for SQLite operations.
//!
//! Wraps Diesel and r2d2 errors and converts them to the database-agnostic
//! error types defined in `gapfill_core`. The conversion preserves the one
//! distinction the scheduler cares about: connection and pool failures map
//! onto the session-fatal `DatabaseError` variants, everything else onto
//! row-level ones.

use diesel::result::Error as DieselError;
use gapfill_core::errors::{DatabaseError, Error};
use thiserror::Error;

/// Storage-layer errors, internal to this crate.
///
/// Converted to `gapfill_core::Error` before being returned to callers.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::PoolError(e) => {
                Error::Database(DatabaseError::PoolCreationFailed(e.to_string()))
            }
            StorageError::QueryFailed(DieselError::NotFound) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::QueryFailed(DieselError::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            )) => Error::Database(DatabaseError::UniqueViolation(info.message().to_string())),
            StorageError::QueryFailed(DieselError::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                info,
            )) => Error::Database(DatabaseError::ForeignKeyViolation(
                info.message().to_string(),
            )),
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::MigrationFailed(e) => Error::Database(DatabaseError::MigrationFailed(e)),
        }
    }
}

/// Extension trait for converting Diesel and pool `Result`s to core
/// `Result`s.
///
/// Orphan rules forbid `From<DieselError> for Error` here, so repositories
/// call `.into_core()` at each query boundary instead.
pub trait IntoCore<T> {
    fn into_core(self) -> gapfill_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> gapfill_core::Result<T> {
        self.map_err(|e| StorageError::QueryFailed(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, r2d2::Error> {
    fn into_core(self) -> gapfill_core::Result<T> {
        self.map_err(|e| StorageError::PoolError(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_failures_map_to_store_unreachable() {
        // A pool timeout is the storage-level face of "store unreachable".
        let err: Error = StorageError::MigrationFailed("locked".to_string()).into();
        assert!(!err.is_store_unreachable());

        let err: Error = StorageError::QueryFailed(DieselError::NotFound).into();
        assert!(!err.is_store_unreachable());
        assert!(matches!(
            err,
            Error::Database(DatabaseError::NotFound(_))
        ));
    }

    #[test]
    fn test_query_failure_stays_row_level() {
        let err: Error =
            StorageError::QueryFailed(DieselError::RollbackTransaction).into();
        assert!(matches!(err, Error::Database(DatabaseError::QueryFailed(_))));
        assert!(!err.is_store_unreachable());
    }
}
