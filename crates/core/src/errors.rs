//! Core error types for the gapfill crawler.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;
use uuid::Uuid;

pub use gapfill_market_data::ProviderError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the crawler.
///
/// Database-specific errors are wrapped in string form to keep this type
/// database-agnostic.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Provider operation failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Backfill operation failed: {0}")]
    Backfill(#[from] BackfillError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// True when the store itself is unreachable, as opposed to a single
    /// query or row failing.
    ///
    /// The scheduler aborts the whole session on an unreachable store;
    /// any other error fails only the current work unit.
    pub fn is_store_unreachable(&self) -> bool {
        matches!(
            self,
            Error::Database(DatabaseError::ConnectionFailed(_))
                | Error::Database(DatabaseError::PoolCreationFailed(_))
        )
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint was violated.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Errors raised by the backfill control surface.
#[derive(Error, Debug)]
pub enum BackfillError {
    /// `start` was called while a session is still active.
    #[error("A backfill session is already running: {session_id}")]
    AlreadyRunning { session_id: Uuid },

    /// The session configuration is unusable (bad caps, zero workers, ...).
    #[error("Invalid backfill configuration: {0}")]
    InvalidConfiguration(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_unreachable_classification() {
        let fatal = Error::Database(DatabaseError::ConnectionFailed("refused".to_string()));
        assert!(fatal.is_store_unreachable());

        let fatal = Error::Database(DatabaseError::PoolCreationFailed("timeout".to_string()));
        assert!(fatal.is_store_unreachable());

        let row_level = Error::Database(DatabaseError::QueryFailed("syntax".to_string()));
        assert!(!row_level.is_store_unreachable());

        let not_db = Error::Unexpected("boom".to_string());
        assert!(!not_db.is_store_unreachable());
    }

    #[test]
    fn test_already_running_display_carries_session_id() {
        let id = Uuid::nil();
        let err = Error::Backfill(BackfillError::AlreadyRunning { session_id: id });
        assert!(err.to_string().contains(&id.to_string()));
    }
}
