//! Error types and error handling for the service layer
//!
//! Data-access failures are carried through `AppError::DataAccess` unchanged,
//! so callers can still inspect the underlying driver error.

use thiserror::Error;

/// Errors raised by a data-access implementation
#[derive(Error, Debug)]
pub enum DataAccessError {
    /// Error reported by the SQL driver (connectivity, syntax, constraint, ...)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Stored procedure name is not registered in the catalog
    #[error("Unknown stored procedure: {0}")]
    UnknownProcedure(String),

    /// Database could not be opened or reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Failure injected by the scripted data access
    #[error("Scripted failure: {0}")]
    Scripted(String),
}

/// Application-level error types
///
/// All errors that can occur in the service layer are represented by this enum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Failure from the data-access abstraction, passed through as-is
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),

    /// A returned row could not be mapped into the response model
    #[error("Failed to map result of {identifier}: {source}")]
    Mapping {
        /// Procedure name or query text that produced the row
        identifier: String,
        /// Underlying decoding error
        #[source]
        source: serde_json::Error,
    },

    /// A stored procedure did not populate an output parameter its contract declares
    #[error("Procedure {procedure} did not return output parameter {parameter}")]
    MissingOutput {
        /// Procedure that was executed
        procedure: String,
        /// Name of the missing output parameter
        parameter: String,
    },

    /// Request is missing data the operation cannot proceed without
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error (catch-all for unexpected errors)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DataAccess(DataAccessError::Sqlx(err))
    }
}

/// Result alias used across the service layer
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_access_error_is_transparent() {
        let err = AppError::from(DataAccessError::UnknownProcedure("usp_Missing".to_string()));
        assert_eq!(err.to_string(), "Unknown stored procedure: usp_Missing");
        assert!(matches!(
            err,
            AppError::DataAccess(DataAccessError::UnknownProcedure(_))
        ));
    }

    #[test]
    fn test_missing_output_message() {
        let err = AppError::MissingOutput {
            procedure: "usp_Chat_CreateRoom".to_string(),
            parameter: "room_id".to_string(),
        };
        assert!(err.to_string().contains("usp_Chat_CreateRoom"));
        assert!(err.to_string().contains("room_id"));
    }

    #[test]
    fn test_sqlx_error_converts_to_data_access() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(
            err,
            AppError::DataAccess(DataAccessError::Sqlx(sqlx::Error::RowNotFound))
        ));
    }
}
