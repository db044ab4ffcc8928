//! Error types for ingest job persistence

use thiserror::Error;

/// Result type for store operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[derive(Error, Debug)]
pub enum DatabaseError {
    /// No job with the requested id
    #[error("Ingest job not found: {id}")]
    NotFound { id: i64 },

    /// A conditional update found the job in a different status than expected
    #[error("Ingest job {id} is no longer in {expected} status")]
    StatusConflict { id: i64, expected: String },

    /// Stored row could not be mapped to the model
    #[error("Corrupt ingest job row: {message}")]
    Corrupt { message: String },

    #[error("SQL error: {source}")]
    Sqlx {
        #[from]
        source: sqlx::Error,
    },

    #[error("Migration error: {source}")]
    Migration {
        #[from]
        source: sqlx::migrate::MigrateError,
    },

    #[error("Database error: {message}")]
    Generic { message: String },
}

impl DatabaseError {
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    pub fn status_conflict(id: i64, expected: impl ToString) -> Self {
        Self::StatusConflict {
            id,
            expected: expected.to_string(),
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::StatusConflict { .. } => "conflict",
            Self::Corrupt { .. } => "corruption",
            Self::Sqlx { .. } => "sql",
            Self::Migration { .. } => "migration",
            Self::Generic { .. } => "generic",
        }
    }
}
