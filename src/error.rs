//! Error handling for the ingest API server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::database::DatabaseError;
use crate::query::QueryError;

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ServerError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ServerError::Database(DatabaseError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::Authentication(_) => "AUTHENTICATION_ERROR",
            ServerError::Database(DatabaseError::NotFound { .. }) => "NOT_FOUND",
            ServerError::Database(_) => "DATABASE_ERROR",
            ServerError::Io(_) => "IO_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

impl From<QueryError> for ServerError {
    fn from(err: QueryError) -> Self {
        ServerError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            let category = match &self {
                ServerError::Database(e) => e.category(),
                _ => "server",
            };
            tracing::error!(
                error = %self,
                status = %status,
                error_code = error_code,
                category = category,
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                status = %status,
                error_code = error_code,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
                "status": status.as_u16()
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServerError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Authentication("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServerError::from(DatabaseError::generic("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::from(DatabaseError::not_found(3)).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_query_errors_are_bad_requests() {
        let err = ServerError::from(QueryError::NotSortable {
            column: "nope".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "BAD_REQUEST");
        assert!(err.to_string().contains("does not support sorting"));
    }
}
