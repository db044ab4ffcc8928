//! Ingest job HTTP API
//!
//! This crate provides the HTTP surface of the file upload ingest subsystem:
//! - Listing ingest jobs with pagination, sorting and filter predicates
//! - Starting and ending file upload jobs on behalf of an authenticated user
//! - Publishing the media types accepted for upload
//! - PostgreSQL persistence, bearer-token authentication and metrics

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod model;
pub mod query;
pub mod routes;
pub mod server;
pub mod services;

pub use crate::config::ServerConfig;
pub use crate::error::{Result, ServerError};
pub use crate::server::{build_router, Server};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        auth::{AuthContext, User},
        config::ServerConfig,
        database::{DatabaseError, DatabaseResult, IngestJobStore},
        error::{Result, ServerError},
        model::{IngestJob, JobStatus, ALLOWED_FILE_UPLOAD_TYPES},
        query::{SortItem, SqlFilter},
        server::{build_router, Server},
        services::AppState,
    };
}
