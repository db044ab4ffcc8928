//! Domain model

pub mod ingest;

pub use ingest::{IngestJob, JobStatus, ALLOWED_FILE_UPLOAD_TYPES};
