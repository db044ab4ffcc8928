//! Persistence for ingest jobs

pub mod error;
pub mod postgres;

use async_trait::async_trait;

use crate::model::{IngestJob, JobStatus};
use crate::query::{SortItem, SqlFilter};

pub use error::{DatabaseError, DatabaseResult};
pub use postgres::PgIngestStore;

/// Storage backend for ingest jobs
#[async_trait]
pub trait IngestJobStore: Send + Sync {
    /// List one page of jobs matching `filter`, with the total number of matches
    async fn get_all_ingest_jobs(
        &self,
        skip: u32,
        limit: u32,
        sort: &[SortItem],
        filter: &SqlFilter,
    ) -> DatabaseResult<(Vec<IngestJob>, i64)>;

    /// Insert a new job and return it with its assigned id
    async fn create_ingest_job(&self, job: IngestJob) -> DatabaseResult<IngestJob>;

    async fn get_ingest_job(&self, id: i64) -> DatabaseResult<IngestJob>;

    /// Persist `job`, provided the stored row is still in `expected` status.
    /// Returns [`DatabaseError::StatusConflict`] otherwise.
    async fn update_ingest_job(&self, job: &IngestJob, expected: JobStatus) -> DatabaseResult<()>;
}
