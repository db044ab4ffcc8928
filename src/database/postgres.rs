//! PostgreSQL ingest job store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::time::Duration;
use tracing::{debug, info};

use super::{DatabaseError, DatabaseResult, IngestJobStore};
use crate::{
    config::DatabaseConfig,
    model::{IngestJob, JobStatus},
    query::{Queryable, SortItem, SqlFilter},
};

const COLUMNS: &str = "id, user_id, user_email_address, status, status_message, \
                       start_time, end_time, last_ingest, total_files, failed_files";

/// Ingest job store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgIngestStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct IngestJobRow {
    id: i64,
    user_id: String,
    user_email_address: Option<String>,
    status: i16,
    status_message: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    last_ingest: Option<DateTime<Utc>>,
    total_files: i32,
    failed_files: i32,
}

impl TryFrom<IngestJobRow> for IngestJob {
    type Error = DatabaseError;

    fn try_from(row: IngestJobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::from_code(row.status).ok_or_else(|| {
            DatabaseError::corrupt(format!("job {} has unknown status {}", row.id, row.status))
        })?;

        Ok(IngestJob {
            id: row.id,
            user_id: row.user_id,
            user_email_address: row.user_email_address,
            status,
            status_message: row.status_message,
            start_time: row.start_time,
            end_time: row.end_time,
            last_ingest: row.last_ingest,
            total_files: row.total_files,
            failed_files: row.failed_files,
        })
    }
}

impl PgIngestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool and apply migrations if configured
    pub async fn connect(config: &DatabaseConfig) -> DatabaseResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .connect(&config.url)
            .await?;

        if config.run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database migrations applied");
        }

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl IngestJobStore for PgIngestStore {
    async fn get_all_ingest_jobs(
        &self,
        skip: u32,
        limit: u32,
        sort: &[SortItem],
        filter: &SqlFilter,
    ) -> DatabaseResult<(Vec<IngestJob>, i64)> {
        let (sql, count_sql) = list_sql(sort, filter)?;
        debug!(sql = %sql, params = ?filter.params, "Listing ingest jobs");

        let mut query = sqlx::query_as::<_, IngestJobRow>(&sql);
        for param in &filter.params {
            query = query.bind(param);
        }
        let rows = query
            .bind(i64::from(skip))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
        for param in &filter.params {
            count = count.bind(param);
        }
        let total = count.fetch_one(&self.pool).await?;

        let jobs = rows
            .into_iter()
            .map(IngestJob::try_from)
            .collect::<DatabaseResult<Vec<_>>>()?;

        Ok((jobs, total))
    }

    async fn create_ingest_job(&self, job: IngestJob) -> DatabaseResult<IngestJob> {
        let sql = format!(
            "INSERT INTO ingest_jobs (user_id, user_email_address, status, status_message, \
             start_time, end_time, last_ingest, total_files, failed_files) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {COLUMNS}"
        );

        let row = sqlx::query_as::<_, IngestJobRow>(&sql)
            .bind(&job.user_id)
            .bind(&job.user_email_address)
            .bind(job.status.code())
            .bind(&job.status_message)
            .bind(job.start_time)
            .bind(job.end_time)
            .bind(job.last_ingest)
            .bind(job.total_files)
            .bind(job.failed_files)
            .fetch_one(&self.pool)
            .await?;

        IngestJob::try_from(row)
    }

    async fn get_ingest_job(&self, id: i64) -> DatabaseResult<IngestJob> {
        let sql = format!("SELECT {COLUMNS} FROM ingest_jobs WHERE id = $1");

        sqlx::query_as::<_, IngestJobRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found(id))
            .and_then(IngestJob::try_from)
    }

    async fn update_ingest_job(&self, job: &IngestJob, expected: JobStatus) -> DatabaseResult<()> {
        let result = sqlx::query(
            "UPDATE ingest_jobs SET user_id = $2, user_email_address = $3, status = $4, \
             status_message = $5, start_time = $6, end_time = $7, last_ingest = $8, \
             total_files = $9, failed_files = $10 \
             WHERE id = $1 AND status = $11",
        )
        .bind(job.id)
        .bind(&job.user_id)
        .bind(&job.user_email_address)
        .bind(job.status.code())
        .bind(&job.status_message)
        .bind(job.start_time)
        .bind(job.end_time)
        .bind(job.last_ingest)
        .bind(job.total_files)
        .bind(job.failed_files)
        .bind(expected.code())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM ingest_jobs WHERE id = $1)")
            .bind(job.id)
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Err(DatabaseError::status_conflict(job.id, expected))
        } else {
            Err(DatabaseError::not_found(job.id))
        }
    }
}

/// Render the page query and its matching count query.
/// Filter parameters bind first, then `OFFSET` and `LIMIT`.
fn list_sql(sort: &[SortItem], filter: &SqlFilter) -> DatabaseResult<(String, String)> {
    let order = order_by(sort)?;
    let where_clause = if filter.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", numbered_placeholders(&filter.sql, 1))
    };

    let offset_index = filter.params.len() + 1;
    let sql = format!(
        "SELECT {COLUMNS} FROM ingest_jobs{where_clause} ORDER BY {order} OFFSET ${} LIMIT ${}",
        offset_index,
        offset_index + 1
    );
    let count_sql = format!("SELECT COUNT(*) FROM ingest_jobs{where_clause}");

    Ok((sql, count_sql))
}

/// Render an `ORDER BY` list, re-checking every column against the job table
fn order_by(sort: &[SortItem]) -> DatabaseResult<String> {
    if sort.is_empty() {
        return Ok("id".to_string());
    }

    if let Some(item) = sort.iter().find(|item| !IngestJob::is_sortable(&item.column)) {
        return Err(DatabaseError::generic(format!(
            "refusing to sort by unknown column '{}'",
            item.column
        )));
    }

    Ok(sort
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", "))
}

/// Rewrite `?` placeholders into PostgreSQL's `$n` form, numbering from `first`
fn numbered_placeholders(sql: &str, first: usize) -> String {
    let mut rendered = String::with_capacity(sql.len() + 8);
    let mut index = first;

    for ch in sql.chars() {
        if ch == '?' {
            rendered.push('$');
            rendered.push_str(&index.to_string());
            index += 1;
        } else {
            rendered.push(ch);
        }
    }

    rendered
}
