//! File upload job endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Extension, Router,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    auth::AuthContext,
    database::{DatabaseError, IngestJobStore},
    error::{Result, ServerError},
    model::{IngestJob, JobStatus, ALLOWED_FILE_UPLOAD_TYPES},
    query::ListParams,
    services::AppState,
};

pub const FILE_UPLOAD_JOB_ID_PATH_PARAMETER: &str = "file_upload_job_id";

const JOB_NOT_RUNNING: &str = "job must be in running status";

/// Create file upload job routes
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_file_upload_jobs).post(start_file_upload_job))
        .route("/accepted-types", get(list_accepted_file_upload_types))
        .route("/:file_upload_job_id", put(end_file_upload_job))
}

/// One page of a listing
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub count: i64,
    pub skip: u32,
    pub limit: u32,
    pub data: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// List file upload jobs
pub async fn list_file_upload_jobs(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ListResponse<IngestJob>>> {
    let page = list_jobs(state.db(), &pairs)
        .await
        .inspect_err(|e| state.metrics().record_error("list_file_upload_jobs", e))?;

    Ok(Json(page))
}

/// Start a file upload job owned by the caller
pub async fn start_file_upload_job(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
) -> Result<(StatusCode, Json<DataResponse<IngestJob>>)> {
    let auth = auth.as_ref().map(|Extension(context)| context);
    let job = start_job(state.db(), auth)
        .await
        .inspect_err(|e| state.metrics().record_error("start_file_upload_job", e))?;

    state.metrics().record_job_started();
    Ok((StatusCode::CREATED, Json(DataResponse { data: job })))
}

/// End a running file upload job
pub async fn end_file_upload_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<StatusCode> {
    end_job(state.db(), &job_id)
        .await
        .inspect_err(|e| state.metrics().record_error("end_file_upload_job", e))?;

    state.metrics().record_job_ended();
    Ok(StatusCode::OK)
}

/// List the media types accepted for upload
pub async fn list_accepted_file_upload_types() -> Json<DataResponse<&'static [&'static str]>> {
    Json(DataResponse {
        data: ALLOWED_FILE_UPLOAD_TYPES,
    })
}

async fn list_jobs(
    db: &dyn IngestJobStore,
    pairs: &[(String, String)],
) -> Result<ListResponse<IngestJob>> {
    let params = ListParams::parse::<IngestJob>(pairs)?;
    let filter = params.sql_filter();

    let (jobs, count) = db
        .get_all_ingest_jobs(params.skip, params.limit, &params.sort, &filter)
        .await?;

    Ok(ListResponse {
        count,
        skip: params.skip,
        limit: params.limit,
        data: jobs,
    })
}

async fn start_job(db: &dyn IngestJobStore, auth: Option<&AuthContext>) -> Result<IngestJob> {
    let Some(auth) = auth else {
        return Err(ServerError::Authentication(
            "no authenticated user found for request".to_string(),
        ));
    };

    let job = IngestJob::start(auth.owner.id.clone(), auth.owner.email_address.clone());
    let job = db.create_ingest_job(job).await?;

    info!(job_id = job.id, user_id = %job.user_id, "Started file upload job");
    Ok(job)
}

async fn end_job(db: &dyn IngestJobStore, raw_id: &str) -> Result<IngestJob> {
    let id = parse_job_id(raw_id)?;
    let mut job = db.get_ingest_job(id).await?;

    if !job.is_running() {
        return Err(ServerError::BadRequest(JOB_NOT_RUNNING.to_string()));
    }

    job.end();
    match db.update_ingest_job(&job, JobStatus::Running).await {
        Ok(()) => {
            info!(job_id = job.id, status = %job.status, "Ended file upload job");
            Ok(job)
        }
        Err(DatabaseError::StatusConflict { .. }) => {
            warn!(job_id = id, "File upload job left running status before it could be ended");
            Err(ServerError::BadRequest(JOB_NOT_RUNNING.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

fn parse_job_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ServerError::BadRequest(format!(
                "path parameter '{}' is malformed: '{}'",
                FILE_UPLOAD_JOB_ID_PATH_PARAMETER, raw
            ))
        })
}
