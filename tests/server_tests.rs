mod common;

use axum::http::StatusCode;
use common::*;
use ingest_api::prelude::*;
use serde_json::Value;

#[tokio::test]
async fn test_health_check() {
    let harness = Harness::new();

    let response = harness.server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_server_info() {
    let harness = Harness::new();

    let response = harness.server.get("/api/v2/info").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["name"], "ingest-api");
    assert_eq!(body["accepted_upload_types"], ALLOWED_FILE_UPLOAD_TYPES.len());
}

#[tokio::test]
async fn test_metrics_track_job_operations() {
    let harness = Harness::new();
    let (name, value) = harness.bearer(&setup_user());

    harness
        .store
        .expect_create_ingest_job(Ok(job_with_status(JobStatus::Running)));
    let response = harness.server.post("/api/v2/ingest-jobs").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = harness.server.put("/api/v2/ingest-jobs/nope").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = harness.server.get("/metrics").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let text = response.text();
    assert!(text.contains("ingest_jobs_started_total 1"));
    assert!(text.contains("operation=\"end_file_upload_job\""));
}

#[tokio::test]
async fn test_unknown_route() {
    let harness = Harness::new();

    let response = harness.server.get("/api/v2/unknown").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
