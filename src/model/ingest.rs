//! Ingest job model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::query::{ColumnKind, ColumnSpec, FilterOperator, Queryable};

/// Media types accepted for file upload jobs
pub const ALLOWED_FILE_UPLOAD_TYPES: &[&str] = &[
    "application/json",
    "application/zip",
    "application/x-zip-compressed",
    "application/zip-compressed",
];

/// Lifecycle status of an ingest job, serialized as its numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum JobStatus {
    Invalid,
    Ready,
    Running,
    Complete,
    Canceled,
    TimedOut,
    Failed,
    Ingesting,
    Analyzing,
    PartiallyComplete,
}

impl JobStatus {
    pub const ALL: [JobStatus; 10] = [
        JobStatus::Invalid,
        JobStatus::Ready,
        JobStatus::Running,
        JobStatus::Complete,
        JobStatus::Canceled,
        JobStatus::TimedOut,
        JobStatus::Failed,
        JobStatus::Ingesting,
        JobStatus::Analyzing,
        JobStatus::PartiallyComplete,
    ];

    /// Numeric code stored in the database and sent on the wire
    pub fn code(self) -> i16 {
        match self {
            JobStatus::Invalid => -1,
            JobStatus::Ready => 0,
            JobStatus::Running => 1,
            JobStatus::Complete => 2,
            JobStatus::Canceled => 3,
            JobStatus::TimedOut => 4,
            JobStatus::Failed => 5,
            JobStatus::Ingesting => 6,
            JobStatus::Analyzing => 7,
            JobStatus::PartiallyComplete => 8,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            JobStatus::Invalid => "INVALID",
            JobStatus::Ready => "READY",
            JobStatus::Running => "RUNNING",
            JobStatus::Complete => "COMPLETE",
            JobStatus::Canceled => "CANCELED",
            JobStatus::TimedOut => "TIMEDOUT",
            JobStatus::Failed => "FAILED",
            JobStatus::Ingesting => "INGESTING",
            JobStatus::Analyzing => "ANALYZING",
            JobStatus::PartiallyComplete => "PARTIALLYCOMPLETE",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<JobStatus> for i16 {
    fn from(status: JobStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i16> for JobStatus {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown job status code {code}"))
    }
}

/// Accepts either the numeric code or the status name, case-insensitively
impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<i16>() {
            return Self::try_from(code);
        }

        Self::ALL
            .into_iter()
            .find(|status| status.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown job status '{s}'"))
    }
}

/// A tracked file upload and its ingestion progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestJob {
    pub id: i64,
    pub user_id: String,
    pub user_email_address: Option<String>,
    pub status: JobStatus,
    pub status_message: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub last_ingest: Option<DateTime<Utc>>,
    pub total_files: i32,
    pub failed_files: i32,
}

impl IngestJob {
    /// A new running job owned by the given user. The id is assigned by the store.
    pub fn start(user_id: impl Into<String>, user_email_address: Option<String>) -> Self {
        Self {
            id: 0,
            user_id: user_id.into(),
            user_email_address,
            status: JobStatus::Running,
            status_message: String::new(),
            start_time: Utc::now(),
            end_time: None,
            last_ingest: None,
            total_files: 0,
            failed_files: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }

    /// Close the upload window and hand the job over to ingestion
    pub fn end(&mut self) {
        self.status = JobStatus::Ingesting;
        self.end_time = Some(Utc::now());
    }
}

const ORDERED: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::NotEquals,
    FilterOperator::GreaterThan,
    FilterOperator::GreaterThanOrEquals,
    FilterOperator::LessThan,
    FilterOperator::LessThanOrEquals,
];

const IDENTITY: &[FilterOperator] = &[FilterOperator::Equals, FilterOperator::NotEquals];

const SEARCHABLE: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::NotEquals,
    FilterOperator::ApproximatelyEquals,
];

const INGEST_JOB_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new("id", ColumnKind::Integer, true, ORDERED),
    ColumnSpec::new("user_id", ColumnKind::Text, true, IDENTITY),
    ColumnSpec::new("user_email_address", ColumnKind::Text, true, SEARCHABLE),
    ColumnSpec::new("status", ColumnKind::Status, true, ORDERED),
    ColumnSpec::new("status_message", ColumnKind::Text, true, SEARCHABLE),
    ColumnSpec::new("start_time", ColumnKind::Timestamp, true, ORDERED),
    ColumnSpec::new("end_time", ColumnKind::Timestamp, true, ORDERED),
    ColumnSpec::new("last_ingest", ColumnKind::Timestamp, true, ORDERED),
    ColumnSpec::new("total_files", ColumnKind::Integer, true, ORDERED),
    ColumnSpec::new("failed_files", ColumnKind::Integer, true, ORDERED),
];

impl Queryable for IngestJob {
    fn columns() -> &'static [ColumnSpec] {
        INGEST_JOB_COLUMNS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_as_code() {
        let json = serde_json::to_string(&JobStatus::Running).unwrap();
        assert_eq!(json, "1");

        let status: JobStatus = serde_json::from_str("8").unwrap();
        assert_eq!(status, JobStatus::PartiallyComplete);

        assert!(serde_json::from_str::<JobStatus>("42").is_err());
    }

    #[test]
    fn test_status_from_str_accepts_code_and_name() {
        assert_eq!("1".parse::<JobStatus>().unwrap(), JobStatus::Running);
        assert_eq!("-1".parse::<JobStatus>().unwrap(), JobStatus::Invalid);
        assert_eq!("complete".parse::<JobStatus>().unwrap(), JobStatus::Complete);
        assert_eq!("TimedOut".parse::<JobStatus>().unwrap(), JobStatus::TimedOut);
        assert!("finished".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_started_job_is_running() {
        let job = IngestJob::start("user-1", Some("user@example.com".to_string()));
        assert!(job.is_running());
        assert_eq!(job.user_id, "user-1");
        assert!(job.end_time.is_none());
    }

    #[test]
    fn test_ending_job_leaves_running() {
        let mut job = IngestJob::start("user-1", None);
        job.end();
        assert_eq!(job.status, JobStatus::Ingesting);
        assert!(!job.is_running());
        assert!(job.end_time.is_some());
    }
}
