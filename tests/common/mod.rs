use async_trait::async_trait;
use axum::http::{header, HeaderName, HeaderValue};
use axum_test::TestServer;
use ingest_api::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A store call as observed by [`MockIngestStore`]
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    GetAll {
        skip: u32,
        limit: u32,
        sort: Vec<SortItem>,
        filter: SqlFilter,
    },
    Create(IngestJob),
    Get(i64),
    Update {
        job: IngestJob,
        expected: JobStatus,
    },
}

/// Store double with scripted responses. Every call is recorded; a call with
/// no scripted response fails with a database error.
#[derive(Default)]
pub struct MockIngestStore {
    list: Mutex<VecDeque<DatabaseResult<(Vec<IngestJob>, i64)>>>,
    create: Mutex<VecDeque<DatabaseResult<IngestJob>>>,
    get: Mutex<VecDeque<DatabaseResult<IngestJob>>>,
    update: Mutex<VecDeque<DatabaseResult<()>>>,
    calls: Mutex<Vec<StoreCall>>,
}

#[allow(dead_code)]
impl MockIngestStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn expect_get_all_ingest_jobs(&self, result: DatabaseResult<(Vec<IngestJob>, i64)>) {
        self.list.lock().unwrap().push_back(result);
    }

    pub fn expect_create_ingest_job(&self, result: DatabaseResult<IngestJob>) {
        self.create.lock().unwrap().push_back(result);
    }

    pub fn expect_get_ingest_job(&self, result: DatabaseResult<IngestJob>) {
        self.get.lock().unwrap().push_back(result);
    }

    pub fn expect_update_ingest_job(&self, result: DatabaseResult<()>) {
        self.update.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn update_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::Update { .. }))
            .count()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next<T>(queue: &Mutex<VecDeque<DatabaseResult<T>>>, method: &str) -> DatabaseResult<T> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DatabaseError::generic(format!("unexpected call to {method}"))))
    }
}

#[async_trait]
impl IngestJobStore for MockIngestStore {
    async fn get_all_ingest_jobs(
        &self,
        skip: u32,
        limit: u32,
        sort: &[SortItem],
        filter: &SqlFilter,
    ) -> DatabaseResult<(Vec<IngestJob>, i64)> {
        self.record(StoreCall::GetAll {
            skip,
            limit,
            sort: sort.to_vec(),
            filter: filter.clone(),
        });
        Self::next(&self.list, "get_all_ingest_jobs")
    }

    async fn create_ingest_job(&self, job: IngestJob) -> DatabaseResult<IngestJob> {
        self.record(StoreCall::Create(job));
        Self::next(&self.create, "create_ingest_job")
    }

    async fn get_ingest_job(&self, id: i64) -> DatabaseResult<IngestJob> {
        self.record(StoreCall::Get(id));
        Self::next(&self.get, "get_ingest_job")
    }

    async fn update_ingest_job(&self, job: &IngestJob, expected: JobStatus) -> DatabaseResult<()> {
        self.record(StoreCall::Update {
            job: job.clone(),
            expected,
        });
        Self::next(&self.update, "update_ingest_job")
    }
}

/// Test harness around the full router
#[allow(dead_code)]
pub struct Harness {
    pub server: TestServer,
    pub store: Arc<MockIngestStore>,
    pub state: AppState,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        let store = MockIngestStore::new();

        let mut config = ServerConfig::default();
        config.auth.jwt_secret = Some("test-secret".to_string());

        let state = AppState::with_store(config, store.clone()).unwrap();
        let server = TestServer::new(build_router(state.clone())).unwrap();

        Self {
            server,
            store,
            state,
        }
    }

    /// `Authorization` header carrying a valid token for `user`
    pub fn bearer(&self, user: &User) -> (HeaderName, HeaderValue) {
        let token = self.state.authenticator.issue_token(user).unwrap();
        (
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        )
    }
}

#[allow(dead_code)]
pub fn setup_user() -> User {
    User::new("user-1", "John")
        .with_name("John", "Doe")
        .with_email("johndoe@gmail.com")
}

#[allow(dead_code)]
pub fn job_with_status(status: JobStatus) -> IngestJob {
    IngestJob {
        id: 123,
        status,
        ..IngestJob::start("user-1", Some("johndoe@gmail.com".to_string()))
    }
}
