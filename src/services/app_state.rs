//! Application state management

use std::sync::Arc;
use tracing::warn;

use crate::{
    auth::Authenticator,
    config::ServerConfig,
    database::{IngestJobStore, PgIngestStore},
    error::Result,
    metrics::Metrics,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Ingest job persistence
    pub db: Arc<dyn IngestJobStore>,

    /// Bearer token verification
    pub authenticator: Arc<Authenticator>,

    /// Metrics collector
    pub metrics: Arc<Metrics>,

    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create new application state backed by PostgreSQL
    pub async fn new(config: &ServerConfig) -> Result<Self> {
        let store = PgIngestStore::connect(&config.database).await?;
        Self::with_store(config.clone(), Arc::new(store))
    }

    /// Create application state around an existing store
    pub fn with_store(config: ServerConfig, db: Arc<dyn IngestJobStore>) -> Result<Self> {
        let authenticator = Authenticator::new(&config.auth)?;
        if !authenticator.is_configured() {
            warn!("No JWT secret configured; requests cannot authenticate");
        }

        Ok(Self {
            db,
            authenticator: Arc::new(authenticator),
            metrics: Arc::new(Metrics::new()?),
            config: Arc::new(config),
        })
    }

    /// Get ingest job store
    pub fn db(&self) -> &dyn IngestJobStore {
        self.db.as_ref()
    }

    /// Get metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
