//! Server configuration management

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, ServerError};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server settings
    pub server: ServerSettings,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Monitoring configuration
    pub monitoring: MonitoringConfig,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Enable compression
    #[serde(default = "default_true")]
    pub compression_enabled: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,

    /// Maximum connections
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_db_timeout")]
    pub connect_timeout: u64,

    /// Enable migrations
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret used to verify bearer tokens. Without one no caller
    /// can authenticate.
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: u64,
}

/// Monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Enable metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Metrics endpoint path
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable structured logging
    #[serde(default = "default_true")]
    pub structured_logging: bool,
}

/// Command line arguments
#[derive(Parser, Debug, Default)]
#[command(name = "ingest-server")]
#[command(about = "Ingest job HTTP server")]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Server host
    #[arg(long, env = "INGEST_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, env = "INGEST_PORT")]
    pub port: Option<u16>,

    /// Database URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Bearer token secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Log level
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,
}

impl ServerConfig {
    /// Load configuration from file and environment
    pub fn load(args: &Args) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load default configuration
        builder = builder.add_source(config::Config::try_from(&Self::default())?);

        // Load from configuration file if provided
        if let Some(config_path) = &args.config {
            builder = builder.add_source(config::File::from(config_path.clone()));
        }

        // Override with environment variables, e.g. INGEST_SERVER__PORT
        builder = builder.add_source(
            config::Environment::with_prefix("INGEST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: ServerConfig = builder.build()?.try_deserialize()?;
        config.apply_args(args);

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Command line arguments take precedence over every other source
    fn apply_args(&mut self, args: &Args) {
        if let Some(host) = &args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(database_url) = &args.database_url {
            self.database.url = database_url.clone();
        }
        if let Some(jwt_secret) = &args.jwt_secret {
            self.auth.jwt_secret = Some(jwt_secret.clone());
        }
        if let Some(log_level) = &args.log_level {
            self.monitoring.log_level = log_level.clone();
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ServerError::Config(config::ConfigError::Message(
                "Server port must be greater than 0".to_string(),
            )));
        }

        if self.database.url.is_empty() {
            return Err(ServerError::Config(config::ConfigError::Message(
                "Database URL is required".to_string(),
            )));
        }

        if self.auth.jwt_secret.as_deref() == Some("") {
            return Err(ServerError::Config(config::ConfigError::Message(
                "JWT secret must not be empty".to_string(),
            )));
        }

        if self.auth.jwt_expiration == 0 || self.auth.jwt_expiration > MAX_JWT_EXPIRATION {
            return Err(ServerError::Config(config::ConfigError::Message(format!(
                "JWT expiration must be between 1 and {} seconds",
                MAX_JWT_EXPIRATION
            ))));
        }

        if !self.monitoring.metrics_path.starts_with('/') {
            return Err(ServerError::Config(config::ConfigError::Message(
                "Metrics path must start with '/'".to_string(),
            )));
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout: default_timeout(),
            max_body_size: default_max_body_size(),
            cors_enabled: default_true(),
            compression_enabled: default_true(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/ingest".to_string(),
            max_connections: default_db_max_connections(),
            connect_timeout: default_db_timeout(),
            run_migrations: default_true(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiration: default_jwt_expiration(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_true(),
            metrics_path: default_metrics_path(),
            log_level: default_log_level(),
            structured_logging: default_true(),
        }
    }
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_max_body_size() -> usize { 1024 * 1024 } // 1MB
fn default_true() -> bool { true }
fn default_db_max_connections() -> u32 { 10 }
fn default_db_timeout() -> u64 { 30 }
fn default_jwt_expiration() -> u64 { 86400 } // 24 hours

/// Longest accepted token lifetime, one year
pub const MAX_JWT_EXPIRATION: u64 = 365 * 86400;
fn default_metrics_path() -> String { "/metrics".to_string() }
fn default_log_level() -> String { "info".to_string() }
