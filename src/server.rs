//! Main server implementation

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::get,
    Router,
};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    config::ServerConfig,
    error::{Result, ServerError},
    middleware::auth::resolve_auth_context,
    routes,
    services::AppState,
};

/// Ingest job HTTP server
pub struct Server {
    config: ServerConfig,
    app_state: AppState,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: ServerConfig) -> Result<Self> {
        // Initialize application state
        let app_state = AppState::new(&config).await?;

        Ok(Self { config, app_state })
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let app = build_router(self.app_state.clone());
        let addr = self.socket_addr()?;

        info!("Starting ingest server on {}", addr);

        // Create server with graceful shutdown
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        info!("Server stopped gracefully");
        Ok(())
    }

    /// Get the socket address for the server
    fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| ServerError::Internal(format!("Invalid server address: {}", e)))
    }
}

/// Create the Axum application
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app = Router::new()
        // Health check endpoint
        .route("/health", get(routes::health::health_check))
        // API routes
        .nest("/api/v2", create_api_routes());

    // Metrics endpoint (if enabled)
    if config.monitoring.metrics_enabled {
        app = app.route(
            &config.monitoring.metrics_path,
            get(routes::metrics::metrics_handler),
        );
    }

    let app = app
        .layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_auth_context,
        ))
        .with_state(state);

    add_middleware_layers(app, &config)
}

/// Create API routes
fn create_api_routes() -> Router<AppState> {
    Router::new()
        // File upload job endpoints
        .nest("/ingest-jobs", routes::file_uploads::create_routes())
        // Server info endpoint
        .route("/info", get(routes::info::server_info))
}

/// Add middleware layers to the application
fn add_middleware_layers(mut app: Router, config: &ServerConfig) -> Router {
    // Set body size limit
    app = app.layer(DefaultBodyLimit::max(config.server.max_body_size));

    // Add timeout layer
    app = app.layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout)));

    // Add compression layer if enabled
    if config.server.compression_enabled {
        app = app.layer(CompressionLayer::new());
    }

    // Add CORS layer if enabled
    if config.server.cors_enabled {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        );
    }

    // Add tracing layer
    app.layer(TraceLayer::new_for_http())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    warn!("Starting graceful shutdown...");
}
