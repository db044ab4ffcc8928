//! Metrics endpoints

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::{error::Result, services::AppState};

/// Prometheus metrics handler
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let body = state.metrics().render()?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}
