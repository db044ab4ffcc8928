//! Server info endpoints

use axum::response::Json;
use serde_json::{json, Value};

use crate::model::ALLOWED_FILE_UPLOAD_TYPES;

/// Server information endpoint
pub async fn server_info() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "accepted_upload_types": ALLOWED_FILE_UPLOAD_TYPES.len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
