//! Service layer for the ingest API server

pub mod app_state;

pub use app_state::AppState;
