//! HTTP route handlers

pub mod file_uploads;
pub mod health;
pub mod info;
pub mod metrics;
