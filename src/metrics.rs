//! Metrics collection and reporting

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::{Result, ServerError};

/// Metrics collector
pub struct Metrics {
    registry: Registry,
    jobs_started: IntCounter,
    jobs_ended: IntCounter,
    request_errors: IntCounterVec,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let jobs_started = IntCounter::new(
            "ingest_jobs_started_total",
            "File upload jobs started",
        )
        .map_err(metrics_error)?;
        let jobs_ended = IntCounter::new(
            "ingest_jobs_ended_total",
            "File upload jobs ended",
        )
        .map_err(metrics_error)?;
        let request_errors = IntCounterVec::new(
            Opts::new("ingest_request_errors_total", "Failed ingest job requests"),
            &["operation", "code"],
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(jobs_started.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(jobs_ended.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(request_errors.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            jobs_started,
            jobs_ended,
            request_errors,
        })
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_job_started(&self) {
        self.jobs_started.inc();
    }

    pub fn record_job_ended(&self) {
        self.jobs_ended.inc();
    }

    pub fn record_error(&self, operation: &str, error: &ServerError) {
        self.request_errors
            .with_label_values(&[operation, error.error_code()])
            .inc();
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;

        String::from_utf8(buffer).map_err(|e| ServerError::Internal(e.to_string()))
    }
}

fn metrics_error(err: prometheus::Error) -> ServerError {
    ServerError::Internal(format!("Metrics error: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.record_job_started();
        metrics.record_job_started();
        metrics.record_job_ended();
        metrics.record_error("end_file_upload_job", &ServerError::BadRequest("x".into()));

        let text = metrics.render().unwrap();
        assert!(text.contains("ingest_jobs_started_total 2"));
        assert!(text.contains("ingest_jobs_ended_total 1"));
        assert!(text.contains("code=\"BAD_REQUEST\""));
    }
}
