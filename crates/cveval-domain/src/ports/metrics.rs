//! Observability port (§4.7, §6).
//!
//! Grounded on `crates/mcb-domain/src/ports/providers/metrics/provider.rs`:
//! a minimal set of primitive operations (`increment`, `gauge`,
//! `histogram`) plus named convenience methods with the metric names this
//! system actually emits, so the application layer never imports
//! `prometheus` directly.

use std::collections::HashMap;

/// Label set attached to a metric observation.
pub type Labels<'a> = HashMap<&'a str, &'a str>;

/// Metrics sink consumed by the application and infrastructure layers.
pub trait MetricsProvider: Send + Sync {
    /// Increment a counter by 1.
    fn increment(&self, name: &str, labels: &Labels<'_>);
    /// Set a gauge to an absolute value.
    fn gauge(&self, name: &str, value: f64, labels: &Labels<'_>);
    /// Observe a value in a histogram.
    fn histogram(&self, name: &str, value: f64, labels: &Labels<'_>);

    /// `jobs_enqueued_total{type}`.
    fn record_job_enqueued(&self, job_type: &str) {
        self.increment("jobs_enqueued_total", &Labels::from([("type", job_type)]));
    }

    /// `jobs_processing{type}` gauge.
    fn set_jobs_processing(&self, job_type: &str, count: f64) {
        self.gauge(
            "jobs_processing",
            count,
            &Labels::from([("type", job_type)]),
        );
    }

    /// `jobs_completed_total{type}`.
    fn record_job_completed(&self, job_type: &str) {
        self.increment("jobs_completed_total", &Labels::from([("type", job_type)]));
    }

    /// `jobs_failed_total{type}`.
    fn record_job_failed(&self, job_type: &str) {
        self.increment("jobs_failed_total", &Labels::from([("type", job_type)]));
    }

    /// `ai_requests_total{provider,operation}` and
    /// `ai_request_duration_seconds{provider,operation}`.
    fn record_ai_request(&self, provider: &str, operation: &str, duration_secs: f64) {
        let labels = Labels::from([("provider", provider), ("operation", operation)]);
        self.increment("ai_requests_total", &labels);
        self.histogram("ai_request_duration_seconds", duration_secs, &labels);
    }

    /// `evaluation_cv_match_rate` histogram.
    fn record_cv_match_rate(&self, value: f64) {
        self.histogram("evaluation_cv_match_rate", value, &Labels::new());
    }

    /// `evaluation_project_score` histogram.
    fn record_project_score(&self, value: f64) {
        self.histogram("evaluation_project_score", value, &Labels::new());
    }

    /// `rag_retrieval_effectiveness{collection,query_type}`.
    fn record_rag_effectiveness(&self, collection: &str, query_type: &str, value: f64) {
        self.histogram(
            "rag_retrieval_effectiveness",
            value,
            &Labels::from([("collection", collection), ("query_type", query_type)]),
        );
    }

    /// `rag_retrieval_errors_total{collection,error_type}`.
    fn record_rag_error(&self, collection: &str, error_type: &str) {
        self.increment(
            "rag_retrieval_errors_total",
            &Labels::from([("collection", collection), ("error_type", error_type)]),
        );
    }

    /// `circuit_breaker_status{service,operation}` gauge: 0=closed, 0.5=half-open, 1=open.
    fn record_breaker_status(&self, service: &str, operation: &str, value: f64) {
        self.gauge(
            "circuit_breaker_status",
            value,
            &Labels::from([("service", service), ("operation", operation)]),
        );
    }
}
