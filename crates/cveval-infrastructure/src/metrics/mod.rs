//! Prometheus-backed `MetricsProvider` (§4.7, §6).
//!
//! Grounded on the teacher's `infrastructure::prometheus_metrics` module:
//! named `HistogramVec`/`CounterVec`/`GaugeVec` fields registered via the
//! `register_*!` macros, dispatched from generic `increment`/`gauge`/
//! `histogram` calls. Deliberately uses its own [`prometheus::Registry`]
//! injected at construction time rather than the teacher's `OnceLock`
//! global — see `DESIGN.md` for why.

use cveval_domain::ports::metrics::Labels;
use cveval_domain::ports::MetricsProvider;
use prometheus::{
    CounterVec, Encoder, GaugeVec, Histogram, HistogramVec, Registry, TextEncoder,
};

const LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];
const SCORE_BUCKETS: &[f64] = &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
const RATE_BUCKETS: &[f64] = &[0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// A `MetricsProvider` backed by a dedicated Prometheus registry.
///
/// Every metric named in §6 is registered eagerly at construction, so a
/// misconfigured metric name fails fast instead of silently dropping
/// observations.
pub struct PrometheusMetricsProvider {
    registry: Registry,
    jobs_enqueued_total: CounterVec,
    jobs_processing: GaugeVec,
    jobs_completed_total: CounterVec,
    jobs_failed_total: CounterVec,
    ai_requests_total: CounterVec,
    ai_request_duration_seconds: HistogramVec,
    evaluation_cv_match_rate: Histogram,
    evaluation_project_score: Histogram,
    rag_retrieval_effectiveness: HistogramVec,
    rag_retrieval_errors_total: CounterVec,
    circuit_breaker_status: GaugeVec,
}

impl PrometheusMetricsProvider {
    /// Register every pipeline metric against a fresh registry.
    ///
    /// # Errors
    /// Returns a `prometheus::Error` if a metric name collides on registration.
    pub fn try_new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let jobs_enqueued_total = CounterVec::new(
            prometheus::Opts::new("jobs_enqueued_total", "Total jobs enqueued"),
            &["type"],
        )?;
        let jobs_processing = GaugeVec::new(
            prometheus::Opts::new("jobs_processing", "Jobs currently being processed"),
            &["type"],
        )?;
        let jobs_completed_total = CounterVec::new(
            prometheus::Opts::new("jobs_completed_total", "Total jobs completed"),
            &["type"],
        )?;
        let jobs_failed_total = CounterVec::new(
            prometheus::Opts::new("jobs_failed_total", "Total jobs failed"),
            &["type"],
        )?;
        let ai_requests_total = CounterVec::new(
            prometheus::Opts::new("ai_requests_total", "Total AI provider requests"),
            &["provider", "operation"],
        )?;
        let ai_request_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "ai_request_duration_seconds",
                "AI provider request duration in seconds",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["provider", "operation"],
        )?;
        let evaluation_cv_match_rate = Histogram::with_opts(
            prometheus::HistogramOpts::new("evaluation_cv_match_rate", "Distribution of cv_match_rate scores")
                .buckets(RATE_BUCKETS.to_vec()),
        )?;
        let evaluation_project_score = Histogram::with_opts(
            prometheus::HistogramOpts::new("evaluation_project_score", "Distribution of project_score scores")
                .buckets(SCORE_BUCKETS.to_vec()),
        )?;
        let rag_retrieval_effectiveness = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "rag_retrieval_effectiveness",
                "Token-overlap relevance of retrieved context",
            )
            .buckets(RATE_BUCKETS.to_vec()),
            &["collection", "query_type"],
        )?;
        let rag_retrieval_errors_total = CounterVec::new(
            prometheus::Opts::new("rag_retrieval_errors_total", "Total RAG retrieval errors"),
            &["collection", "error_type"],
        )?;
        let circuit_breaker_status = GaugeVec::new(
            prometheus::Opts::new(
                "circuit_breaker_status",
                "0=closed, 0.5=half-open, 1=open",
            ),
            &["service", "operation"],
        )?;

        registry.register(Box::new(jobs_enqueued_total.clone()))?;
        registry.register(Box::new(jobs_processing.clone()))?;
        registry.register(Box::new(jobs_completed_total.clone()))?;
        registry.register(Box::new(jobs_failed_total.clone()))?;
        registry.register(Box::new(ai_requests_total.clone()))?;
        registry.register(Box::new(ai_request_duration_seconds.clone()))?;
        registry.register(Box::new(evaluation_cv_match_rate.clone()))?;
        registry.register(Box::new(evaluation_project_score.clone()))?;
        registry.register(Box::new(rag_retrieval_effectiveness.clone()))?;
        registry.register(Box::new(rag_retrieval_errors_total.clone()))?;
        registry.register(Box::new(circuit_breaker_status.clone()))?;

        Ok(Self {
            registry,
            jobs_enqueued_total,
            jobs_processing,
            jobs_completed_total,
            jobs_failed_total,
            ai_requests_total,
            ai_request_duration_seconds,
            evaluation_cv_match_rate,
            evaluation_project_score,
            rag_retrieval_effectiveness,
            rag_retrieval_errors_total,
            circuit_breaker_status,
        })
    }

    /// Render the registry in Prometheus text exposition format, for a `/metrics` endpoint.
    #[must_use]
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    fn label<'a>(labels: &'a Labels<'a>, key: &str) -> &'a str {
        labels.get(key).copied().unwrap_or("")
    }
}

impl MetricsProvider for PrometheusMetricsProvider {
    fn increment(&self, name: &str, labels: &Labels<'_>) {
        match name {
            "jobs_enqueued_total" => self
                .jobs_enqueued_total
                .with_label_values(&[Self::label(labels, "type")])
                .inc(),
            "jobs_completed_total" => self
                .jobs_completed_total
                .with_label_values(&[Self::label(labels, "type")])
                .inc(),
            "jobs_failed_total" => self
                .jobs_failed_total
                .with_label_values(&[Self::label(labels, "type")])
                .inc(),
            "ai_requests_total" => self
                .ai_requests_total
                .with_label_values(&[Self::label(labels, "provider"), Self::label(labels, "operation")])
                .inc(),
            "rag_retrieval_errors_total" => self
                .rag_retrieval_errors_total
                .with_label_values(&[Self::label(labels, "collection"), Self::label(labels, "error_type")])
                .inc(),
            other => tracing::warn!(metric = other, "increment called for unregistered counter"),
        }
    }

    fn gauge(&self, name: &str, value: f64, labels: &Labels<'_>) {
        match name {
            "jobs_processing" => self
                .jobs_processing
                .with_label_values(&[Self::label(labels, "type")])
                .set(value),
            "circuit_breaker_status" => self
                .circuit_breaker_status
                .with_label_values(&[Self::label(labels, "service"), Self::label(labels, "operation")])
                .set(value),
            other => tracing::warn!(metric = other, "gauge called for unregistered gauge"),
        }
    }

    fn histogram(&self, name: &str, value: f64, labels: &Labels<'_>) {
        match name {
            "ai_request_duration_seconds" => self
                .ai_request_duration_seconds
                .with_label_values(&[Self::label(labels, "provider"), Self::label(labels, "operation")])
                .observe(value),
            "evaluation_cv_match_rate" => self.evaluation_cv_match_rate.observe(value),
            "evaluation_project_score" => self.evaluation_project_score.observe(value),
            "rag_retrieval_effectiveness" => self
                .rag_retrieval_effectiveness
                .with_label_values(&[Self::label(labels, "collection"), Self::label(labels, "query_type")])
                .observe(value),
            other => tracing::warn!(metric = other, "histogram called for unregistered histogram"),
        }
    }
}
