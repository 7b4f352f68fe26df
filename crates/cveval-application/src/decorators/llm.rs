//! `InstrumentedLlmProvider` (§4.7): wraps an `LlmProvider`, records
//! `ai_requests_total`/`ai_request_duration_seconds`, and delegates the rest.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use cveval_domain::error::Result;
use cveval_domain::ports::{ChatMessage, LlmProvider, MetricsProvider};

/// Decorates an [`LlmProvider`] with per-call AI-request metrics.
pub struct InstrumentedLlmProvider {
    inner: Arc<dyn LlmProvider>,
    metrics: Arc<dyn MetricsProvider>,
    operation: &'static str,
}

impl InstrumentedLlmProvider {
    /// Wrap `inner`, labeling every recorded metric with `operation`.
    #[must_use]
    pub fn new(inner: Arc<dyn LlmProvider>, metrics: Arc<dyn MetricsProvider>, operation: &'static str) -> Self {
        Self {
            inner,
            metrics,
            operation,
        }
    }
}

#[async_trait]
impl LlmProvider for InstrumentedLlmProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let started = Instant::now();
        let outcome = self.inner.complete(messages).await;
        let duration = started.elapsed().as_secs_f64();
        self.metrics
            .record_ai_request(self.inner.provider_name(), self.operation, duration);
        outcome
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cveval_domain::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeLlm {
        response: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for FakeLlm {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            if self.fail {
                return Err(Error::LlmTransport {
                    operation: "evaluate".into(),
                    message: "boom".into(),
                });
            }
            Ok(self.response.to_owned())
        }

        fn provider_name(&self) -> &str {
            "fake-llm"
        }
    }

    #[derive(Default)]
    struct FakeMetrics {
        calls: Mutex<Vec<(String, String)>>,
        count: AtomicUsize,
    }

    impl MetricsProvider for FakeMetrics {
        fn increment(&self, _name: &str, _labels: &cveval_domain::ports::metrics::Labels<'_>) {}
        fn gauge(&self, _name: &str, _value: f64, _labels: &cveval_domain::ports::metrics::Labels<'_>) {}
        fn histogram(&self, _name: &str, _value: f64, _labels: &cveval_domain::ports::metrics::Labels<'_>) {}

        fn record_ai_request(&self, provider: &str, operation: &str, _duration_secs: f64) {
            self.count.fetch_add(1, Ordering::SeqCst);
            self.calls
                .lock()
                .unwrap()
                .push((provider.to_owned(), operation.to_owned()));
        }
    }

    #[tokio::test]
    async fn records_a_metric_on_success() {
        let metrics = Arc::new(FakeMetrics::default());
        let decorated = InstrumentedLlmProvider::new(
            Arc::new(FakeLlm {
                response: "{}",
                fail: false,
            }),
            metrics.clone(),
            "evaluate",
        );
        let result = decorated.complete(&[]).await;
        assert!(result.is_ok());
        assert_eq!(metrics.count.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.calls.lock().unwrap()[0].1, "evaluate");
    }

    #[tokio::test]
    async fn records_a_metric_even_on_failure() {
        let metrics = Arc::new(FakeMetrics::default());
        let decorated = InstrumentedLlmProvider::new(
            Arc::new(FakeLlm {
                response: "",
                fail: true,
            }),
            metrics.clone(),
            "evaluate",
        );
        let result = decorated.complete(&[]).await;
        assert!(result.is_err());
        assert_eq!(metrics.count.load(Ordering::SeqCst), 1);
    }
}
