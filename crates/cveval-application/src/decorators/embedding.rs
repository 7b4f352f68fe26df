//! `InstrumentedEmbeddingProvider` (§4.7): wraps an `EmbeddingProvider`,
//! records AI-request metrics, and delegates the rest.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use cveval_domain::error::Result;
use cveval_domain::ports::providers::Embedding;
use cveval_domain::ports::{EmbeddingProvider, MetricsProvider};

/// Decorates an [`EmbeddingProvider`] with per-call AI-request metrics.
pub struct InstrumentedEmbeddingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    metrics: Arc<dyn MetricsProvider>,
}

impl InstrumentedEmbeddingProvider {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn EmbeddingProvider>, metrics: Arc<dyn MetricsProvider>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl EmbeddingProvider for InstrumentedEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let started = Instant::now();
        let outcome = self.inner.embed_batch(texts).await;
        let duration = started.elapsed().as_secs_f64();
        self.metrics
            .record_ai_request(self.inner.provider_name(), "embed", duration);
        outcome
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for FakeEmbeddings {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            Ok(texts.iter().map(|_| vec![0.0_f32; 3]).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn provider_name(&self) -> &str {
            "fake-embed"
        }
    }

    #[derive(Default)]
    struct FakeMetrics {
        count: AtomicUsize,
    }

    impl MetricsProvider for FakeMetrics {
        fn increment(&self, _name: &str, _labels: &cveval_domain::ports::metrics::Labels<'_>) {}
        fn gauge(&self, _name: &str, _value: f64, _labels: &cveval_domain::ports::metrics::Labels<'_>) {}
        fn histogram(&self, _name: &str, _value: f64, _labels: &cveval_domain::ports::metrics::Labels<'_>) {}

        fn record_ai_request(&self, _provider: &str, _operation: &str, _duration_secs: f64) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn records_a_metric_and_preserves_order() {
        let metrics = Arc::new(FakeMetrics::default());
        let decorated = InstrumentedEmbeddingProvider::new(Arc::new(FakeEmbeddings), metrics.clone());
        let result = decorated
            .embed_batch(&["a".to_owned(), "b".to_owned()])
            .await
            .expect("embeds");
        assert_eq!(result.len(), 2);
        assert_eq!(metrics.count.load(Ordering::SeqCst), 1);
    }
}
