//! HTTP-backed [`VectorStoreProvider`], matching the wire contract:
//! `POST /collections/<name>/points/search` with `{vector, limit}`;
//! response `{result: [{payload: {text, weight?}, score}]}`.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use cveval_domain::error::{Error, Result};
use cveval_domain::ports::providers::{VectorSearchHit, VectorStoreProvider};
use cveval_domain::ports::MetricsProvider;
use cveval_infrastructure::resilience::ResilienceGuard;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, HttpClientConfig};

const ENDPOINT_KEY: &str = "vector_store";
const OPERATION_KEY: &str = "search";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<SearchResultEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchResultEntry {
    payload: SearchPayload,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    text: String,
    #[serde(default)]
    weight: Option<serde_json::Value>,
}

fn coerce_weight(value: Option<serde_json::Value>) -> Option<f64> {
    value.and_then(|raw| raw.as_f64().or_else(|| raw.as_i64().map(|n| n as f64)))
}

/// `VectorStoreProvider` backed by a Qdrant-style HTTP points/search endpoint.
pub struct HttpVectorStoreProvider {
    client: reqwest::Client,
    endpoint: String,
    resilience: Arc<ResilienceGuard>,
    metrics: Arc<dyn MetricsProvider>,
}

impl HttpVectorStoreProvider {
    /// Build a provider targeting `endpoint` (e.g. `http://localhost:6333`).
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        http_config: &HttpClientConfig,
        resilience: Arc<ResilienceGuard>,
        metrics: Arc<dyn MetricsProvider>,
    ) -> Result<Self> {
        let client = build_client(http_config).map_err(|err| Error::VectorSearchFailed {
            message: err.to_string(),
        })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            resilience,
            metrics,
        })
    }
}

#[async_trait]
impl VectorStoreProvider for HttpVectorStoreProvider {
    async fn search(&self, collection: &str, vector: &[f32], limit: usize) -> Result<Vec<VectorSearchHit>> {
        let url = format!(
            "{}/collections/{collection}/points/search",
            self.endpoint.trim_end_matches('/')
        );
        let started_at = Instant::now();

        let result = self
            .resilience
            .guard(
                ENDPOINT_KEY,
                OPERATION_KEY,
                || Error::VectorSearchFailed {
                    message: "request exceeded adaptive timeout".to_owned(),
                },
                || async {
                    let response = self
                        .client
                        .post(&url)
                        .json(&SearchRequest { vector, limit })
                        .send()
                        .await
                        .map_err(|err| Error::VectorSearchFailed { message: err.to_string() })?;
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::VectorSearchFailed {
                            message: format!("status {status}: {body}"),
                        });
                    }
                    let parsed: SearchResponse = response.json().await.map_err(|err| Error::VectorSearchFailed {
                        message: format!("decoding response: {err}"),
                    })?;
                    Ok(parsed
                        .result
                        .into_iter()
                        .map(|entry| VectorSearchHit {
                            text: entry.payload.text,
                            weight: coerce_weight(entry.payload.weight),
                            score: entry.score,
                        })
                        .collect())
                },
            )
            .await;

        self.metrics
            .record_ai_request(self.provider_name(), OPERATION_KEY, started_at.elapsed().as_secs_f64());
        result
    }

    fn provider_name(&self) -> &str {
        "http_vector_store"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cveval_domain::ports::metrics::Labels;
    use cveval_infrastructure::resilience::{BreakerConfig, TimeoutConfig};

    use super::*;

    #[derive(Default)]
    struct NoOpMetrics;
    impl MetricsProvider for NoOpMetrics {
        fn increment(&self, _name: &str, _labels: &Labels<'_>) {}
        fn gauge(&self, _name: &str, _value: f64, _labels: &Labels<'_>) {}
        fn histogram(&self, _name: &str, _value: f64, _labels: &Labels<'_>) {}
    }

    fn provider(endpoint: String) -> HttpVectorStoreProvider {
        let resilience = Arc::new(ResilienceGuard::new(
            BreakerConfig::default(),
            TimeoutConfig {
                min: Duration::from_millis(50),
                max: Duration::from_secs(5),
                initial: Duration::from_secs(2),
            },
            Arc::new(NoOpMetrics),
        ));
        HttpVectorStoreProvider::new(endpoint, &HttpClientConfig::default(), resilience, Arc::new(NoOpMetrics))
            .expect("build provider")
    }

    #[tokio::test]
    async fn search_decodes_hits_and_coerces_integer_weight() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/collections/job_description/points/search")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "result": [
                        {"payload": {"text": "senior rust engineer", "weight": 2}, "score": 0.91},
                        {"payload": {"text": "no weight here"}, "score": 0.5},
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = provider(server.url());
        let hits = provider
            .search("job_description", &[0.1, 0.2, 0.3], 6)
            .await
            .expect("search succeeds");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].weight, Some(2.0));
        assert_eq!(hits[1].weight, None);
    }

    #[tokio::test]
    async fn non_success_status_maps_to_vector_search_failed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/collections/scoring_rubric/points/search")
            .with_status(404)
            .create_async()
            .await;

        let provider = provider(server.url());
        let outcome = provider.search("scoring_rubric", &[0.0], 3).await;
        assert!(matches!(outcome, Err(Error::VectorSearchFailed { .. })));
    }
}
