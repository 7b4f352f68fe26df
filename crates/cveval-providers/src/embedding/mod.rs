//! HTTP-backed [`EmbeddingProvider`], speaking an OpenAI-compatible
//! embeddings wire format (`POST {endpoint}/embeddings`), the same
//! convention as [`crate::llm::HttpLlmProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use cveval_domain::error::{Error, Result};
use cveval_domain::ports::providers::{Embedding, EmbeddingProvider};
use cveval_infrastructure::resilience::ResilienceGuard;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, HttpClientConfig};

const ENDPOINT_KEY: &str = "embed";
const OPERATION_KEY: &str = "embed_batch";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// `EmbeddingProvider` backed by an OpenAI-compatible HTTP embeddings endpoint.
///
/// Carries no metrics of its own: `InstrumentedEmbeddingProvider` wraps it at
/// the composition root to record `ai_requests_total`/duration.
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimensions: usize,
    resilience: Arc<ResilienceGuard>,
}

impl HttpEmbeddingProvider {
    /// Build a provider targeting `endpoint`, expecting `dimensions`-long vectors.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        dimensions: usize,
        http_config: &HttpClientConfig,
        resilience: Arc<ResilienceGuard>,
    ) -> Result<Self> {
        let client = build_client(http_config).map_err(|err| Error::EmbedFailed {
            message: err.to_string(),
        })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            dimensions,
            resilience,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let url = format!("{}/embeddings", self.endpoint.trim_end_matches('/'));

        self.resilience
            .guard(
                ENDPOINT_KEY,
                OPERATION_KEY,
                || Error::EmbedFailed {
                    message: "request exceeded adaptive timeout".to_owned(),
                },
                || async {
                    let mut request = self.client.post(&url).json(&EmbeddingRequest {
                        model: &self.model,
                        input: texts,
                    });
                    if let Some(api_key) = &self.api_key {
                        request = request.bearer_auth(api_key);
                    }
                    let response = request.send().await.map_err(|err| Error::EmbedFailed {
                        message: err.to_string(),
                    })?;
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::EmbedFailed {
                            message: format!("status {status}: {body}"),
                        });
                    }
                    let parsed: EmbeddingResponse = response.json().await.map_err(|err| Error::EmbedFailed {
                        message: format!("decoding response: {err}"),
                    })?;
                    Ok(parsed.data.into_iter().map(|datum| datum.embedding).collect())
                },
            )
            .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "http_embedding"
    }
}
