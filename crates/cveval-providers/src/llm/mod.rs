//! HTTP-backed [`LlmProvider`], grounded on the teacher's
//! `HttpClientConfig`/`HttpClientProvider` conventions for client
//! construction and on the reqwest fetch-worker pattern in the broader
//! example pack for request/error handling.
//!
//! Speaks an OpenAI-compatible chat completions wire format
//! (`POST {endpoint}/chat/completions`), the de facto standard for
//! self-hosted and hosted LLM gateways alike.

use std::sync::Arc;

use async_trait::async_trait;
use cveval_domain::error::{Error, Result};
use cveval_domain::ports::providers::{ChatMessage, LlmProvider};
use cveval_infrastructure::resilience::ResilienceGuard;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, HttpClientConfig};

const ENDPOINT_KEY: &str = "llm";
const OPERATION_KEY: &str = "complete";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: String,
}

/// `LlmProvider` backed by an OpenAI-compatible HTTP chat completions endpoint.
///
/// Carries no metrics of its own: `InstrumentedLlmProvider` wraps it at the
/// composition root to record `ai_requests_total`/duration.
pub struct HttpLlmProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    resilience: Arc<ResilienceGuard>,
}

impl HttpLlmProvider {
    /// Build a provider targeting `endpoint` (e.g. `http://localhost:8081/v1`).
    ///
    /// `api_key` is read once at construction from the environment variable
    /// named by `llm.api_key_env`; the key itself is never logged.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        http_config: &HttpClientConfig,
        resilience: Arc<ResilienceGuard>,
    ) -> Result<Self> {
        let client = build_client(http_config).map_err(|err| Error::LlmTransport {
            operation: "build_client".to_owned(),
            message: err.to_string(),
        })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            resilience,
        })
    }
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        self.resilience
            .guard(
                ENDPOINT_KEY,
                OPERATION_KEY,
                || Error::LlmTransport {
                    operation: OPERATION_KEY.to_owned(),
                    message: "request exceeded adaptive timeout".to_owned(),
                },
                || async {
                    let mut request = self.client.post(&url).json(&ChatCompletionRequest {
                        model: &self.model,
                        messages,
                    });
                    if let Some(api_key) = &self.api_key {
                        request = request.bearer_auth(api_key);
                    }
                    let response = request.send().await.map_err(|err| Error::LlmTransport {
                        operation: OPERATION_KEY.to_owned(),
                        message: err.to_string(),
                    })?;
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::LlmTransport {
                            operation: OPERATION_KEY.to_owned(),
                            message: format!("status {status}: {body}"),
                        });
                    }
                    let parsed: ChatCompletionResponse =
                        response.json().await.map_err(|err| Error::LlmTransport {
                            operation: OPERATION_KEY.to_owned(),
                            message: format!("decoding response: {err}"),
                        })?;
                    let content = parsed
                        .choices
                        .into_iter()
                        .next()
                        .map(|choice| choice.message.content)
                        .ok_or_else(|| Error::LlmTransport {
                            operation: OPERATION_KEY.to_owned(),
                            message: "empty choices array".to_owned(),
                        })?;
                    Ok(content)
                },
            )
            .await
    }

    fn provider_name(&self) -> &str {
        "http_llm"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cveval_domain::ports::metrics::Labels;
    use cveval_domain::ports::MetricsProvider;
    use cveval_infrastructure::resilience::{BreakerConfig, TimeoutConfig};

    use super::*;

    #[derive(Default)]
    struct NoOpMetrics;
    impl MetricsProvider for NoOpMetrics {
        fn increment(&self, _name: &str, _labels: &Labels<'_>) {}
        fn gauge(&self, _name: &str, _value: f64, _labels: &Labels<'_>) {}
        fn histogram(&self, _name: &str, _value: f64, _labels: &Labels<'_>) {}
    }

    fn provider(endpoint: String) -> HttpLlmProvider {
        let resilience = Arc::new(ResilienceGuard::new(
            BreakerConfig::default(),
            TimeoutConfig {
                min: Duration::from_millis(50),
                max: Duration::from_secs(5),
                initial: Duration::from_secs(2),
            },
            Arc::new(NoOpMetrics),
        ));
        HttpLlmProvider::new(
            endpoint,
            "test-model",
            None,
            &HttpClientConfig::default(),
            resilience,
        )
        .expect("build provider")
    }

    #[tokio::test]
    async fn successful_response_returns_message_content() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "choices": [{"message": {"content": "{\"cv_match_rate\": 0.8}"}}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = provider(server.url());
        let reply = provider
            .complete(&[ChatMessage::user("evaluate this")])
            .await
            .expect("completion succeeds");
        assert!(reply.contains("cv_match_rate"));
    }

    #[tokio::test]
    async fn non_success_status_is_a_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("service unavailable")
            .create_async()
            .await;

        let provider = provider(server.url());
        let outcome = provider.complete(&[ChatMessage::user("evaluate this")]).await;
        assert!(matches!(outcome, Err(Error::LlmTransport { .. })));
    }
}
