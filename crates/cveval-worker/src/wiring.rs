//! Dependency wiring: turns a loaded [`Settings`] into the concrete
//! provider stack behind the domain ports, shared by every CLI subcommand.

use std::sync::Arc;

use cveval_application::decorators::{InstrumentedEmbeddingProvider, InstrumentedLlmProvider};
use cveval_application::orchestrator::{ChainOrchestrator, EvaluationPlan};
use cveval_application::retrieval::RagRetriever;
use cveval_domain::ports::providers::{EmbeddingProvider, LlmProvider, VectorStoreProvider};
use cveval_domain::ports::{MetricsProvider, QueueBroker};
use cveval_infrastructure::config::Settings;
use cveval_infrastructure::metrics::PrometheusMetricsProvider;
use cveval_infrastructure::resilience::{BreakerConfig, ResilienceGuard, TimeoutConfig};
use cveval_infrastructure::worker::WorkerRuntime;
use cveval_providers::embedding::HttpEmbeddingProvider;
use cveval_providers::http::HttpClientConfig;
use cveval_providers::llm::HttpLlmProvider;
use cveval_providers::queue::{EnqueueClient, NatsQueueBroker};
use cveval_providers::repository::{InMemoryJobRepository, InMemoryResultRepository, InMemoryUploadRepository};
use cveval_providers::vectorstore::HttpVectorStoreProvider;
use tokio_util::sync::CancellationToken;

/// Self-hosted-gateway chat model identifier. Not part of the external
/// configuration surface (§6 names only `llm.endpoint`/`llm.api_key_env`);
/// OpenAI-compatible gateways that front a single fine-tuned model
/// typically ignore this field, so a fixed identifier is sufficient here.
const DEFAULT_MODEL: &str = "cveval-default";
/// Embedding dimensionality, matching the common `text-embedding-3-small`
/// default since no separate embedding config surface is named in §6.
const DEFAULT_EMBED_DIMENSIONS: usize = 1536;
/// Chunks retrieved per collection (§4.3).
const RAG_TOP_K: usize = 6;

/// Every collaborator the worker binary needs, built once from configuration.
pub struct Wiring {
    /// The bounded-concurrency dequeue runtime.
    pub runtime: Arc<WorkerRuntime>,
    /// Manual single-task submission client.
    pub enqueue_client: Arc<EnqueueClient>,
    /// The Prometheus registry, exposed for the `health` command's render.
    pub metrics: Arc<PrometheusMetricsProvider>,
}

impl Wiring {
    /// Build the full provider stack from `settings`.
    ///
    /// # Errors
    /// Returns an error if any collaborator (metrics registry, HTTP clients,
    /// the NATS connection) fails to construct.
    pub async fn build(settings: &Settings) -> anyhow::Result<Self> {
        let metrics = Arc::new(PrometheusMetricsProvider::try_new()?);
        let metrics_dyn: Arc<dyn MetricsProvider> = metrics.clone();

        let resilience = Arc::new(ResilienceGuard::new(
            BreakerConfig {
                failure_threshold: settings.resilience.circuit_breaker_failure_threshold,
                cooldown: std::time::Duration::from_secs(settings.resilience.circuit_breaker_cooldown_secs),
                success_threshold: settings.resilience.circuit_breaker_success_threshold,
            },
            TimeoutConfig {
                min: std::time::Duration::from_millis(settings.resilience.timeout_min_ms),
                max: std::time::Duration::from_millis(settings.resilience.timeout_max_ms),
                initial: std::time::Duration::from_millis(settings.resilience.timeout_initial_ms),
            },
            metrics_dyn.clone(),
        ));

        let http_config = HttpClientConfig::default();
        let api_key = std::env::var(&settings.llm.api_key_env).ok();

        let http_llm = HttpLlmProvider::new(
            settings.llm.endpoint.clone(),
            DEFAULT_MODEL,
            api_key.clone(),
            &http_config,
            resilience.clone(),
        )?;
        let llm: Arc<dyn LlmProvider> =
            Arc::new(InstrumentedLlmProvider::new(Arc::new(http_llm), metrics_dyn.clone(), "complete"));
        let http_embeddings = HttpEmbeddingProvider::new(
            settings.llm.endpoint.clone(),
            DEFAULT_MODEL,
            api_key,
            DEFAULT_EMBED_DIMENSIONS,
            &http_config,
            resilience.clone(),
        )?;
        let embeddings: Arc<dyn EmbeddingProvider> =
            Arc::new(InstrumentedEmbeddingProvider::new(Arc::new(http_embeddings), metrics_dyn.clone()));
        let vector_store: Arc<dyn VectorStoreProvider> = Arc::new(HttpVectorStoreProvider::new(
            settings.vector_store.endpoint.clone(),
            &http_config,
            resilience,
            metrics_dyn.clone(),
        )?);

        let broker: Arc<dyn QueueBroker> = Arc::new(
            NatsQueueBroker::connect(
                &settings.queue.broker_url,
                settings.queue.max_retry,
                u32::try_from(settings.queue.retention_hours).unwrap_or(u32::MAX),
            )
            .await
            .map_err(|err| anyhow::anyhow!(err))?,
        );

        let retriever = Arc::new(RagRetriever::new(embeddings, vector_store, metrics_dyn.clone(), RAG_TOP_K));
        let uploads = Arc::new(InMemoryUploadRepository::default());
        let jobs = Arc::new(InMemoryJobRepository::default());
        let results = Arc::new(InMemoryResultRepository::default());
        let plan = resolve_plan(settings);

        let orchestrator = Arc::new(ChainOrchestrator::new(
            llm,
            uploads,
            jobs,
            results,
            retriever,
            metrics_dyn.clone(),
            plan,
        ));

        let runtime = Arc::new(WorkerRuntime::new(
            broker.clone(),
            orchestrator,
            metrics_dyn.clone(),
            settings.worker.concurrency,
            CancellationToken::new(),
        ));

        let enqueue_options = cveval_domain::ports::queue::EnqueueOptions {
            max_retry: settings.queue.max_retry,
            retention_hours: u32::try_from(settings.queue.retention_hours).unwrap_or(u32::MAX),
        };
        let enqueue_client = Arc::new(EnqueueClient::new(broker, metrics_dyn, enqueue_options));

        Ok(Self {
            runtime,
            enqueue_client,
            metrics,
        })
    }
}

fn resolve_plan(settings: &Settings) -> EvaluationPlan {
    match settings.worker.evaluation_plan.as_deref() {
        Some("direct") => EvaluationPlan::Direct,
        Some("chained") => EvaluationPlan::Chained,
        Some("direct_then_normalize") => EvaluationPlan::DirectThenNormalize,
        Some("chained_then_normalize") => EvaluationPlan::ChainedThenNormalize,
        Some(other) => {
            tracing::warn!(plan = other, "unrecognized worker.evaluation_plan, falling back to chain/two_pass flags");
            EvaluationPlan::from_flags(settings.worker.chain, settings.worker.two_pass)
        }
        None => EvaluationPlan::from_flags(settings.worker.chain, settings.worker.two_pass),
    }
}

#[cfg(test)]
mod tests {
    use cveval_infrastructure::config::WorkerConfig;

    use super::*;

    fn worker_config(evaluation_plan: Option<&str>, chain: bool, two_pass: bool) -> Settings {
        Settings {
            llm: cveval_infrastructure::config::LlmConfig {
                endpoint: "http://localhost:8081".to_owned(),
                api_key_env: "CVEVAL_LLM_API_KEY".to_owned(),
            },
            vector_store: cveval_infrastructure::config::VectorStoreConfig {
                endpoint: "http://localhost:6333".to_owned(),
            },
            worker: WorkerConfig {
                concurrency: 5,
                two_pass,
                chain,
                evaluation_plan: evaluation_plan.map(str::to_owned),
            },
            tracing: cveval_infrastructure::config::TracingConfig { sampling_ratio: 1.0 },
            queue: cveval_infrastructure::config::QueueConfig {
                broker_url: "nats://localhost:4222".to_owned(),
                max_retry: 5,
                retention_hours: 24,
            },
            resilience: cveval_infrastructure::config::ResilienceSettings {
                circuit_breaker_failure_threshold: 5,
                circuit_breaker_cooldown_secs: 30,
                circuit_breaker_success_threshold: 3,
                timeout_min_ms: 500,
                timeout_max_ms: 30_000,
                timeout_initial_ms: 5_000,
            },
            logging: cveval_infrastructure::config::LoggingConfig {
                level: "info".to_owned(),
                json_format: false,
            },
        }
    }

    #[test]
    fn explicit_plan_name_takes_precedence_over_flags() {
        let settings = worker_config(Some("chained_then_normalize"), false, false);
        assert_eq!(resolve_plan(&settings), EvaluationPlan::ChainedThenNormalize);
    }

    #[test]
    fn absent_plan_name_falls_back_to_flags() {
        let settings = worker_config(None, true, false);
        assert_eq!(resolve_plan(&settings), EvaluationPlan::Chained);
    }

    #[test]
    fn unrecognized_plan_name_falls_back_to_flags() {
        let settings = worker_config(Some("not-a-real-plan"), false, true);
        assert_eq!(resolve_plan(&settings), EvaluationPlan::DirectThenNormalize);
    }
}
