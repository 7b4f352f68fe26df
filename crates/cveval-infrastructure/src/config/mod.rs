//! Layered configuration (§6): `config/default.toml` overlaid by
//! `CVEVAL_`-prefixed environment variables, grounded on the teacher's
//! `config::loader` module but using `figment` instead of the teacher's
//! hand-rolled YAML search — this system has a single known config path
//! plus a standard env overlay, which is exactly `figment`'s `Toml` +
//! `Env` provider pair.

use std::path::Path;

use cveval_domain::error::{Error, Result};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the LLM HTTP endpoint.
    pub endpoint: String,
    /// Name of the environment variable holding the API key (never the key itself).
    pub api_key_env: String,
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Base URL of the vector store HTTP endpoint.
    pub endpoint: String,
}

/// Worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of jobs processed concurrently.
    pub concurrency: usize,
    /// Run a normalization second pass after the first evaluation.
    pub two_pass: bool,
    /// Run the structured-extract chain before evaluating.
    pub chain: bool,
    /// Optional explicit plan name, taking precedence over `chain`/`two_pass` when set.
    pub evaluation_plan: Option<String>,
}

/// Tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Fraction of spans sampled, in `[0.0, 1.0]`.
    pub sampling_ratio: f64,
}

/// Queue/broker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Broker connection URL.
    pub broker_url: String,
    /// Maximum broker-level redelivery attempts before a message is dead-lettered.
    pub max_retry: u32,
    /// How long undelivered messages are retained, in hours.
    pub retention_hours: u64,
}

/// Circuit breaker and adaptive timeout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceSettings {
    /// Consecutive failures in `closed` before tripping to `open`.
    pub circuit_breaker_failure_threshold: u32,
    /// Cooldown before an `open` breaker becomes eligible again, in seconds.
    pub circuit_breaker_cooldown_secs: u64,
    /// Consecutive `half-open` successes required to close.
    pub circuit_breaker_success_threshold: u32,
    /// Lower bound of the adaptive timeout, in milliseconds.
    pub timeout_min_ms: u64,
    /// Upper bound of the adaptive timeout, in milliseconds.
    pub timeout_max_ms: u64,
    /// Starting adaptive timeout for an unseen endpoint/operation, in milliseconds.
    pub timeout_initial_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` env-filter directive, e.g. `"info"` or `"cveval_worker=debug,info"`.
    pub level: String,
    /// Emit JSON-formatted log lines instead of human-readable ones.
    pub json_format: bool,
}

/// Root configuration for the worker binary, covering every surface named in §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// LLM provider settings.
    pub llm: LlmConfig,
    /// Vector store settings.
    pub vector_store: VectorStoreConfig,
    /// Worker pool settings.
    pub worker: WorkerConfig,
    /// Tracing settings.
    pub tracing: TracingConfig,
    /// Queue/broker settings.
    pub queue: QueueConfig,
    /// Resilience (breaker/timeout) settings.
    pub resilience: ResilienceSettings,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load settings from `path` (typically `config/default.toml`), overlaid
    /// by any `CVEVAL_`-prefixed environment variable (e.g.
    /// `CVEVAL_WORKER.CONCURRENCY` or, with figment's nested-key split,
    /// `CVEVAL_WORKER_CONCURRENCY`).
    ///
    /// # Errors
    /// Returns an error if the file is missing, malformed, or a required key is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CVEVAL_").split("_"))
            .extract()
            .map_err(|err| Error::InvalidPayload {
                message: format!("failed to load configuration: {err}"),
            })
    }
}
