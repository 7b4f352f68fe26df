//! External provider ports: LLM, embedding, vector store (§6).
//!
//! Grounded on `crates/mcb-domain/src/ports/providers.rs` and
//! `crates/mcb-domain/src/ports/providers/vector_store/provider.rs` — async
//! trait ports with a `provider_name()` accessor for diagnostics/metrics
//! labeling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single chat-style message for an LLM call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `"system"` or `"user"`.
    pub role: &'static str,
    /// The message body.
    pub content: String,
}

impl ChatMessage {
    /// Construct a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    /// Construct a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Large language model completion port.
///
/// Implementations are expected to be stateless and safe to share behind an
/// `Arc` across concurrent worker tasks.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Request a single chat completion and return the raw text response.
    ///
    /// Errors should be [`crate::error::Error::LlmTransport`] for anything
    /// below the content layer (network, HTTP status, provider-side
    /// timeout); schema-shaped problems are the caller's responsibility to
    /// detect from the returned text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// A short name used in metrics labels and log lines.
    fn provider_name(&self) -> &str;
}

/// A dense embedding vector.
pub type Embedding = Vec<f32>;

/// Text embedding port (§4.3 step 1).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts in one call, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// The output embedding dimensionality.
    fn dimensions(&self) -> usize;

    /// A short name used in metrics labels and log lines.
    fn provider_name(&self) -> &str;
}

/// A single vector-store search hit payload (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchHit {
    /// The stored text for this point.
    pub text: String,
    /// Optional curator weight, accepted as either an integer or float on the wire.
    pub weight: Option<f64>,
    /// The similarity score reported by the vector store.
    pub score: f64,
}

/// Vector store search port, scoped to the two named collections this
/// system uses (§4.3).
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Search `collection` for the `limit` nearest neighbours of `vector`.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorSearchHit>>;

    /// A short name used in metrics labels and log lines.
    fn provider_name(&self) -> &str;
}
