//! The `RetrievedChunk` entity returned by the RAG retriever (§4.3).

use serde::{Deserialize, Serialize};

/// A single piece of retrieved context, deduplicated by exact text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The chunk's text body.
    pub text: String,
    /// The vector store's similarity score for this chunk.
    pub score: f64,
    /// An optional curator-assigned weight; present entries sort before absent ones.
    pub weight: Option<f64>,
}

impl RetrievedChunk {
    /// Construct a chunk.
    #[must_use]
    pub fn new(text: impl Into<String>, score: f64, weight: Option<f64>) -> Self {
        Self {
            text: text.into(),
            score,
            weight,
        }
    }
}
