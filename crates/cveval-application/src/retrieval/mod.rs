//! RAG Retriever (§4.3).

pub mod relevance;
pub mod rerank;
pub mod retriever;

pub use relevance::{mean_relevance, relevance as relevance_score};
pub use rerank::top_contexts_by_weight;
pub use retriever::{RagRetriever, RetrievedContext};
