//! Application layer: clamp/normalizer, prompt builder, RAG retriever,
//! chain orchestrator, and cross-cutting decorators over domain ports.

pub mod clamp;
pub mod decorators;
pub mod orchestrator;
pub mod prompt;
pub mod retrieval;
