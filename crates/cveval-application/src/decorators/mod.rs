//! Cross-cutting instrumentation decorators over the domain provider ports.

pub mod embedding;
pub mod llm;

pub use embedding::InstrumentedEmbeddingProvider;
pub use llm::InstrumentedLlmProvider;
