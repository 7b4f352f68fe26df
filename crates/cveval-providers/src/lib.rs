//! Provider layer: HTTP-backed LLM/embedding/vector-store adapters, the
//! NATS JetStream durable queue broker and enqueue client, and in-memory
//! repository adapters for the worker binary's local smoke-test mode.

pub mod embedding;
pub mod http;
pub mod llm;
#[cfg(feature = "queue-nats")]
pub mod queue;
pub mod repository;
pub mod vectorstore;
