//! Port traits: the boundary between the domain and external collaborators.

pub mod metrics;
pub mod providers;
pub mod queue;
pub mod repositories;

pub use metrics::MetricsProvider;
pub use providers::{ChatMessage, EmbeddingProvider, Embedding, LlmProvider, VectorStoreProvider};
pub use queue::{BrokerTaskId, Delivery, EnqueueOptions, QueueBroker};
pub use repositories::{JobRepository, ResultRepository, UploadRepository};
