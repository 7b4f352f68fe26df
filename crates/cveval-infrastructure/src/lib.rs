//! Infrastructure layer: circuit breaker/adaptive timeout, Prometheus
//! metrics, layered configuration, logging bootstrap, and the worker
//! dequeue runtime built on top of the domain and application layers.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod resilience;
pub mod worker;
