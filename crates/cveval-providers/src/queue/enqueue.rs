//! Enqueue Client (§4.8): serializes an `EvaluateTask` and submits it to the
//! broker with the system's standard retry/retention options, recording the
//! `jobs_enqueued_total` metric on success.

use std::sync::Arc;

use cveval_domain::entities::{EvaluateTask, TASK_TYPE};
use cveval_domain::error::Result;
use cveval_domain::ports::queue::{BrokerTaskId, EnqueueOptions, QueueBroker};
use cveval_domain::ports::MetricsProvider;

/// Thin wrapper around a [`QueueBroker`] that applies the system's standard
/// `EnqueueOptions` and records the enqueue metric. No internal retries:
/// broker failures are surfaced to the caller as-is (§4.8).
pub struct EnqueueClient {
    broker: Arc<dyn QueueBroker>,
    metrics: Arc<dyn MetricsProvider>,
    options: EnqueueOptions,
}

impl EnqueueClient {
    /// Build a client over `broker`, using the default `EnqueueOptions`
    /// (`max_retry = 5`, `retention_hours = 24`) unless `options` overrides them.
    #[must_use]
    pub fn new(broker: Arc<dyn QueueBroker>, metrics: Arc<dyn MetricsProvider>, options: EnqueueOptions) -> Self {
        Self { broker, metrics, options }
    }

    /// Submit `task`, returning the broker's id for it.
    ///
    /// # Errors
    /// Propagates whatever the underlying broker returns; this client adds no retries.
    pub async fn enqueue(&self, task: EvaluateTask) -> Result<BrokerTaskId> {
        let task_id = self.broker.enqueue(task, self.options).await?;
        self.metrics.record_job_enqueued(TASK_TYPE);
        Ok(task_id)
    }
}
