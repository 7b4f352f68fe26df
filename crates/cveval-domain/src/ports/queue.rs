//! Durable queue port (§4.8, §6): the broker itself is an external
//! collaborator; this is the narrow contract the enqueue client and the
//! worker runtime consume.

use async_trait::async_trait;

use crate::entities::EvaluateTask;
use crate::error::Result;

/// Broker-assigned identifier for one enqueued task.
pub type BrokerTaskId = String;

/// Delivery envelope handed to the worker runtime on dequeue.
///
/// Carries the broker's redelivery bookkeeping so the worker can decide
/// whether a `broker_retryable` error should be acknowledged (exhausted) or
/// left for redelivery.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// The broker's id for this task instance.
    pub task_id: BrokerTaskId,
    /// The decoded task payload.
    pub task: EvaluateTask,
    /// How many times this task has already been attempted (including this one).
    pub attempt: u32,
    /// The broker's configured maximum attempts for this task type.
    pub max_retry: u32,
}

impl Delivery {
    /// True once `attempt` has reached `max_retry`: no further redelivery
    /// will occur, so a broker-retryable error here must still fail the job.
    #[must_use]
    pub fn attempts_exhausted(&self) -> bool {
        self.attempt >= self.max_retry
    }
}

/// Options controlling how a task is enqueued (§6: `MaxRetry=5`, `Retention=24h`).
#[derive(Debug, Clone, Copy)]
pub struct EnqueueOptions {
    /// Maximum broker-level delivery attempts.
    pub max_retry: u32,
    /// How long a completed/dead task record is retained, in hours.
    pub retention_hours: u32,
}

impl Default for EnqueueOptions {
    fn default() -> Self {
        Self {
            max_retry: 5,
            retention_hours: 24,
        }
    }
}

/// Durable queue/broker port consumed by both the enqueue client and the
/// worker runtime.
#[async_trait]
pub trait QueueBroker: Send + Sync {
    /// Submit a task for asynchronous processing, returning the broker's id.
    async fn enqueue(&self, task: EvaluateTask, options: EnqueueOptions) -> Result<BrokerTaskId>;

    /// Pull the next available delivery, if any is ready.
    ///
    /// Returns `None` when no task is currently available (the caller
    /// should back off briefly and poll again), not an error.
    async fn dequeue(&self) -> Result<Option<Delivery>>;

    /// Acknowledge successful processing of a delivery, removing it from
    /// the in-flight set permanently.
    async fn ack(&self, task_id: &BrokerTaskId) -> Result<()>;

    /// Report a failed processing attempt; the broker decides whether to
    /// redeliver (attempt < max_retry) or move the task to a dead letter.
    async fn nack(&self, task_id: &BrokerTaskId, reason: &str) -> Result<()>;
}
