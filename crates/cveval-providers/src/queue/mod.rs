//! Durable queue broker (§4.6, §4.8), backed by NATS JetStream.
//!
//! Grounded on the teacher's `NatsEventBus` connection pattern
//! (`async_nats::connect`/`ConnectOptions`, `Arc<Client>`) but generalized
//! from publish/subscribe into a durable work queue: a JetStream stream with
//! `WorkQueue` retention and a pull consumer with explicit acks, so a task is
//! only removed from the stream once the worker acknowledges it, and is
//! redelivered (up to `max_deliver`) otherwise.

mod enqueue;

use std::time::Duration;

use async_nats::jetstream::consumer::pull::Config as PullConfig;
use async_nats::jetstream::consumer::AckPolicy;
use async_nats::jetstream::stream::{Config as StreamConfig, RetentionPolicy};
use async_nats::jetstream::{self, AckKind};
use async_trait::async_trait;
use cveval_domain::entities::EvaluateTask;
use cveval_domain::error::{Error, Result};
use cveval_domain::ports::queue::{BrokerTaskId, Delivery, EnqueueOptions, QueueBroker};
use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

pub use enqueue::EnqueueClient;

const DEFAULT_STREAM: &str = "CVEVAL_TASKS";
const DEFAULT_SUBJECT: &str = "cveval.tasks.evaluate_job";
const DEFAULT_DURABLE: &str = "cveval-worker";
const ACK_WAIT: Duration = Duration::from_secs(60);

fn persistence_error(operation: &str, err: impl std::fmt::Display) -> Error {
    Error::PersistenceFailed {
        operation: operation.to_owned(),
        message: err.to_string(),
    }
}

/// `QueueBroker` backed by a NATS JetStream work-queue stream.
pub struct NatsQueueBroker {
    jetstream: jetstream::Context,
    consumer: jetstream::consumer::PullConsumer,
    subject: String,
    max_retry: u32,
    pending: DashMap<BrokerTaskId, jetstream::Message>,
}

impl NatsQueueBroker {
    /// Connect to `url` and provision (or reuse) the work-queue stream and
    /// durable pull consumer.
    ///
    /// # Errors
    /// Returns an error if the connection, stream, or consumer cannot be established.
    pub async fn connect(url: &str, max_retry: u32, retention_hours: u32) -> Result<Self> {
        Self::connect_with(url, DEFAULT_STREAM, DEFAULT_SUBJECT, DEFAULT_DURABLE, max_retry, retention_hours).await
    }

    /// Connect with an explicit stream/subject/durable-consumer name, for tests
    /// that need isolated streams per run.
    pub async fn connect_with(
        url: &str,
        stream_name: &str,
        subject: &str,
        durable_name: &str,
        max_retry: u32,
        retention_hours: u32,
    ) -> Result<Self> {
        debug!(url, stream_name, "connecting to NATS JetStream");
        let client = async_nats::connect(url)
            .await
            .map_err(|err| persistence_error("connect", err))?;
        let jetstream = jetstream::new(client);

        let stream = jetstream
            .get_or_create_stream(StreamConfig {
                name: stream_name.to_owned(),
                subjects: vec![subject.to_owned()],
                retention: RetentionPolicy::WorkQueue,
                max_age: Duration::from_secs(u64::from(retention_hours) * 3600),
                ..Default::default()
            })
            .await
            .map_err(|err| persistence_error("create_stream", err))?;

        let consumer = stream
            .get_or_create_consumer(
                durable_name,
                PullConfig {
                    durable_name: Some(durable_name.to_owned()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: ACK_WAIT,
                    max_deliver: i64::from(max_retry),
                    ..Default::default()
                },
            )
            .await
            .map_err(|err| persistence_error("create_consumer", err))?;

        Ok(Self {
            jetstream,
            consumer,
            subject: subject.to_owned(),
            max_retry,
            pending: DashMap::new(),
        })
    }
}

#[async_trait]
impl QueueBroker for NatsQueueBroker {
    async fn enqueue(&self, task: EvaluateTask, _options: EnqueueOptions) -> Result<BrokerTaskId> {
        let payload = serde_json::to_vec(&task).map_err(|err| Error::InvalidPayload {
            message: format!("serializing task: {err}"),
        })?;
        let ack = self
            .jetstream
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|err| persistence_error("enqueue", err))?
            .await
            .map_err(|err| persistence_error("enqueue_ack", err))?;
        Ok(format!("{}-{}", ack.stream, ack.sequence))
    }

    async fn dequeue(&self) -> Result<Option<Delivery>> {
        use futures::StreamExt;

        let mut batch = self
            .consumer
            .fetch()
            .max_messages(1)
            .expires(Duration::from_secs(2))
            .messages()
            .await
            .map_err(|err| persistence_error("dequeue", err))?;

        let Some(next) = batch.next().await else {
            return Ok(None);
        };
        let message = next.map_err(|err| persistence_error("dequeue_message", err))?;

        let task: EvaluateTask = serde_json::from_slice(&message.payload).map_err(|err| Error::InvalidPayload {
            message: format!("decoding task payload: {err}"),
        })?;
        let attempt = message
            .info()
            .map(|info| info.delivered)
            .map_err(|err| persistence_error("message_info", err))?;
        let attempt = u32::try_from(attempt).unwrap_or(u32::MAX);

        let task_id = Uuid::new_v4().to_string();
        self.pending.insert(task_id.clone(), message);

        Ok(Some(Delivery {
            task_id,
            task,
            attempt,
            max_retry: self.max_retry,
        }))
    }

    async fn ack(&self, task_id: &BrokerTaskId) -> Result<()> {
        let Some((_, message)) = self.pending.remove(task_id) else {
            warn!(task_id, "ack for unknown/already-resolved delivery");
            return Ok(());
        };
        message.ack().await.map_err(|err| persistence_error("ack", err))
    }

    async fn nack(&self, task_id: &BrokerTaskId, reason: &str) -> Result<()> {
        let Some((_, message)) = self.pending.remove(task_id) else {
            warn!(task_id, "nack for unknown/already-resolved delivery");
            return Ok(());
        };
        debug!(task_id, reason, "nacking delivery for redelivery");
        message
            .ack_with(AckKind::Nak(None))
            .await
            .map_err(|err| persistence_error("nack", err))
    }
}
