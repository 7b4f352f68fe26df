//! Worker Runtime (§4.6): dequeues tasks from a durable broker and drives
//! the chain orchestrator, translating its outcome into broker
//! acknowledgement/redelivery decisions. Grounded on the teacher's
//! `operations_daemon`/worker-pool pattern (bounded concurrency via a
//! semaphore, graceful shutdown via a cancellation token).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cveval_application::orchestrator::ChainOrchestrator;
use cveval_domain::entities::TASK_TYPE;
use cveval_domain::ports::queue::Delivery;
use cveval_domain::ports::{MetricsProvider, QueueBroker};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// How long to sleep after an empty dequeue or a broker error before polling again.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Drives the dequeue → orchestrate → ack/nack loop at bounded concurrency.
pub struct WorkerRuntime {
    broker: Arc<dyn QueueBroker>,
    orchestrator: Arc<ChainOrchestrator>,
    metrics: Arc<dyn MetricsProvider>,
    concurrency: usize,
    shutdown: CancellationToken,
    in_flight: Arc<AtomicUsize>,
}

impl WorkerRuntime {
    /// Build a runtime with the given concurrency and collaborators.
    #[must_use]
    pub fn new(
        broker: Arc<dyn QueueBroker>,
        orchestrator: Arc<ChainOrchestrator>,
        metrics: Arc<dyn MetricsProvider>,
        concurrency: usize,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            broker,
            orchestrator,
            metrics,
            concurrency,
            shutdown,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A token the caller can cancel (e.g. on `SIGINT`) to stop the loop
    /// once every in-flight task has drained.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the dequeue loop until cancelled. Returns once every spawned
    /// delivery has been awaited, so no job is left `processing` after
    /// shutdown (§8: "no job remains processing after worker shutdown").
    pub async fn run(&self) {
        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let mut in_flight_tasks = tokio::task::JoinSet::new();

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let permit = tokio::select! {
                () = self.shutdown.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => permit,
            };
            let Ok(permit) = permit else {
                break;
            };

            match self.broker.dequeue().await {
                Ok(Some(delivery)) => {
                    self.in_flight.fetch_add(1, Ordering::SeqCst);
                    self.metrics
                        .set_jobs_processing(TASK_TYPE, self.in_flight.load(Ordering::SeqCst) as f64);

                    let broker = self.broker.clone();
                    let orchestrator = self.orchestrator.clone();
                    let metrics = self.metrics.clone();
                    let in_flight = self.in_flight.clone();

                    in_flight_tasks.spawn(async move {
                        Self::handle_delivery(&orchestrator, &broker, delivery).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        metrics.set_jobs_processing(TASK_TYPE, in_flight.load(Ordering::SeqCst) as f64);
                        drop(permit);
                    });
                }
                Ok(None) => {
                    drop(permit);
                    tokio::time::sleep(IDLE_POLL_INTERVAL).await;
                }
                Err(err) => {
                    drop(permit);
                    tracing::error!(error = %err, "broker dequeue failed");
                    tokio::time::sleep(IDLE_POLL_INTERVAL).await;
                }
            }
        }

        while in_flight_tasks.join_next().await.is_some() {}
    }

    /// Run one delivery to completion and ack/nack accordingly (§4.6, §7).
    async fn handle_delivery(orchestrator: &ChainOrchestrator, broker: &Arc<dyn QueueBroker>, delivery: Delivery) {
        let outcome = orchestrator.run(delivery.task.clone(), delivery.attempt).await;
        match outcome {
            Ok(()) => {
                let _ = broker.ack(&delivery.task_id).await;
            }
            Err(err) if err.kind().is_broker_retryable() && !delivery.attempts_exhausted() => {
                let _ = broker.nack(&delivery.task_id, &err.kind().to_string()).await;
            }
            Err(err) if err.kind().is_broker_retryable() => {
                // Broker-level redelivery is exhausted: the orchestrator left the
                // job `processing` on every prior attempt, so this is the one
                // place that finally marks it permanently `failed`.
                orchestrator.fail_permanently(&delivery.task.job_id, &err).await;
                let _ = broker.ack(&delivery.task_id).await;
            }
            Err(_) => {
                // The orchestrator already transitioned the job to `failed`
                // itself (fatal error, or exhausted in-task schema retries).
                let _ = broker.ack(&delivery.task_id).await;
            }
        }
    }
}
