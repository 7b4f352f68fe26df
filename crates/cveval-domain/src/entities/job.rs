//! The `Job` entity and its lifecycle.

use serde::{Deserialize, Serialize};

use crate::value_objects::JobId;

/// Lifecycle status of a [`Job`].
///
/// A job never regresses from a terminal state
/// (`Completed` or `Failed`) — see [`JobStatus::is_terminal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Enqueued, not yet picked up by a worker.
    Queued,
    /// Currently being processed by the orchestrator.
    Processing,
    /// Finished successfully; a `Result` exists for this job.
    Completed,
    /// Finished with an error; no partial `Result` exists.
    Failed(String),
}

impl JobStatus {
    /// Terminal states cannot be re-entered by another transition.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }

    /// Returns the recorded error message, if this status is `Failed`.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

/// A candidate evaluation job tracked end to end by the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier.
    pub id: JobId,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Idempotency key supplied at ingest time; re-submission with the same
    /// key must not create a second job.
    pub idempotency_key: String,
    /// When the job was created (UTC).
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// When the job last changed status (UTC).
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Job {
    /// Create a freshly queued job.
    #[must_use]
    pub fn new(id: JobId, idempotency_key: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            status: JobStatus::Queued,
            idempotency_key: idempotency_key.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Attempt to move to a new status, refusing to leave a terminal state.
    ///
    /// Returns `false` (and leaves `self` unchanged) if the job is already
    /// terminal — enforcing the "never regresses from a terminal state"
    /// invariant at the single point where status is mutated.
    #[must_use]
    pub fn transition(&mut self, next: JobStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = next;
        self.updated_at = chrono::Utc::now();
        true
    }
}
