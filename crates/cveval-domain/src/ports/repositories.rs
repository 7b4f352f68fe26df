//! Repository ports (§6): the transactional store is an external
//! collaborator this core only consumes through these contracts.

use async_trait::async_trait;

use crate::entities::{EvaluationResult, Job, JobStatus, Upload};
use crate::error::Result;
use crate::value_objects::JobId;

/// `JobRepository.UpdateStatus(id, status, error?)` (§6).
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Fetch a job by id.
    async fn get(&self, id: &JobId) -> Result<Option<Job>>;

    /// Persist a status transition for the given job.
    async fn update_status(&self, id: &JobId, status: JobStatus) -> Result<()>;
}

/// `UploadRepository.Get(id) → {text}` (§6).
#[async_trait]
pub trait UploadRepository: Send + Sync {
    /// Fetch an upload by id, or `None` if it does not exist.
    async fn get(&self, id: &str) -> Result<Option<Upload>>;
}

/// `ResultRepository.Upsert(result)` idempotent on `job_id` (§6).
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Insert or replace the result for `result.job_id`. Calling this twice
    /// with an equal `result` must be a no-op observable difference (§3:
    /// "re-processing yields the same Result id").
    async fn upsert(&self, result: &EvaluationResult) -> Result<()>;

    /// Fetch the result for a job, if one has been persisted.
    async fn get(&self, job_id: &JobId) -> Result<Option<EvaluationResult>>;
}
