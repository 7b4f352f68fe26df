//! In-memory repository adapters, used by the worker binary's local
//! smoke-test mode in place of a real transactional store. Keyed by
//! `dashmap::DashMap` for the same process-wide concurrent-map pattern used
//! by the resilience registries in `cveval-infrastructure`.

use async_trait::async_trait;
use cveval_domain::entities::{EvaluationResult, Job, JobStatus, Upload};
use cveval_domain::error::Result;
use cveval_domain::ports::{JobRepository, ResultRepository, UploadRepository};
use cveval_domain::value_objects::JobId;
use dashmap::DashMap;

/// In-memory [`JobRepository`], seeded explicitly since there is no ingest
/// pipeline in this workspace to create jobs ahead of a task being enqueued.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: DashMap<JobId, Job>,
}

impl InMemoryJobRepository {
    /// Insert `job`, overwriting any existing entry for its id.
    pub fn seed(&self, job: Job) {
        self.jobs.insert(job.id, job);
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn get(&self, id: &JobId) -> Result<Option<Job>> {
        Ok(self.jobs.get(id).map(|entry| entry.clone()))
    }

    async fn update_status(&self, id: &JobId, status: JobStatus) -> Result<()> {
        if let Some(mut job) = self.jobs.get_mut(id) {
            let _ = job.transition(status);
        }
        Ok(())
    }
}

/// In-memory [`UploadRepository`], seeded explicitly with CV/project text.
#[derive(Default)]
pub struct InMemoryUploadRepository {
    uploads: DashMap<String, Upload>,
}

impl InMemoryUploadRepository {
    /// Insert `upload` under its string id.
    pub fn seed(&self, id: impl Into<String>, upload: Upload) {
        self.uploads.insert(id.into(), upload);
    }
}

#[async_trait]
impl UploadRepository for InMemoryUploadRepository {
    async fn get(&self, id: &str) -> Result<Option<Upload>> {
        Ok(self.uploads.get(id).map(|entry| entry.clone()))
    }
}

/// In-memory [`ResultRepository`], keyed by `job_id` to match the
/// idempotent-upsert contract.
#[derive(Default)]
pub struct InMemoryResultRepository {
    results: DashMap<JobId, EvaluationResult>,
}

#[async_trait]
impl ResultRepository for InMemoryResultRepository {
    async fn upsert(&self, result: &EvaluationResult) -> Result<()> {
        self.results.insert(result.job_id, result.clone());
        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> Result<Option<EvaluationResult>> {
        Ok(self.results.get(job_id).map(|entry| entry.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn job_repository_round_trips_status_updates() {
        let repo = InMemoryJobRepository::default();
        let job = Job::new(JobId::new(), "idem-1");
        let job_id = job.id;
        repo.seed(job);

        repo.update_status(&job_id, JobStatus::Processing).await.expect("update");
        let fetched = repo.get(&job_id).await.expect("get").expect("present");
        assert_eq!(fetched.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn upload_repository_returns_none_for_unknown_id() {
        let repo = InMemoryUploadRepository::default();
        assert!(repo.get("missing").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn result_repository_upsert_is_idempotent_on_job_id() {
        let repo = InMemoryResultRepository::default();
        let job_id = JobId::new();
        let result = EvaluationResult {
            job_id,
            cv_match_rate: 0.7,
            cv_feedback: "solid".to_owned(),
            project_score: 8.0,
            project_feedback: "clean".to_owned(),
            overall_summary: "good fit overall".to_owned(),
            created_at: chrono::Utc::now(),
        };
        repo.upsert(&result).await.expect("first upsert");
        repo.upsert(&result).await.expect("second upsert");
        let fetched = repo.get(&job_id).await.expect("get").expect("present");
        assert!((fetched.project_score - 8.0).abs() < f64::EPSILON);
    }
}
