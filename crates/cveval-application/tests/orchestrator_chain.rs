//! End-to-end chain tests against in-memory fakes for every port.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cveval_application::orchestrator::{ChainOrchestrator, EvaluationPlan};
use cveval_application::retrieval::RagRetriever;
use cveval_domain::entities::{EvaluateTask, EvaluationResult, Job, JobStatus, Upload};
use cveval_domain::error::{Error, Result};
use cveval_domain::ports::metrics::Labels;
use cveval_domain::ports::providers::{ChatMessage, Embedding, VectorSearchHit};
use cveval_domain::ports::{
    EmbeddingProvider, JobRepository, LlmProvider, MetricsProvider, ResultRepository,
    UploadRepository, VectorStoreProvider,
};
use cveval_domain::value_objects::JobId;

const HAPPY_PATH_JSON: &str = r#"{"cv_match_rate":0.8,"cv_feedback":"Strong fit.","project_score":8.0,"project_feedback":"Solid work.","overall_summary":"Good candidate. Clear writing. Recommend advancing."}"#;

struct ScriptedLlm {
    responses: Mutex<Vec<Result<String>>>,
}

impl ScriptedLlm {
    fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }

    /// Always return `HAPPY_PATH_JSON`, regardless of `text` (kept for call-site clarity).
    fn always(text: &'static str) -> Self {
        Self {
            responses: Mutex::new(vec![Ok(text.to_owned())]),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(HAPPY_PATH_JSON.to_owned());
        }
        responses.remove(0)
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

struct NoOpEmbeddings;

#[async_trait]
impl EmbeddingProvider for NoOpEmbeddings {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|_| vec![0.1_f32, 0.2, 0.3]).collect())
    }

    fn dimensions(&self) -> usize {
        3
    }

    fn provider_name(&self) -> &str {
        "noop"
    }
}

struct EmptyVectorStore;

#[async_trait]
impl VectorStoreProvider for EmptyVectorStore {
    async fn search(&self, _collection: &str, _vector: &[f32], _limit: usize) -> Result<Vec<VectorSearchHit>> {
        Ok(Vec::new())
    }

    fn provider_name(&self) -> &str {
        "noop"
    }
}

#[derive(Default)]
struct InMemoryJobs {
    jobs: Mutex<std::collections::HashMap<JobId, Job>>,
}

impl InMemoryJobs {
    fn seed(&self, job: Job) {
        self.jobs.lock().unwrap().insert(job.id, job);
    }
}

#[async_trait]
impl JobRepository for InMemoryJobs {
    async fn get(&self, id: &JobId) -> Result<Option<Job>> {
        Ok(self.jobs.lock().unwrap().get(id).cloned())
    }

    async fn update_status(&self, id: &JobId, status: JobStatus) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(id) {
            let _ = job.transition(status);
        }
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryUploads {
    uploads: std::collections::HashMap<String, Upload>,
}

impl InMemoryUploads {
    fn with(mut self, id: &str, text: &str) -> Self {
        self.uploads.insert(
            id.to_owned(),
            Upload::new(
                cveval_domain::value_objects::UploadId::new(id.to_owned()),
                "file.txt",
                text,
            ),
        );
        self
    }
}

#[async_trait]
impl UploadRepository for InMemoryUploads {
    async fn get(&self, id: &str) -> Result<Option<Upload>> {
        Ok(self.uploads.get(id).cloned())
    }
}

#[derive(Default)]
struct InMemoryResults {
    results: Mutex<std::collections::HashMap<JobId, EvaluationResult>>,
}

#[async_trait]
impl ResultRepository for InMemoryResults {
    async fn upsert(&self, result: &EvaluationResult) -> Result<()> {
        self.results.lock().unwrap().insert(result.job_id, result.clone());
        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> Result<Option<EvaluationResult>> {
        Ok(self.results.lock().unwrap().get(job_id).cloned())
    }
}

#[derive(Default)]
struct NoOpMetrics {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl MetricsProvider for NoOpMetrics {
    fn increment(&self, _name: &str, _labels: &Labels<'_>) {}
    fn gauge(&self, _name: &str, _value: f64, _labels: &Labels<'_>) {}
    fn histogram(&self, _name: &str, _value: f64, _labels: &Labels<'_>) {}

    fn record_job_completed(&self, _job_type: &str) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn record_job_failed(&self, _job_type: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

fn sample_task(job_id: JobId) -> EvaluateTask {
    EvaluateTask {
        job_id,
        cv_id: "cv-1".to_owned(),
        project_id: "proj-1".to_owned(),
        job_description: "Senior Rust Engineer with async experience".to_owned(),
        study_case_brief: "Build a retry-aware evaluation worker".to_owned(),
        scoring_rubric: "Weigh correctness and resilience heavily".to_owned(),
    }
}

#[tokio::test]
async fn direct_plan_persists_result_and_completes_job() {
    let job_id = JobId::new();
    let jobs = Arc::new(InMemoryJobs::default());
    jobs.seed(Job::new(job_id, "idem-1"));
    let uploads = Arc::new(InMemoryUploads::default().with("cv-1", "cv text").with("proj-1", "project text"));
    let results = Arc::new(InMemoryResults::default());
    let metrics = Arc::new(NoOpMetrics::default());
    let retriever = Arc::new(RagRetriever::new(
        Arc::new(NoOpEmbeddings),
        Arc::new(EmptyVectorStore),
        metrics.clone(),
        6,
    ));
    let llm = Arc::new(ScriptedLlm::always(HAPPY_PATH_JSON));

    let orchestrator = ChainOrchestrator::new(
        llm,
        uploads,
        jobs.clone(),
        results.clone(),
        retriever,
        metrics.clone(),
        EvaluationPlan::Direct,
    );

    orchestrator
        .run(sample_task(job_id), 0)
        .await
        .expect("direct plan succeeds");

    let job = jobs.get(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    let result = results.get(&job_id).await.unwrap().expect("result persisted");
    assert!((result.cv_match_rate - 0.8).abs() < 1e-9);
    assert_eq!(metrics.completed.load(Ordering::SeqCst), 1);
    assert_eq!(metrics.failed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn schema_errors_retry_then_succeed() {
    let job_id = JobId::new();
    let jobs = Arc::new(InMemoryJobs::default());
    jobs.seed(Job::new(job_id, "idem-2"));
    let uploads = Arc::new(InMemoryUploads::default().with("cv-1", "cv text").with("proj-1", "project text"));
    let results = Arc::new(InMemoryResults::default());
    let metrics = Arc::new(NoOpMetrics::default());
    let retriever = Arc::new(RagRetriever::new(
        Arc::new(NoOpEmbeddings),
        Arc::new(EmptyVectorStore),
        metrics.clone(),
        6,
    ));
    let llm = Arc::new(ScriptedLlm::new(vec![
        Ok("not json at all".to_owned()),
        Ok(HAPPY_PATH_JSON.to_owned()),
    ]));

    let orchestrator = ChainOrchestrator::new(
        llm,
        uploads,
        jobs.clone(),
        results.clone(),
        retriever,
        metrics.clone(),
        EvaluationPlan::Direct,
    );

    orchestrator
        .run(sample_task(job_id), 0)
        .await
        .expect("succeeds on second attempt");

    let job = jobs.get(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn fatal_error_fails_job_without_persisting_a_result() {
    let job_id = JobId::new();
    let jobs = Arc::new(InMemoryJobs::default());
    jobs.seed(Job::new(job_id, "idem-3"));
    let uploads = Arc::new(InMemoryUploads::default());
    let results = Arc::new(InMemoryResults::default());
    let metrics = Arc::new(NoOpMetrics::default());
    let retriever = Arc::new(RagRetriever::new(
        Arc::new(NoOpEmbeddings),
        Arc::new(EmptyVectorStore),
        metrics.clone(),
        6,
    ));
    let llm = Arc::new(ScriptedLlm::always(HAPPY_PATH_JSON));

    let orchestrator = ChainOrchestrator::new(
        llm,
        uploads,
        jobs.clone(),
        results.clone(),
        retriever,
        metrics.clone(),
        EvaluationPlan::Direct,
    );

    let outcome = orchestrator.run(sample_task(job_id), 0).await;
    assert!(outcome.is_err());
    assert_eq!(outcome.unwrap_err().kind(), cveval_domain::ErrorKind::UploadMissing);

    let job = jobs.get(&job_id).await.unwrap().unwrap();
    assert!(matches!(job.status, JobStatus::Failed(_)));
    assert!(results.get(&job_id).await.unwrap().is_none());
    assert_eq!(metrics.failed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn chained_plan_falls_back_to_direct_prompt_when_extraction_fails() {
    let job_id = JobId::new();
    let jobs = Arc::new(InMemoryJobs::default());
    jobs.seed(Job::new(job_id, "idem-4"));
    let uploads = Arc::new(InMemoryUploads::default().with("cv-1", "cv text").with("proj-1", "project text"));
    let results = Arc::new(InMemoryResults::default());
    let metrics = Arc::new(NoOpMetrics::default());
    let retriever = Arc::new(RagRetriever::new(
        Arc::new(NoOpEmbeddings),
        Arc::new(EmptyVectorStore),
        metrics.clone(),
        6,
    ));
    // Extract calls return garbage (fail to parse); final evaluate call succeeds.
    let llm = Arc::new(ScriptedLlm::new(vec![
        Ok("garbage".to_owned()),
        Ok("garbage".to_owned()),
        Ok(HAPPY_PATH_JSON.to_owned()),
    ]));

    let orchestrator = ChainOrchestrator::new(
        llm,
        uploads,
        jobs.clone(),
        results.clone(),
        retriever,
        metrics.clone(),
        EvaluationPlan::Chained,
    );

    orchestrator
        .run(sample_task(job_id), 0)
        .await
        .expect("falls back to direct prompt and still succeeds");

    let job = jobs.get(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn chained_plan_runs_refinement_when_both_extracts_succeed() {
    let job_id = JobId::new();
    let jobs = Arc::new(InMemoryJobs::default());
    jobs.seed(Job::new(job_id, "idem-6"));
    let uploads = Arc::new(InMemoryUploads::default().with("cv-1", "cv text").with("proj-1", "project text"));
    let results = Arc::new(InMemoryResults::default());
    let metrics = Arc::new(NoOpMetrics::default());
    let retriever = Arc::new(RagRetriever::new(
        Arc::new(NoOpEmbeddings),
        Arc::new(EmptyVectorStore),
        metrics.clone(),
        6,
    ));
    // In call order: CV extract, project extract, CV sub-evaluation,
    // project sub-evaluation, refinement.
    let llm = Arc::new(ScriptedLlm::new(vec![
        Ok(r#"{"skills":["rust"],"experiences":["backend"],"projects":["worker"],"summary":"solid"}"#.to_owned()),
        Ok(r#"{"requirements":["retries"],"architecture":["queue"],"strengths":["tests"],"risks":[],"summary":"solid"}"#.to_owned()),
        Ok(r#"{"technical_skills":4,"experience_level":4,"relevant_achievements":3,"cultural_fit":5,"cv_feedback":"Good CV."}"#.to_owned()),
        Ok(r#"{"correctness":5,"code_quality":4,"resilience":3,"documentation":4,"creativity":3,"project_feedback":"Solid project."}"#.to_owned()),
        Ok(r#"{"overall_summary":"Great candidate overall. Strong technical match. Recommend hire."}"#.to_owned()),
    ]));

    let orchestrator = ChainOrchestrator::new(
        llm,
        uploads,
        jobs.clone(),
        results.clone(),
        retriever,
        metrics.clone(),
        EvaluationPlan::Chained,
    );

    orchestrator
        .run(sample_task(job_id), 0)
        .await
        .expect("refinement chain succeeds");

    let job = jobs.get(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    let result = results.get(&job_id).await.unwrap().expect("result persisted");
    assert!((result.cv_match_rate - 0.79).abs() < 1e-9);
    assert!((result.project_score - 8.0).abs() < 1e-9);
    assert_eq!(result.cv_feedback, "Good CV.");
    assert_eq!(result.project_feedback, "Solid project.");
}

#[tokio::test]
async fn broker_retryable_error_leaves_job_processing_for_redelivery() {
    let job_id = JobId::new();
    let jobs = Arc::new(InMemoryJobs::default());
    jobs.seed(Job::new(job_id, "idem-5"));
    let uploads = Arc::new(InMemoryUploads::default().with("cv-1", "cv text").with("proj-1", "project text"));
    let results = Arc::new(InMemoryResults::default());
    let metrics = Arc::new(NoOpMetrics::default());
    let retriever = Arc::new(RagRetriever::new(
        Arc::new(NoOpEmbeddings),
        Arc::new(EmptyVectorStore),
        metrics.clone(),
        6,
    ));
    let llm = Arc::new(ScriptedLlm::new(vec![Err(Error::LlmTransport {
        operation: "evaluate".to_owned(),
        message: "connection reset".to_owned(),
    })]));

    let orchestrator = ChainOrchestrator::new(
        llm,
        uploads,
        jobs.clone(),
        results.clone(),
        retriever,
        metrics.clone(),
        EvaluationPlan::Direct,
    );

    let outcome = orchestrator.run(sample_task(job_id), 0).await;
    assert!(matches!(outcome, Err(Error::LlmTransport { .. })));

    // The orchestrator itself never fails the job for a broker-retryable
    // error; that decision belongs to the worker runtime once redelivery
    // attempts are exhausted.
    let job = jobs.get(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(metrics.failed.load(Ordering::SeqCst), 0);
}
