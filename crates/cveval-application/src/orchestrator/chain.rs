//! Chain Orchestrator (§4.4): drives a single task through the
//! extract/retrieve/evaluate/normalize/persist state machine.

use std::sync::Arc;
use std::time::Duration;

use cveval_domain::entities::{CvExtract, EvaluationResult, JobStatus, ProjectExtract, RubricScores};
use cveval_domain::error::{Error, ErrorKind, Result};
use cveval_domain::ports::{JobRepository, LlmProvider, MetricsProvider, ResultRepository, UploadRepository};

use crate::clamp::{
    parse_and_normalize, parse_cv_sub_evaluation, parse_json_object, parse_project_sub_evaluation,
    parse_refinement_summary,
};
use crate::prompt::{
    build_cot_cleanup_prompt, build_cv_extract_prompt, build_cv_sub_evaluation_prompt,
    build_evaluate_from_extracts_prompt, build_evaluate_prompt, build_evaluate_with_context_prompt,
    build_normalization_prompt, build_project_extract_prompt, build_project_sub_evaluation_prompt,
    build_refinement_prompt, PromptPair,
};
use crate::retrieval::RagRetriever;

use super::plan::EvaluationPlan;
use super::stage::Stage;

const MAX_SCHEMA_RETRIES: u32 = 3;
const TASK_TYPE: &str = "evaluate_job";

/// Drives one [`cveval_domain::entities::EvaluateTask`] through the chain.
pub struct ChainOrchestrator {
    llm: Arc<dyn LlmProvider>,
    uploads: Arc<dyn UploadRepository>,
    jobs: Arc<dyn JobRepository>,
    results: Arc<dyn ResultRepository>,
    retriever: Arc<RagRetriever>,
    metrics: Arc<dyn MetricsProvider>,
    plan: EvaluationPlan,
}

impl ChainOrchestrator {
    /// Build an orchestrator driven by the given plan and collaborators.
    #[must_use]
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        uploads: Arc<dyn UploadRepository>,
        jobs: Arc<dyn JobRepository>,
        results: Arc<dyn ResultRepository>,
        retriever: Arc<RagRetriever>,
        metrics: Arc<dyn MetricsProvider>,
        plan: EvaluationPlan,
    ) -> Self {
        Self {
            llm,
            uploads,
            jobs,
            results,
            retriever,
            metrics,
            plan,
        }
    }

    /// Run the full chain for `task`, leaving the job `completed` or `failed`.
    ///
    /// The orchestrator never mutates the `Result` partially: either every
    /// field below is written and the job transitions to `completed`, or
    /// the job transitions to `failed` and no `Result` is persisted.
    #[tracing::instrument(skip(self, task), fields(job_id = %task.job_id, attempt, chain = self.plan.is_chained(), two_pass = self.plan.is_two_pass()))]
    pub async fn run(&self, task: cveval_domain::entities::EvaluateTask, attempt: u32) -> Result<()> {
        if let Err(err) = self.jobs.update_status(&task.job_id, JobStatus::Processing).await {
            return self.fail(&task.job_id, err).await;
        }
        tracing::debug!(stage = %Stage::Loaded, "task loaded");

        let run_result = self.run_inner(&task).await;
        match run_result {
            Ok(()) => Ok(()),
            // Broker-retryable errors (transport/availability) are surfaced
            // as-is: the job is left `processing` so a redelivered attempt
            // can still complete it. Only the worker runtime, once broker
            // retries are exhausted, marks the job permanently `failed`.
            Err(err) if err.kind().is_broker_retryable() => Err(err),
            Err(err) => self.fail(&task.job_id, err).await,
        }
    }

    async fn run_inner(&self, task: &cveval_domain::entities::EvaluateTask) -> Result<()> {
        let cv_text = self.load_upload(&task.cv_id).await?;
        let project_text = self.load_upload(&task.project_id).await?;

        let mut result = self.evaluate_first_pass(task, &cv_text, &project_text).await?;
        tracing::debug!(stage = %Stage::Evaluated, "first pass evaluated");

        if self.plan.is_two_pass() {
            result = self.normalize_pass(result).await;
            tracing::debug!(stage = %Stage::Normalized, "normalization pass complete");
        }

        self.results.upsert(&result).await.map_err(|err| match err {
            Error::PersistenceFailed { operation, message } => {
                Error::PersistenceFailed { operation, message }
            }
            other => Error::PersistenceFailed {
                operation: "result_upsert".to_owned(),
                message: other.to_string(),
            },
        })?;
        tracing::debug!(stage = %Stage::Persisted, "result persisted");

        self.jobs
            .update_status(&task.job_id, JobStatus::Completed)
            .await?;
        tracing::debug!(stage = %Stage::Done, "job completed");

        self.metrics.record_job_completed(TASK_TYPE);
        self.metrics.record_cv_match_rate(result.cv_match_rate);
        self.metrics.record_project_score(result.project_score);
        Ok(())
    }

    async fn load_upload(&self, upload_id: &str) -> Result<String> {
        let upload = self
            .uploads
            .get(upload_id)
            .await?
            .ok_or_else(|| Error::UploadMissing {
                upload_id: upload_id.to_owned(),
            })?;
        Ok(upload.text)
    }

    /// Run the chain's first scoring pass, producing a clamped result
    /// either via the generic evaluate-prompt-then-parse path or, when both
    /// extracts succeed, via the refinement sub-chain (§4.4).
    async fn evaluate_first_pass(
        &self,
        task: &cveval_domain::entities::EvaluateTask,
        cv_text: &str,
        project_text: &str,
    ) -> Result<EvaluationResult> {
        if !self.plan.is_chained() {
            let prompt = build_evaluate_prompt(
                &task.job_description,
                &task.study_case_brief,
                cv_text,
                project_text,
            );
            tracing::debug!(stage = %Stage::PromptsReady, "prompt ready");
            return self.evaluate_with_retry(&task.job_id, prompt).await;
        }

        let cv_extract = self.try_extract_cv(cv_text).await;
        let project_extract = self.try_extract_project(project_text).await;

        let context = self
            .retriever
            .retrieve(&task.job_description, &task.study_case_brief)
            .await;
        let has_context = !context.job_description.is_empty() || !context.scoring_rubric.is_empty();

        match (cv_extract, project_extract) {
            (Some(cv), Some(project)) => {
                match self
                    .run_refinement(&task.job_id, &task.job_description, &cv, &project)
                    .await
                {
                    Ok(result) => Ok(result),
                    Err(err) => {
                        tracing::warn!(error = %err, "refinement chain failed, falling back to evaluate-from-extracts");
                        let prompt = build_evaluate_from_extracts_prompt(
                            &task.job_description,
                            &cv,
                            &project,
                            &context.job_description,
                            &context.scoring_rubric,
                        );
                        tracing::debug!(stage = %Stage::PromptsReady, "prompt ready");
                        self.evaluate_with_retry(&task.job_id, prompt).await
                    }
                }
            }
            _ if has_context => {
                let prompt = build_evaluate_with_context_prompt(
                    &task.job_description,
                    &task.study_case_brief,
                    cv_text,
                    project_text,
                    &context.job_description,
                    &context.scoring_rubric,
                );
                tracing::debug!(stage = %Stage::PromptsReady, "prompt ready");
                self.evaluate_with_retry(&task.job_id, prompt).await
            }
            _ => {
                let prompt = build_evaluate_prompt(
                    &task.job_description,
                    &task.study_case_brief,
                    cv_text,
                    project_text,
                );
                tracing::debug!(stage = %Stage::PromptsReady, "prompt ready");
                self.evaluate_with_retry(&task.job_id, prompt).await
            }
        }
    }

    /// Refinement chain step (§4.4): score the CV and project extracts
    /// separately, then merge their feedback into one narrative. The two
    /// weighted headline numbers are computed deterministically from the
    /// sub-scores via [`RubricScores`] (§8) rather than trusted from any
    /// single LLM response.
    async fn run_refinement(
        &self,
        job_id: &cveval_domain::value_objects::JobId,
        job_description: &str,
        cv_extract: &CvExtract,
        project_extract: &ProjectExtract,
    ) -> Result<EvaluationResult> {
        let cv_prompt = build_cv_sub_evaluation_prompt(job_description, cv_extract);
        let cv_raw = self.llm.complete(&cv_prompt.into_messages()).await?;
        let cv_sub_eval = parse_cv_sub_evaluation(&cv_raw)?;

        let project_prompt = build_project_sub_evaluation_prompt(project_extract);
        let project_raw = self.llm.complete(&project_prompt.into_messages()).await?;
        let project_sub_eval = parse_project_sub_evaluation(&project_raw)?;

        let rubric = RubricScores::from_sub_evaluations(&cv_sub_eval, &project_sub_eval);

        let cv_sub_eval_json = serde_json::to_string(&cv_sub_eval).unwrap_or_default();
        let project_sub_eval_json = serde_json::to_string(&project_sub_eval).unwrap_or_default();
        let refinement_prompt = build_refinement_prompt(&cv_sub_eval_json, &project_sub_eval_json);
        let refinement_raw = self.llm.complete(&refinement_prompt.into_messages()).await?;
        let overall_summary = parse_refinement_summary(&refinement_raw)?;

        Ok(EvaluationResult {
            job_id: *job_id,
            cv_match_rate: rubric.cv_match_rate(),
            cv_feedback: cv_sub_eval.cv_feedback,
            project_score: rubric.project_score(),
            project_feedback: project_sub_eval.project_feedback,
            overall_summary,
            created_at: chrono::Utc::now(),
        })
    }

    async fn try_extract_cv(&self, cv_text: &str) -> Option<CvExtract> {
        let prompt = build_cv_extract_prompt(cv_text);
        let raw = self.llm.complete(&prompt.into_messages()).await.ok()?;
        match parse_json_object::<CvExtract>(&raw) {
            Ok(extract) => Some(extract),
            Err(err) => {
                tracing::warn!(error = %err, "cv extract failed, falling back to non-chained path");
                None
            }
        }
    }

    async fn try_extract_project(&self, project_text: &str) -> Option<ProjectExtract> {
        let prompt = build_project_extract_prompt(project_text);
        let raw = self.llm.complete(&prompt.into_messages()).await.ok()?;
        match parse_json_object::<ProjectExtract>(&raw) {
            Ok(extract) => Some(extract),
            Err(err) => {
                tracing::warn!(error = %err, "project extract failed, falling back to non-chained path");
                None
            }
        }
    }

    /// Parse & normalize with bounded schema retry, plus a single CoT-cleanup
    /// attempt, per §4.4 step 5/7.
    async fn evaluate_with_retry(
        &self,
        job_id: &cveval_domain::value_objects::JobId,
        prompt: PromptPair,
    ) -> Result<EvaluationResult> {
        let mut cleaned_once = false;
        let mut last_err: Option<Error> = None;

        for attempt in 0..MAX_SCHEMA_RETRIES {
            let messages = prompt.clone().with_retry_reminder(attempt).into_messages();
            let raw = self.llm.complete(&messages).await?;

            match parse_and_normalize(*job_id, &raw) {
                Ok(result) => return Ok(result),
                Err(err) if err.kind() == ErrorKind::LlmCotLeak && !cleaned_once => {
                    cleaned_once = true;
                    let cleanup_prompt = build_cot_cleanup_prompt(&raw);
                    let cleaned_raw = self.llm.complete(&cleanup_prompt.into_messages()).await?;
                    match parse_and_normalize(*job_id, &cleaned_raw) {
                        Ok(result) => return Ok(result),
                        Err(still_leaking) => return Err(still_leaking),
                    }
                }
                Err(err) if err.kind().is_task_retryable() => {
                    last_err = Some(err);
                    if attempt + 1 < MAX_SCHEMA_RETRIES {
                        let backoff_ms = 200 * u64::from(attempt + 1);
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_err.unwrap_or(Error::SchemaInvalid {
            message: "exhausted schema retries".to_owned(),
        }))
    }

    /// Optional normalization pass (§4.4 step 6): on parse failure, log and
    /// keep the first-pass result rather than failing the task.
    async fn normalize_pass(&self, first_pass: EvaluationResult) -> EvaluationResult {
        let first_pass_json = match serde_json::to_string(&first_pass) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize first-pass result, skipping normalization");
                return first_pass;
            }
        };
        let prompt = build_normalization_prompt(&first_pass_json);
        let raw = match self.llm.complete(&prompt.into_messages()).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "normalization pass call failed, keeping first pass");
                return first_pass;
            }
        };
        match parse_and_normalize(first_pass.job_id, &raw) {
            Ok(normalized) => normalized,
            Err(err) => {
                tracing::warn!(error = %err, "normalization pass parse failed, keeping first pass");
                first_pass
            }
        }
    }

    async fn fail(&self, job_id: &cveval_domain::value_objects::JobId, err: Error) -> Result<()> {
        self.fail_permanently(job_id, &err).await;
        Err(err)
    }

    /// Mark `job_id` permanently `failed` with `err`'s kind as the recorded
    /// reason, and record the failure metric.
    ///
    /// Exposed so the worker runtime can call this once broker-level
    /// redelivery for a broker-retryable error has been exhausted — the
    /// orchestrator itself never fails a job for a broker-retryable error on
    /// the first attempt (see [`Self::run`]).
    pub async fn fail_permanently(&self, job_id: &cveval_domain::value_objects::JobId, err: &Error) {
        let _ = self
            .jobs
            .update_status(job_id, JobStatus::Failed(err.kind().to_string()))
            .await;
        self.metrics.record_job_failed(TASK_TYPE);
    }
}
