//! Prompt Builder (§4.2): five deterministic prompt families.

use cveval_domain::entities::{CvExtract, ProjectExtract, RetrievedChunk};
use cveval_domain::ports::ChatMessage;

use super::limits::{
    BODY_CEILING_CHAIN, BODY_CEILING_SINGLE_SHOT, CHUNK_CEILING, JOB_DESCRIPTION_CEILING_CHAIN,
    JOB_DESCRIPTION_CEILING_SINGLE_SHOT, JSON_ONLY_INSTRUCTION, MAX_CONTEXT_CHUNKS,
    RETRY_REMINDER,
};
use crate::clamp::sentences::truncate_with_ellipsis;

fn truncated(text: &str, ceiling: usize) -> String {
    truncate_with_ellipsis(text, ceiling)
}

fn render_context_section(chunks: &[RetrievedChunk]) -> String {
    if chunks.is_empty() {
        return "(no retrieved context available)".to_owned();
    }
    chunks
        .iter()
        .take(MAX_CONTEXT_CHUNKS)
        .enumerate()
        .map(|(index, chunk)| {
            format!(
                "[{}] {}",
                index + 1,
                truncated(&chunk.text, CHUNK_CEILING)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A ready-to-send system/user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    /// The system message.
    pub system: String,
    /// The user message.
    pub user: String,
}

impl PromptPair {
    fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Render as a `ChatMessage` pair, ready for [`cveval_domain::ports::LlmProvider::complete`].
    #[must_use]
    pub fn into_messages(self) -> Vec<ChatMessage> {
        vec![ChatMessage::system(self.system), ChatMessage::user(self.user)]
    }

    /// Append the strengthened retry reminder (§4.4 step 5) to the system message.
    #[must_use]
    pub fn with_retry_reminder(mut self, attempt: u32) -> Self {
        if attempt > 0 {
            self.system = format!("{}\n\n{}", self.system, RETRY_REMINDER);
        }
        self
    }
}

const EVALUATE_SCHEMA: &str = r#"{"cv_match_rate": number, "cv_feedback": string, "project_score": number, "project_feedback": string, "overall_summary": string}"#;

/// **System/User evaluate** (single-shot).
#[must_use]
pub fn build_evaluate_prompt(
    job_description: &str,
    study_case_brief: &str,
    cv_text: &str,
    project_text: &str,
) -> PromptPair {
    let system = format!(
        "You are an expert technical recruiter evaluating a candidate's CV and project \
         report against a job description. Respond with JSON matching exactly this shape: \
         {EVALUATE_SCHEMA}. {JSON_ONLY_INSTRUCTION}"
    );
    let user = format!(
        "Job description:\n{}\n\nStudy case brief:\n{}\n\nCandidate CV:\n{}\n\nProject report:\n{}",
        truncated(job_description, JOB_DESCRIPTION_CEILING_SINGLE_SHOT),
        truncated(study_case_brief, JOB_DESCRIPTION_CEILING_SINGLE_SHOT),
        truncated(cv_text, BODY_CEILING_SINGLE_SHOT),
        truncated(project_text, BODY_CEILING_SINGLE_SHOT),
    );
    PromptPair::new(system, user)
}

/// **Normalization** (second pass): re-emit clamped JSON only.
#[must_use]
pub fn build_normalization_prompt(first_pass_json: &str) -> PromptPair {
    let system = format!(
        "You re-emit a JSON evaluation object after normalizing it to the exact shape \
         {EVALUATE_SCHEMA}, clamping cv_match_rate to [0,1] and project_score to [1,10], \
         and trimming feedback fields to 1-3 sentences and the summary to 3-5 sentences. \
         {JSON_ONLY_INSTRUCTION}"
    );
    let user = format!("First-pass evaluation JSON:\n{first_pass_json}");
    PromptPair::new(system, user)
}

const CV_EXTRACT_SCHEMA: &str =
    r#"{"skills": [string], "experiences": [string], "projects": [string], "summary": string}"#;

/// **CV extract** (chain step 1).
#[must_use]
pub fn build_cv_extract_prompt(cv_text: &str) -> PromptPair {
    let system = format!(
        "You extract structured information from a candidate CV. Respond with JSON matching \
         exactly this shape: {CV_EXTRACT_SCHEMA}. {JSON_ONLY_INSTRUCTION}"
    );
    let user = format!(
        "Candidate CV:\n{}",
        truncated(cv_text, BODY_CEILING_CHAIN)
    );
    PromptPair::new(system, user)
}

const PROJECT_EXTRACT_SCHEMA: &str = r#"{"requirements": [string], "architecture": [string], "strengths": [string], "risks": [string], "summary": string}"#;

/// **Project extract** (chain step 1).
#[must_use]
pub fn build_project_extract_prompt(project_text: &str) -> PromptPair {
    let system = format!(
        "You extract structured information from a candidate's project report. Respond with \
         JSON matching exactly this shape: {PROJECT_EXTRACT_SCHEMA}. {JSON_ONLY_INSTRUCTION}"
    );
    let user = format!(
        "Project report:\n{}",
        truncated(project_text, BODY_CEILING_CHAIN)
    );
    PromptPair::new(system, user)
}

/// **Evaluate-from-extracts** (chain step 2): extracts plus retrieved context.
#[must_use]
pub fn build_evaluate_from_extracts_prompt(
    job_description: &str,
    cv_extract: &CvExtract,
    project_extract: &ProjectExtract,
    job_description_context: &[RetrievedChunk],
    scoring_rubric_context: &[RetrievedChunk],
) -> PromptPair {
    let system = format!(
        "You are an expert technical recruiter. Given structured CV and project extracts plus \
         retrieved reference context, respond with JSON matching exactly this shape: \
         {EVALUATE_SCHEMA}. {JSON_ONLY_INSTRUCTION}"
    );
    let cv_extract_json = serde_json::to_string(cv_extract).unwrap_or_default();
    let project_extract_json = serde_json::to_string(project_extract).unwrap_or_default();
    let user = format!(
        "Job description:\n{}\n\nCV extract:\n{}\n\nProject extract:\n{}\n\n\
         Retrieved job-description context:\n{}\n\nRetrieved scoring-rubric context:\n{}",
        truncated(job_description, JOB_DESCRIPTION_CEILING_CHAIN),
        cv_extract_json,
        project_extract_json,
        render_context_section(job_description_context),
        render_context_section(scoring_rubric_context),
    );
    PromptPair::new(system, user)
}

/// **Evaluate-with-context**: plain CV/project text plus retrieved context, used when
/// structured extraction failed but retrieval still produced usable chunks (§4.4 step 4).
#[must_use]
pub fn build_evaluate_with_context_prompt(
    job_description: &str,
    study_case_brief: &str,
    cv_text: &str,
    project_text: &str,
    job_description_context: &[RetrievedChunk],
    scoring_rubric_context: &[RetrievedChunk],
) -> PromptPair {
    let system = format!(
        "You are an expert technical recruiter evaluating a candidate's CV and project \
         report against a job description, aided by retrieved reference context. Respond \
         with JSON matching exactly this shape: {EVALUATE_SCHEMA}. {JSON_ONLY_INSTRUCTION}"
    );
    let user = format!(
        "Job description:\n{}\n\nStudy case brief:\n{}\n\nCandidate CV:\n{}\n\n\
         Project report:\n{}\n\nRetrieved job-description context:\n{}\n\n\
         Retrieved scoring-rubric context:\n{}",
        truncated(job_description, JOB_DESCRIPTION_CEILING_CHAIN),
        truncated(study_case_brief, JOB_DESCRIPTION_CEILING_CHAIN),
        truncated(cv_text, BODY_CEILING_CHAIN),
        truncated(project_text, BODY_CEILING_CHAIN),
        render_context_section(job_description_context),
        render_context_section(scoring_rubric_context),
    );
    PromptPair::new(system, user)
}

const CV_SUB_EVAL_SCHEMA: &str = r#"{"technical_skills": number, "experience_level": number, "relevant_achievements": number, "cultural_fit": number, "cv_feedback": string}"#;

/// **CV sub-evaluation** (refinement chain step, CV half): scores the CV
/// extract against the job description on the four CV rubric dimensions,
/// each 1-5. The weighted `cv_match_rate` itself is never asked of the LLM;
/// it is computed deterministically from these scores (§8).
#[must_use]
pub fn build_cv_sub_evaluation_prompt(job_description: &str, cv_extract: &CvExtract) -> PromptPair {
    let system = format!(
        "You are an expert technical recruiter. Score a candidate's CV extract against a job \
         description on four dimensions, each an integer from 1 to 5: technical_skills, \
         experience_level, relevant_achievements, cultural_fit. Respond with JSON matching \
         exactly this shape: {CV_SUB_EVAL_SCHEMA}. {JSON_ONLY_INSTRUCTION}"
    );
    let cv_extract_json = serde_json::to_string(cv_extract).unwrap_or_default();
    let user = format!(
        "Job description:\n{}\n\nCV extract:\n{}",
        truncated(job_description, JOB_DESCRIPTION_CEILING_CHAIN),
        cv_extract_json,
    );
    PromptPair::new(system, user)
}

const PROJECT_SUB_EVAL_SCHEMA: &str = r#"{"correctness": number, "code_quality": number, "resilience": number, "documentation": number, "creativity": number, "project_feedback": string}"#;

/// **Project sub-evaluation** (refinement chain step, project half): scores
/// the project extract on the five project rubric dimensions, each 1-5.
/// The weighted `project_score` itself is never asked of the LLM; it is
/// computed deterministically from these scores (§8).
#[must_use]
pub fn build_project_sub_evaluation_prompt(project_extract: &ProjectExtract) -> PromptPair {
    let system = format!(
        "You are an expert technical recruiter. Score a candidate's project report extract on \
         five dimensions, each an integer from 1 to 5: correctness, code_quality, resilience, \
         documentation, creativity. Respond with JSON matching exactly this shape: \
         {PROJECT_SUB_EVAL_SCHEMA}. {JSON_ONLY_INSTRUCTION}"
    );
    let project_extract_json = serde_json::to_string(project_extract).unwrap_or_default();
    let user = format!("Project extract:\n{project_extract_json}");
    PromptPair::new(system, user)
}

const REFINEMENT_SCHEMA: &str = r#"{"overall_summary": string}"#;

/// **Refinement** (§4.4): merges a CV sub-evaluation and a project
/// sub-evaluation into a single overall narrative summary. The two
/// weighted headline numbers are never asked of the LLM here either — the
/// caller combines the sub-evaluations via
/// [`cveval_domain::entities::RubricScores`] and only uses this prompt for
/// the prose that ties both halves together.
#[must_use]
pub fn build_refinement_prompt(cv_sub_eval_json: &str, project_sub_eval_json: &str) -> PromptPair {
    let system = format!(
        "You merge a CV sub-evaluation and a project sub-evaluation into a single overall \
         summary of 3-5 sentences, covering both the candidate's CV fit and their project \
         quality. Respond with JSON matching exactly this shape: {REFINEMENT_SCHEMA}. \
         {JSON_ONLY_INSTRUCTION}"
    );
    let user = format!(
        "CV sub-evaluation:\n{cv_sub_eval_json}\n\nProject sub-evaluation:\n{project_sub_eval_json}"
    );
    PromptPair::new(system, user)
}

/// **CoT cleanup** (§4.4 step 7): rewrite a leaking first-pass answer as pure JSON.
#[must_use]
pub fn build_cot_cleanup_prompt(leaking_json: &str) -> PromptPair {
    let system = format!(
        "You rewrite an evaluation JSON object to remove any chain-of-thought, \
         step-by-step reasoning, or meta-commentary from its text fields, keeping the \
         same shape {EVALUATE_SCHEMA} and the same factual content. {JSON_ONLY_INSTRUCTION}"
    );
    let user = format!("Evaluation JSON to rewrite:\n{leaking_json}");
    PromptPair::new(system, user)
}
