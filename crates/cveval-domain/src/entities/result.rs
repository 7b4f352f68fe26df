//! The `EvaluationResult` entity, written once per job on success.

use serde::{Deserialize, Serialize};

use crate::value_objects::JobId;

/// The final, clamped, sentence-bounded evaluation for one job (§3, §6).
///
/// Every numeric/text invariant in §3 is expected to already hold by the
/// time a value of this type is constructed outside of tests — the
/// clamp/normalizer is the only place that is allowed to build one from
/// untrusted LLM output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// The job this result belongs to (unique per job).
    pub job_id: JobId,
    /// CV-to-job match rate, clamped to `[0.0, 1.0]`.
    pub cv_match_rate: f64,
    /// 1-3 sentence feedback on the CV.
    pub cv_feedback: String,
    /// Project score, clamped to `[1.0, 10.0]`.
    pub project_score: f64,
    /// 1-3 sentence feedback on the project.
    pub project_feedback: String,
    /// 3-5 sentence overall summary.
    pub overall_summary: String,
    /// When this result was produced (UTC).
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl EvaluationResult {
    /// `cv_match_rate` and `project_score` fall within their documented ranges.
    #[must_use]
    pub fn within_numeric_ranges(&self) -> bool {
        (0.0..=1.0).contains(&self.cv_match_rate) && (1.0..=10.0).contains(&self.project_score)
    }
}
