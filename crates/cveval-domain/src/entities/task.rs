//! The `EvaluateTask` broker message payload.

use serde::{Deserialize, Serialize};

use crate::value_objects::JobId;

/// Broker message body for the `"evaluate_job"` task type (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateTask {
    /// The job this task advances.
    pub job_id: JobId,
    /// Upload id for the candidate's CV.
    pub cv_id: String,
    /// Upload id for the candidate's project report.
    pub project_id: String,
    /// The job description text (already extracted).
    pub job_description: String,
    /// The study case brief text.
    pub study_case_brief: String,
    /// The scoring rubric text (free-form prose, distinct from [`crate::entities::rubric::RubricScores`]).
    pub scoring_rubric: String,
}

/// The broker task-type identifier used for routing/metrics labels.
pub const TASK_TYPE: &str = "evaluate_job";
