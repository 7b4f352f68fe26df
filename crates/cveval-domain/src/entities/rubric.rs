//! `RubricScores` and the deterministic weighted-scoring formula (§8).
//!
//! This is the one piece of scoring math this repository treats as a pure,
//! total function rather than something the LLM is trusted to compute
//! correctly on its own: the refinement chain step (§4.4 step 8's
//! predecessor) feeds its sub-scores through this formula rather than
//! asking the LLM to do the arithmetic, so the weighted-scoring invariant
//! in §8 holds unconditionally, not just "usually".

use serde::{Deserialize, Serialize};

/// CV-side sub-evaluation (chain refinement step, CV half): the four CV
/// rubric sub-scores plus the feedback text carried into the final result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvSubEvaluation {
    /// CV: technical skills match, 1-5.
    pub technical_skills: u8,
    /// CV: experience level, 1-5.
    pub experience_level: u8,
    /// CV: relevant achievements, 1-5.
    pub relevant_achievements: u8,
    /// CV: cultural/communication fit, 1-5.
    pub cultural_fit: u8,
    /// Free-text feedback on the CV half of the evaluation.
    pub cv_feedback: String,
}

/// Project-side sub-evaluation (chain refinement step, project half): the
/// five project rubric sub-scores plus the feedback text carried into the
/// final result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSubEvaluation {
    /// Project: correctness, 1-5.
    pub correctness: u8,
    /// Project: code quality, 1-5.
    pub code_quality: u8,
    /// Project: resilience/error handling, 1-5.
    pub resilience: u8,
    /// Project: documentation, 1-5.
    pub documentation: u8,
    /// Project: creativity, 1-5.
    pub creativity: u8,
    /// Free-text feedback on the project half of the evaluation.
    pub project_feedback: String,
}

/// Nine 1-5 integer sub-scores produced by the CV/project scoring chain
/// steps, combined deterministically into the two headline metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricScores {
    /// CV: technical skills match, 1-5.
    pub technical_skills: u8,
    /// CV: experience level, 1-5.
    pub experience_level: u8,
    /// CV: relevant achievements, 1-5.
    pub relevant_achievements: u8,
    /// CV: cultural/communication fit, 1-5.
    pub cultural_fit: u8,
    /// Project: correctness, 1-5.
    pub correctness: u8,
    /// Project: code quality, 1-5.
    pub code_quality: u8,
    /// Project: resilience/error handling, 1-5.
    pub resilience: u8,
    /// Project: documentation, 1-5.
    pub documentation: u8,
    /// Project: creativity, 1-5.
    pub creativity: u8,
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

impl RubricScores {
    /// Combine a CV and a project sub-evaluation into one `RubricScores`,
    /// the step the refinement chain step (§4.4) uses before computing the
    /// two headline metrics.
    #[must_use]
    pub fn from_sub_evaluations(cv: &CvSubEvaluation, project: &ProjectSubEvaluation) -> Self {
        Self {
            technical_skills: cv.technical_skills,
            experience_level: cv.experience_level,
            relevant_achievements: cv.relevant_achievements,
            cultural_fit: cv.cultural_fit,
            correctness: project.correctness,
            code_quality: project.code_quality,
            resilience: project.resilience,
            documentation: project.documentation,
            creativity: project.creativity,
        }
    }

    /// `cv_match_rate = clamp((0.4*T + 0.25*E + 0.2*A + 0.15*C) * 0.2, 0, 1)`.
    #[must_use]
    pub fn cv_match_rate(&self) -> f64 {
        let weighted = 0.4 * f64::from(self.technical_skills)
            + 0.25 * f64::from(self.experience_level)
            + 0.2 * f64::from(self.relevant_achievements)
            + 0.15 * f64::from(self.cultural_fit);
        clamp(weighted * 0.2, 0.0, 1.0)
    }

    /// `project_score = clamp((0.3*Co + 0.25*Q + 0.2*R + 0.15*D + 0.1*Cr) * 2, 1, 10)`.
    #[must_use]
    pub fn project_score(&self) -> f64 {
        let weighted = 0.3 * f64::from(self.correctness)
            + 0.25 * f64::from(self.code_quality)
            + 0.2 * f64::from(self.resilience)
            + 0.15 * f64::from(self.documentation)
            + 0.1 * f64::from(self.creativity);
        clamp(weighted * 2.0, 1.0, 10.0)
    }
}
