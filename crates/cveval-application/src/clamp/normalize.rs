//! `parse_and_normalize` (§4.1): the boundary between untrusted LLM text
//! and a trusted [`EvaluationResult`].

use cveval_domain::entities::{CvSubEvaluation, EvaluationResult, ProjectSubEvaluation};
use cveval_domain::error::{Error, Result};
use cveval_domain::value_objects::JobId;

use super::cot::find_cot_marker;
use super::sentences::{
    limit_sentences, truncate_with_ellipsis, FEEDBACK_CHAR_CEILING, SUMMARY_CHAR_CEILING,
};

const FEEDBACK_MIN_SENTENCES: usize = 1;
const FEEDBACK_MAX_SENTENCES: usize = 3;
const SUMMARY_MIN_SENTENCES: usize = 3;
const SUMMARY_MAX_SENTENCES: usize = 5;

/// Locate the first balanced `{...}` substring in `text` via depth counting.
///
/// Quoting is deliberately ignored (§4.1): LLM outputs must be raw JSON, so
/// a brace inside a quoted string is vanishingly rare in practice and the
/// distilled spec explicitly accepts this simplification.
fn extract_first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    for (offset, byte) in bytes[start..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

fn require_non_empty_field(value: &serde_json::Value, field: &str) -> Result<String> {
    let text = value
        .get(field)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| Error::SchemaInvalid {
            message: format!("missing or non-string field `{field}`"),
        })?
        .trim()
        .to_owned();
    if text.is_empty() {
        return Err(Error::EmptyField {
            field: field.to_owned(),
        });
    }
    Ok(text)
}

fn require_number_field(value: &serde_json::Value, field: &str) -> Result<f64> {
    value
        .get(field)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| Error::SchemaInvalid {
            message: format!("missing or non-numeric field `{field}`"),
        })
}

/// Clamp a rubric sub-score into the admissible `[1,5]` integer range (§3).
fn clamp_rubric_score(value: f64) -> u8 {
    clamp_f64(value, 1.0, 5.0).round() as u8
}

fn require_feedback_field(value: &serde_json::Value, field: &str) -> Result<String> {
    let text = require_non_empty_field(value, field)?;
    validate_no_cot(&text)?;
    Ok(truncate_with_ellipsis(
        &limit_sentences(&text, FEEDBACK_MAX_SENTENCES),
        FEEDBACK_CHAR_CEILING,
    ))
}

/// Parse the CV half of the refinement chain step (§4.4): four rubric
/// sub-scores, clamped into `[1,5]`, plus feedback text.
pub fn parse_cv_sub_evaluation(text: &str) -> Result<CvSubEvaluation> {
    let json_slice = extract_first_json_object(text).ok_or_else(|| Error::InvalidJson {
        message: "no balanced JSON object found in LLM output".to_owned(),
    })?;
    let value: serde_json::Value =
        serde_json::from_str(json_slice).map_err(|err| Error::InvalidJson {
            message: err.to_string(),
        })?;

    Ok(CvSubEvaluation {
        technical_skills: clamp_rubric_score(require_number_field(&value, "technical_skills")?),
        experience_level: clamp_rubric_score(require_number_field(&value, "experience_level")?),
        relevant_achievements: clamp_rubric_score(require_number_field(&value, "relevant_achievements")?),
        cultural_fit: clamp_rubric_score(require_number_field(&value, "cultural_fit")?),
        cv_feedback: require_feedback_field(&value, "cv_feedback")?,
    })
}

/// Parse the project half of the refinement chain step (§4.4): five rubric
/// sub-scores, clamped into `[1,5]`, plus feedback text.
pub fn parse_project_sub_evaluation(text: &str) -> Result<ProjectSubEvaluation> {
    let json_slice = extract_first_json_object(text).ok_or_else(|| Error::InvalidJson {
        message: "no balanced JSON object found in LLM output".to_owned(),
    })?;
    let value: serde_json::Value =
        serde_json::from_str(json_slice).map_err(|err| Error::InvalidJson {
            message: err.to_string(),
        })?;

    Ok(ProjectSubEvaluation {
        correctness: clamp_rubric_score(require_number_field(&value, "correctness")?),
        code_quality: clamp_rubric_score(require_number_field(&value, "code_quality")?),
        resilience: clamp_rubric_score(require_number_field(&value, "resilience")?),
        documentation: clamp_rubric_score(require_number_field(&value, "documentation")?),
        creativity: clamp_rubric_score(require_number_field(&value, "creativity")?),
        project_feedback: require_feedback_field(&value, "project_feedback")?,
    })
}

/// Parse the refinement step's merged narrative (§4.4): the weighted
/// headline numbers never come from this response, only `overall_summary`.
pub fn parse_refinement_summary(text: &str) -> Result<String> {
    let json_slice = extract_first_json_object(text).ok_or_else(|| Error::InvalidJson {
        message: "no balanced JSON object found in LLM output".to_owned(),
    })?;
    let value: serde_json::Value =
        serde_json::from_str(json_slice).map_err(|err| Error::InvalidJson {
            message: err.to_string(),
        })?;
    let overall_summary = require_non_empty_field(&value, "overall_summary")?;
    validate_no_cot(&overall_summary)?;
    Ok(truncate_with_ellipsis(
        &limit_sentences(&overall_summary, SUMMARY_MAX_SENTENCES),
        SUMMARY_CHAR_CEILING,
    ))
}

/// Parse the first balanced JSON object in `text` into `T`, for the chain's
/// structured-extract steps (CV extract, project extract) which carry no
/// numeric/text clamping requirements of their own.
pub fn parse_json_object<T: serde::de::DeserializeOwned>(text: &str) -> Result<T> {
    let json_slice = extract_first_json_object(text).ok_or_else(|| Error::InvalidJson {
        message: "no balanced JSON object found in LLM output".to_owned(),
    })?;
    serde_json::from_str(json_slice).map_err(|err| Error::InvalidJson {
        message: err.to_string(),
    })
}

/// `validate_no_cot(text) → error{cot_detected}?`
pub fn validate_no_cot(text: &str) -> Result<()> {
    if let Some(marker) = find_cot_marker(text) {
        return Err(Error::CotDetected {
            field: marker.to_owned(),
        });
    }
    Ok(())
}

/// Parse raw LLM output text into a clamped, schema-valid [`EvaluationResult`].
///
/// # Errors
/// Returns [`Error::InvalidJson`], [`Error::SchemaInvalid`],
/// [`Error::EmptyField`], or [`Error::CotDetected`] per §4.1's error policy.
/// Out-of-range numerics are clamped rather than rejected (§3 invariant),
/// matching the distilled spec's explicit numeric-range handling.
pub fn parse_and_normalize(job_id: JobId, text: &str) -> Result<EvaluationResult> {
    let json_slice = extract_first_json_object(text).ok_or_else(|| Error::InvalidJson {
        message: "no balanced JSON object found in LLM output".to_owned(),
    })?;
    let value: serde_json::Value =
        serde_json::from_str(json_slice).map_err(|err| Error::InvalidJson {
            message: err.to_string(),
        })?;

    let cv_match_rate = require_number_field(&value, "cv_match_rate")?;
    let project_score = require_number_field(&value, "project_score")?;
    let cv_feedback = require_non_empty_field(&value, "cv_feedback")?;
    let project_feedback = require_non_empty_field(&value, "project_feedback")?;
    let overall_summary = require_non_empty_field(&value, "overall_summary")?;

    for field in [&cv_feedback, &project_feedback, &overall_summary] {
        validate_no_cot(field)?;
    }

    let cv_match_rate = clamp_f64(cv_match_rate, 0.0, 1.0);
    let project_score = clamp_f64(project_score, 1.0, 10.0);

    let cv_feedback = truncate_with_ellipsis(
        &limit_sentences(&cv_feedback, FEEDBACK_MAX_SENTENCES),
        FEEDBACK_CHAR_CEILING,
    );
    let project_feedback = truncate_with_ellipsis(
        &limit_sentences(&project_feedback, FEEDBACK_MAX_SENTENCES),
        FEEDBACK_CHAR_CEILING,
    );
    let overall_summary = truncate_with_ellipsis(
        &limit_sentences(&overall_summary, SUMMARY_MAX_SENTENCES),
        SUMMARY_CHAR_CEILING,
    );

    debug_assert!(FEEDBACK_MIN_SENTENCES >= 1);
    debug_assert!(SUMMARY_MIN_SENTENCES >= 1);

    Ok(EvaluationResult {
        job_id,
        cv_match_rate,
        cv_feedback,
        project_score,
        project_feedback,
        overall_summary,
        created_at: chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn happy_path_json() -> &'static str {
        r#"{"cv_match_rate":0.85,"cv_feedback":"Strong.","project_score":8.5,"project_feedback":"Solid.","overall_summary":"A. B. C."}"#
    }

    #[test]
    fn happy_path_parses_cleanly() {
        let result = parse_and_normalize(JobId::new(), happy_path_json()).expect("parses");
        assert!((result.cv_match_rate - 0.85).abs() < 1e-9);
        assert!((result.project_score - 8.5).abs() < 1e-9);
    }

    #[test]
    fn clamps_out_of_range_numerics() {
        let text = r#"{"cv_match_rate":1.5,"cv_feedback":"Strong.","project_score":12,"project_feedback":"Solid.","overall_summary":"A. B. C."}"#;
        let result = parse_and_normalize(JobId::new(), text).expect("parses");
        assert!((result.cv_match_rate - 1.0).abs() < 1e-9);
        assert!((result.project_score - 10.0).abs() < 1e-9);
    }

    #[test]
    fn clamps_negative_and_sub_minimum_numerics() {
        let text = r#"{"cv_match_rate":-0.5,"cv_feedback":"Strong.","project_score":0,"project_feedback":"Solid.","overall_summary":"A. B. C."}"#;
        let result = parse_and_normalize(JobId::new(), text).expect("parses");
        assert!((result.cv_match_rate - 0.0).abs() < 1e-9);
        assert!((result.project_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_json_text() {
        let err = parse_and_normalize(JobId::new(), "not json").unwrap_err();
        assert_eq!(err.kind(), cveval_domain::ErrorKind::LlmSchema);
    }

    #[test]
    fn extracts_first_balanced_object_even_with_surrounding_prose() {
        let text = format!("Here is the answer:\n{}\nThanks!", happy_path_json());
        let result = parse_and_normalize(JobId::new(), &text).expect("parses");
        assert!((result.cv_match_rate - 0.85).abs() < 1e-9);
    }

    #[test]
    fn rejects_empty_feedback_field() {
        let text = r#"{"cv_match_rate":0.5,"cv_feedback":"   ","project_score":5,"project_feedback":"Solid.","overall_summary":"A. B. C."}"#;
        let err = parse_and_normalize(JobId::new(), text).unwrap_err();
        assert_eq!(err.kind(), cveval_domain::ErrorKind::LlmEmptyField);
    }

    #[test]
    fn rejects_missing_field() {
        let text = r#"{"cv_match_rate":0.5,"project_score":5,"project_feedback":"Solid.","overall_summary":"A. B. C."}"#;
        let err = parse_and_normalize(JobId::new(), text).unwrap_err();
        assert_eq!(err.kind(), cveval_domain::ErrorKind::LlmSchema);
    }

    #[test]
    fn rejects_chain_of_thought_leakage() {
        let text = r#"{"cv_match_rate":0.5,"cv_feedback":"Strong.","project_score":5,"project_feedback":"Solid.","overall_summary":"Step 1: analyze. Then decide. Then conclude."}"#;
        let err = parse_and_normalize(JobId::new(), text).unwrap_err();
        assert_eq!(err.kind(), cveval_domain::ErrorKind::LlmCotLeak);
    }

    #[test]
    fn truncates_feedback_over_sentence_cap() {
        let text = r#"{"cv_match_rate":0.5,"cv_feedback":"One. Two. Three. Four.","project_score":5,"project_feedback":"Solid.","overall_summary":"A. B. C."}"#;
        let result = parse_and_normalize(JobId::new(), text).expect("parses");
        assert_eq!(result.cv_feedback, "One. Two. Three.");
    }

    #[test]
    fn parse_and_normalize_is_idempotent() {
        let first = parse_and_normalize(JobId::new(), happy_path_json()).expect("parses");
        let reserialized = serde_json::to_string(&first).expect("serialize");
        let second = parse_and_normalize(first.job_id, &reserialized).expect("parses again");
        assert!((first.cv_match_rate - second.cv_match_rate).abs() < 1e-9);
        assert!((first.project_score - second.project_score).abs() < 1e-9);
        assert_eq!(first.cv_feedback, second.cv_feedback);
        assert_eq!(first.project_feedback, second.project_feedback);
        assert_eq!(first.overall_summary, second.overall_summary);
    }

    #[test]
    fn parse_cv_sub_evaluation_clamps_out_of_range_scores() {
        let text = r#"{"technical_skills":7,"experience_level":0,"relevant_achievements":3,"cultural_fit":3,"cv_feedback":"Strong."}"#;
        let parsed = parse_cv_sub_evaluation(text).expect("parses");
        assert_eq!(parsed.technical_skills, 5);
        assert_eq!(parsed.experience_level, 1);
        assert_eq!(parsed.cv_feedback, "Strong.");
    }

    #[test]
    fn parse_project_sub_evaluation_rejects_cot_leakage() {
        let text = r#"{"correctness":4,"code_quality":4,"resilience":3,"documentation":3,"creativity":2,"project_feedback":"Based on the code, this is solid."}"#;
        let err = parse_project_sub_evaluation(text).unwrap_err();
        assert_eq!(err.kind(), cveval_domain::ErrorKind::LlmCotLeak);
    }

    #[test]
    fn parse_refinement_summary_extracts_and_trims() {
        let text = r#"{"overall_summary":"One. Two. Three. Four."}"#;
        let summary = parse_refinement_summary(text).expect("parses");
        assert_eq!(summary, "One. Two. Three.");
    }
}
