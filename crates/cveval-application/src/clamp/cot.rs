//! Chain-of-thought leakage detection (§4.1).
//!
//! The pattern set is a literal, versioned wire contract, not a classifier:
//! two implementations of this system must reject exactly the same set of
//! outputs. Changing [`COT_PATTERNS`] is a compatibility event — bump
//! [`COT_PATTERN_SET_VERSION`] alongside any change and call it out in
//! `DESIGN.md`.

/// Version of the literal CoT pattern set below. Bump on any change.
pub const COT_PATTERN_SET_VERSION: u32 = 2;

/// Case-insensitive substrings that indicate chain-of-thought leakage into a
/// terminal-answer field.
pub const COT_PATTERNS: &[&str] = &[
    "step 1:",
    "step 2:",
    "step 3:",
    "step 4:",
    "step 5:",
    "first,",
    "firstly,",
    "second,",
    "secondly,",
    "third,",
    "thirdly,",
    "fourth,",
    "fifth,",
    "i think",
    "i believe",
    "i consider",
    "let me",
    "let's",
    "therefore,",
    "thus,",
    "hence,",
    "reasoning:",
    "analysis:",
    "process:",
    "method:",
    "based on",
    "according to",
    "in conclusion,",
    "to summarize,",
];

/// `validate_no_cot(text) → error{cot_detected}?`
///
/// Returns the first matched pattern, if any, lowercase-normalized for
/// diagnostics. `None` means the text is clean.
#[must_use]
pub fn find_cot_marker(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    COT_PATTERNS
        .iter()
        .find(|pattern| lowered.contains(*pattern))
        .copied()
}

/// True if none of the fixed CoT patterns appear in `text`.
#[must_use]
pub fn is_clean(text: &str) -> bool {
    find_cot_marker(text).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_feedback_is_clean() {
        assert!(is_clean("Strong alignment with the role's requirements."));
    }

    #[test]
    fn detects_step_headers_case_insensitively() {
        assert_eq!(find_cot_marker("STEP 1: analyze the resume"), Some("step 1:"));
    }

    #[test]
    fn detects_first_person_reasoning_markers() {
        assert!(!is_clean("I think the candidate is a strong match."));
        assert!(!is_clean("Let me walk through the evaluation."));
    }

    #[test]
    fn detects_conclusion_markers() {
        assert!(!is_clean("In conclusion, this candidate is excellent."));
        assert!(!is_clean("To summarize, the project met requirements."));
    }

    #[test]
    fn detects_causal_connectives() {
        assert!(!is_clean("Therefore, the score should be high."));
        assert!(!is_clean("Thus, we recommend hiring."));
    }

    #[test]
    fn pattern_set_is_versioned() {
        assert_eq!(COT_PATTERN_SET_VERSION, 2);
        assert!(!COT_PATTERNS.is_empty());
    }

    #[test]
    fn detects_bare_attribution_markers() {
        assert!(!is_clean("Based on the candidate's experience, this is a strong fit."));
        assert!(!is_clean("According to the rubric, the project scores well."));
    }
}
