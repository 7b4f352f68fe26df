//! Clamp/Normalizer (§4.1): validates and canonicalizes LLM JSON outputs.

pub mod cot;
pub mod normalize;
pub mod sentences;

pub use cot::{find_cot_marker, is_clean, COT_PATTERNS, COT_PATTERN_SET_VERSION};
pub use normalize::{
    parse_and_normalize, parse_cv_sub_evaluation, parse_json_object, parse_project_sub_evaluation,
    parse_refinement_summary, validate_no_cot,
};
pub use sentences::limit_sentences;
