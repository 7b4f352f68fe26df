//! Prompt Builder (§4.2): five deterministic prompt families.

pub mod builder;
pub mod limits;

pub use builder::{
    build_cot_cleanup_prompt, build_cv_extract_prompt, build_cv_sub_evaluation_prompt,
    build_evaluate_from_extracts_prompt, build_evaluate_prompt, build_evaluate_with_context_prompt,
    build_normalization_prompt, build_project_extract_prompt, build_project_sub_evaluation_prompt,
    build_refinement_prompt, PromptPair,
};
