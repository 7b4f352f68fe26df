//! Per-field character ceilings for prompt construction (§4.2).

/// Job description ceiling for the single-shot evaluate prompt.
pub const JOB_DESCRIPTION_CEILING_SINGLE_SHOT: usize = 2000;
/// Job description ceiling for chain-mode prompts (extract/evaluate-from-extracts/refine).
pub const JOB_DESCRIPTION_CEILING_CHAIN: usize = 4000;
/// CV/project body ceiling for the single-shot evaluate prompt.
pub const BODY_CEILING_SINGLE_SHOT: usize = 3000;
/// CV/project body ceiling for chain-mode extract prompts.
pub const BODY_CEILING_CHAIN: usize = 4000;
/// Per-chunk ceiling for retrieved context.
pub const CHUNK_CEILING: usize = 800;
/// Maximum number of retrieved chunks included in any single context section.
pub const MAX_CONTEXT_CHUNKS: usize = 6;

/// The standard instruction appended to every system prompt (§4.2, §4.4):
/// return JSON only, and never leak chain-of-thought into the answer.
pub const JSON_ONLY_INSTRUCTION: &str =
    "Return JSON only. No prose, no markdown, no code fences. \
     Do not include any chain-of-thought, step-by-step reasoning, or meta-commentary \
     anywhere in the output.";

/// The strengthened reminder appended on in-task retries (§4.4 step 5).
pub const RETRY_REMINDER: &str =
    "Reminder: return ONLY valid compact JSON, no markdown, no code fences";
