//! Sentence counting and truncation (§4.1).
//!
//! Sentence boundaries are counted by terminator (`.`, `!`, `?`) splitting.
//! Multilingual punctuation is explicitly out of scope (§9): English-only
//! corpora are assumed.

/// Hard character ceiling for `cv_feedback` / `project_feedback`.
pub const FEEDBACK_CHAR_CEILING: usize = 450;
/// Hard character ceiling for `overall_summary`.
pub const SUMMARY_CHAR_CEILING: usize = 1200;

/// Split `text` into trimmed, non-empty sentences on `.`, `!`, `?`.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Count the sentences in `text`.
#[must_use]
pub fn sentence_count(text: &str) -> usize {
    split_sentences(text).len()
}

/// `limit_sentences(text, min, max) → text`.
///
/// Truncates `text` to at most `max` sentences, re-joined with `". "` and a
/// trailing period. Does not attempt to pad text with too few sentences —
/// callers that need a `min` check do so separately (insufficient sentence
/// count alone is not one of the §4.1 error kinds; it is merely a quality
/// signal recorded by `meets_sentence_window`).
#[must_use]
pub fn limit_sentences(text: &str, max: usize) -> String {
    let sentences = split_sentences(text);
    if sentences.len() <= max {
        return normalize_joined(&sentences);
    }
    normalize_joined(&sentences[..max])
}

fn normalize_joined(sentences: &[&str]) -> String {
    if sentences.is_empty() {
        return String::new();
    }
    let mut out = sentences.join(". ");
    out.push('.');
    out
}

/// True if `text` has between `min` and `max` sentences inclusive.
#[must_use]
pub fn meets_sentence_window(text: &str, min: usize, max: usize) -> bool {
    let count = sentence_count(text);
    (min..=max).contains(&count)
}

/// Truncate `text` to `ceiling` characters (by byte-safe `char` boundary),
/// appending an ellipsis when truncation actually occurred.
#[must_use]
pub fn truncate_with_ellipsis(text: &str, ceiling: usize) -> String {
    if text.chars().count() <= ceiling {
        return text.to_owned();
    }
    let mut truncated: String = text.chars().take(ceiling.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
