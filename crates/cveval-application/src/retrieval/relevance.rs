//! RAG effectiveness signal (§4.3): a Jaccard-like token overlap, not a
//! learned relevance model.

use std::collections::HashSet;

fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(str::to_lowercase)
        .filter(|word| word.len() > 2)
        .collect()
}

/// Token-length-weighted Jaccard overlap between a chunk and a query.
///
/// `0.0` when either side tokenizes to nothing (and hence the union is
/// empty) rather than dividing by zero.
#[must_use]
pub fn relevance(chunk: &str, query: &str) -> f64 {
    let chunk_tokens = tokenize(chunk);
    let query_tokens = tokenize(query);
    if chunk_tokens.is_empty() || query_tokens.is_empty() {
        return 0.0;
    }

    let intersection_weight: usize = chunk_tokens
        .intersection(&query_tokens)
        .map(String::len)
        .sum();
    let union_weight: usize = chunk_tokens.union(&query_tokens).map(String::len).sum();

    if union_weight == 0 {
        return 0.0;
    }
    intersection_weight as f64 / union_weight as f64
}

/// Mean relevance of a batch of chunks against one query, `0.0` for an
/// empty batch.
#[must_use]
pub fn mean_relevance(chunks: &[cveval_domain::entities::RetrievedChunk], query: &str) -> f64 {
    if chunks.is_empty() {
        return 0.0;
    }
    let total: f64 = chunks.iter().map(|chunk| relevance(&chunk.text, query)).sum();
    total / chunks.len() as f64
}
