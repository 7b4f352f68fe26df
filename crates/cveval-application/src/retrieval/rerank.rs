//! Weight-aware re-ranking and deduplication (§4.3, §8).

use std::collections::HashSet;

use cveval_domain::entities::RetrievedChunk;
use cveval_domain::ports::providers::VectorSearchHit;

fn to_chunk(hit: VectorSearchHit) -> RetrievedChunk {
    RetrievedChunk {
        text: hit.text,
        score: hit.score,
        weight: hit.weight,
    }
}

/// Stable-sort by: weighted entries before unweighted; among weighted,
/// weight desc; otherwise preserve original search-result order (§4.3 step 4).
fn stable_sort_by_weight(chunks: &mut [RetrievedChunk]) {
    chunks.sort_by(|a, b| match (a.weight, b.weight) {
        (Some(wa), Some(wb)) => wb.partial_cmp(&wa).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Deduplicate by exact text, keeping the first (highest-ranked) occurrence.
fn dedup_by_text(chunks: Vec<RetrievedChunk>) -> Vec<RetrievedChunk> {
    let mut seen = HashSet::new();
    chunks
        .into_iter()
        .filter(|chunk| seen.insert(chunk.text.clone()))
        .collect()
}

/// `top_contexts_by_weight`: convert raw search hits into the final,
/// stably-ordered, deduplicated, top-`k` context list (§4.3 steps 3-5, §8).
#[must_use]
pub fn top_contexts_by_weight(hits: Vec<VectorSearchHit>, k: usize) -> Vec<RetrievedChunk> {
    let mut chunks: Vec<RetrievedChunk> = hits.into_iter().map(to_chunk).collect();
    stable_sort_by_weight(&mut chunks);
    let deduped = dedup_by_text(chunks);
    deduped.into_iter().take(k).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(text: &str, score: f64, weight: Option<f64>) -> VectorSearchHit {
        VectorSearchHit {
            text: text.to_owned(),
            weight,
            score,
        }
    }

    #[test]
    fn weighted_entries_sort_before_unweighted() {
        let hits = vec![
            hit("unweighted", 0.9, None),
            hit("weighted", 0.5, Some(1.0)),
        ];
        let result = top_contexts_by_weight(hits, 10);
        assert_eq!(result[0].text, "weighted");
        assert_eq!(result[1].text, "unweighted");
    }

    #[test]
    fn higher_weight_sorts_first_among_weighted() {
        let hits = vec![
            hit("low", 0.9, Some(1.0)),
            hit("high", 0.1, Some(5.0)),
        ];
        let result = top_contexts_by_weight(hits, 10);
        assert_eq!(result[0].text, "high");
        assert_eq!(result[1].text, "low");
    }

    #[test]
    fn unweighted_entries_preserve_original_order() {
        let hits = vec![hit("first", 0.9, None), hit("second", 0.8, None)];
        let result = top_contexts_by_weight(hits, 10);
        assert_eq!(result[0].text, "first");
        assert_eq!(result[1].text, "second");
    }

    #[test]
    fn duplicate_text_is_removed_keeping_first_occurrence() {
        let hits = vec![
            hit("dup", 0.9, Some(2.0)),
            hit("dup", 0.1, Some(1.0)),
            hit("unique", 0.5, None),
        ];
        let result = top_contexts_by_weight(hits, 10);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "dup");
        assert_eq!(result[0].score, 0.9);
    }

    #[test]
    fn caps_at_k() {
        let hits: Vec<_> = (0..10).map(|i| hit(&format!("c{i}"), 1.0, None)).collect();
        let result = top_contexts_by_weight(hits, 6);
        assert_eq!(result.len(), 6);
    }

    #[test]
    fn stable_for_equal_inputs() {
        let hits = vec![hit("a", 0.9, Some(1.0)), hit("b", 0.8, Some(1.0))];
        let first = top_contexts_by_weight(hits.clone(), 10);
        let second = top_contexts_by_weight(hits, 10);
        assert_eq!(first, second);
    }

    #[test]
    fn inserting_a_duplicate_never_increases_output_count() {
        let without_dup = vec![hit("a", 0.9, None), hit("b", 0.8, None)];
        let with_dup = vec![hit("a", 0.9, None), hit("a", 0.9, None), hit("b", 0.8, None)];
        let before = top_contexts_by_weight(without_dup, 10).len();
        let after = top_contexts_by_weight(with_dup, 10).len();
        assert_eq!(before, after);
    }
}
