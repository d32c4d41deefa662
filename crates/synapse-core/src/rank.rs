//! Retrieval ranker: cosine similarity over entry embeddings.
//!
//! [`rank`] is a pure function with no I/O and no shared state; it is safe
//! to call concurrently for different requests without coordination.
//! Callers apply timeouts, if any, around the embedding-service call that
//! produces the query vector, not around ranking.
//!
//! Malformed candidates are skipped rather than failing the whole ranking:
//! one corrupt record must not break search for a user.

use crate::models::{Entry, SearchResult};

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors, vectors of different lengths, and
/// zero-magnitude vectors — degenerate embeddings must not crash retrieval.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Rank candidate entries by cosine similarity to `query`, descending,
/// and return the first `top_k`.
///
/// Skip policy: a candidate with no embedding, or with an embedding whose
/// length differs from the query's, is excluded and the remaining
/// candidates are ranked normally.
///
/// The sort is stable, so entries with equal scores retain their input
/// order — results are deterministic for a given candidate sequence.
///
/// An empty `query`, an empty candidate set, or `top_k == 0` all yield an
/// empty result, never an error.
pub fn rank(query: &[f32], candidates: Vec<Entry>, top_k: usize) -> Vec<SearchResult> {
    if query.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let mut results: Vec<SearchResult> = candidates
        .into_iter()
        .filter_map(|entry| {
            let score = match entry.embedding.as_deref() {
                Some(vec) if vec.len() == query.len() => cosine_similarity(query, vec) as f64,
                _ => return None,
            };
            Some(SearchResult { entry, score })
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(top_k);

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryType, NewEntry};

    fn make_entry(id: &str, embedding: Option<Vec<f32>>) -> Entry {
        let mut entry = Entry::from_new(
            "u1",
            NewEntry {
                kind: EntryType::Note,
                title: None,
                content: format!("content {}", id),
                source: None,
                tags: Vec::new(),
            },
            embedding,
        );
        entry.id = id.to_string();
        entry
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_symmetric() {
        let a = vec![0.3, -1.2, 0.8];
        let b = vec![2.0, 0.5, -0.1];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_zero_vector() {
        let zero = vec![0.0, 0.0];
        let v = vec![1.0, 2.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
    }

    #[test]
    fn test_cosine_empty_and_mismatched() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_rank_concrete_scenario() {
        let candidates = vec![
            make_entry("same", Some(vec![1.0, 0.0])),
            make_entry("orthogonal", Some(vec![0.0, 1.0])),
            make_entry("opposite", Some(vec![-1.0, 0.0])),
        ];
        let results = rank(&[1.0, 0.0], candidates, 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].entry.id, "same");
        assert!((results[0].score - 1.0).abs() < 1e-9);
        assert_eq!(results[1].entry.id, "orthogonal");
        assert!(results[1].score.abs() < 1e-9);
        assert_eq!(results[2].entry.id, "opposite");
        assert!((results[2].score + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rank_descending() {
        let candidates = vec![
            make_entry("a", Some(vec![0.1, 0.9])),
            make_entry("b", Some(vec![1.0, 0.0])),
            make_entry("c", Some(vec![0.5, 0.5])),
        ];
        let results = rank(&[1.0, 0.0], candidates, 3);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_rank_truncates_to_top_k() {
        let candidates = vec![
            make_entry("a", Some(vec![1.0, 0.0])),
            make_entry("b", Some(vec![0.0, 1.0])),
            make_entry("c", Some(vec![0.5, 0.5])),
        ];
        assert_eq!(rank(&[1.0, 0.0], candidates.clone(), 2).len(), 2);
        assert_eq!(rank(&[1.0, 0.0], candidates, 10).len(), 3);
    }

    #[test]
    fn test_rank_empty_candidates() {
        assert!(rank(&[1.0, 0.0], Vec::new(), 5).is_empty());
    }

    #[test]
    fn test_rank_zero_top_k() {
        let candidates = vec![make_entry("a", Some(vec![1.0, 0.0]))];
        assert!(rank(&[1.0, 0.0], candidates, 0).is_empty());
    }

    #[test]
    fn test_rank_skips_mismatched_dimensions() {
        let candidates = vec![
            make_entry("bad", Some(vec![1.0, 0.0, 0.0])),
            make_entry("good", Some(vec![1.0, 0.0])),
        ];
        let results = rank(&[1.0, 0.0], candidates, 3);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.id, "good");
    }

    #[test]
    fn test_rank_skips_missing_embeddings() {
        let candidates = vec![
            make_entry("unembedded", None),
            make_entry("embedded", Some(vec![0.0, 1.0])),
        ];
        let results = rank(&[1.0, 0.0], candidates, 3);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.id, "embedded");
    }

    #[test]
    fn test_rank_stable_on_ties() {
        // Two candidates at identical similarity keep their input order.
        let candidates = vec![
            make_entry("first", Some(vec![0.0, 1.0])),
            make_entry("second", Some(vec![0.0, 2.0])),
        ];
        let results = rank(&[1.0, 0.0], candidates, 2);
        assert_eq!(results[0].entry.id, "first");
        assert_eq!(results[1].entry.id, "second");
    }

    #[test]
    fn test_rank_zero_magnitude_candidate_scores_zero() {
        let candidates = vec![make_entry("degenerate", Some(vec![0.0, 0.0]))];
        let results = rank(&[1.0, 0.0], candidates, 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 0.0);
    }
}
