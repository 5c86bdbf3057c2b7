//! Vector similarity and rank fusion utilities.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity
//! - Keyword overlap scoring
//! - Reciprocal Rank Fusion (RRF) for merging ranked result lists

use std::collections::{HashMap, HashSet};

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the vectors differ in length or either is empty or zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Lowercased alphanumeric terms.
pub fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Score a document against query terms: share of distinct query terms it
/// contains, plus a small bonus per occurrence.
pub fn keyword_score(query_terms: &[String], content: &str) -> f32 {
    let distinct: HashSet<&str> = query_terms.iter().map(String::as_str).collect();
    if distinct.is_empty() {
        return 0.0;
    }

    let doc_terms = terms(content);
    let mut matched = 0usize;
    let mut occurrences = 0usize;
    for term in &distinct {
        let count = doc_terms.iter().filter(|t| t.as_str() == *term).count();
        if count > 0 {
            matched += 1;
            occurrences += count;
        }
    }

    if matched == 0 {
        return 0.0;
    }
    matched as f32 / distinct.len() as f32 + 0.01 * occurrences as f32
}

/// Indices of `scores` sorted by descending score, dropping non-positive ones.
pub fn rank(scores: &[f32], limit: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..scores.len()).filter(|&i| scores[i] > 0.0).collect();
    ranked.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    ranked.truncate(limit);
    ranked
}

/// Reciprocal Rank Fusion (RRF): merge two ranked lists of item indices.
///
/// Each item's final score = sum of 1/(k + rank) across both lists.
/// Standard value is k=60. Ties keep the lower index first.
pub fn reciprocal_rank_fusion(
    keyword_ranked: &[usize],
    vector_ranked: &[usize],
    k: u32,
    limit: usize,
) -> Vec<usize> {
    let k = k as f32;
    let mut scores: HashMap<usize, f32> = HashMap::new();

    for list in [keyword_ranked, vector_ranked] {
        for (rank, &idx) in list.iter().enumerate() {
            *scores.entry(idx).or_insert(0.0) += 1.0 / (k + rank as f32 + 1.0);
        }
    }

    let mut merged: Vec<(usize, f32)> = scores.into_iter().collect();
    merged.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    merged.truncate(limit);
    merged.into_iter().map(|(idx, _)| idx).collect()
}
