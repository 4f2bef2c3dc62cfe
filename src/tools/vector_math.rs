use ndarray::ArrayView1;

use crate::core::errors::PipelineError;

/// Cosine similarity of two equal-length vectors, clamped to `[-1, 1]`.
///
/// Empty inputs, mismatched lengths and zero-magnitude vectors are rejected
/// with [`PipelineError::InvalidVector`] rather than scored as `0.0`.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32, PipelineError> {
    if query.is_empty() || candidate.is_empty() {
        return Err(PipelineError::InvalidVector(
            "Vectors must not be empty".to_string(),
        ));
    }
    if query.len() != candidate.len() {
        return Err(PipelineError::InvalidVector(format!(
            "Vector length mismatch: {} != {}",
            query.len(),
            candidate.len()
        )));
    }

    let query = ArrayView1::from(query);
    let candidate = ArrayView1::from(candidate);

    let query_norm = query.dot(&query).sqrt();
    let candidate_norm = candidate.dot(&candidate).sqrt();
    if query_norm <= f32::EPSILON || candidate_norm <= f32::EPSILON {
        return Err(PipelineError::InvalidVector(
            "Vectors must have non-zero magnitude".to_string(),
        ));
    }

    let score = query.dot(&candidate) / (query_norm * candidate_norm);
    if !score.is_finite() {
        return Err(PipelineError::InvalidVector(
            "Similarity is not a finite number".to_string(),
        ));
    }

    Ok(score.clamp(-1.0, 1.0))
}

/// Scores every candidate against `query` and sorts by descending score.
///
/// The sort is stable, so equal scores keep candidate order.
pub fn rank_descending_by_cosine(
    query: &[f32],
    candidates: &[Vec<f32>],
) -> Result<Vec<(usize, f32)>, PipelineError> {
    let mut scores = Vec::with_capacity(candidates.len());
    for (idx, candidate) in candidates.iter().enumerate() {
        let score = cosine_similarity(query, candidate)?;
        scores.push((idx, score));
    }

    scores.sort_by(|left, right| right.1.total_cmp(&left.1));
    Ok(scores)
}
