use crate::core::embeddings::Embedding;
use crate::models::report::ConfidenceLabel;

/// Compute the cosine similarity between two embeddings.
///
/// Both embeddings must come from the same provider, which fixes their
/// dimensionality and guarantees non-zero norms; neither is checked here.
/// The result is clamped to [-1, 1] against floating point drift.
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f32 {
    let a = a.vector();
    let b = b.vector();

    let dot_product = a.dot(b);
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();

    (dot_product / (norm_a * norm_b)).min(1.0).max(-1.0)
}

/// Convert a similarity to a confidence score in [0, 100].
///
/// Negative similarities (embeddings pointing in opposite directions) floor
/// to a score of 0.
pub fn confidence_score(similarity: f32) -> f32 {
    similarity.max(0.0).min(1.0) * 100.0
}

/// Get the qualitative verdict for a confidence score.
///
/// Boundaries are strict: a score of exactly 95 falls into the next lower
/// tier.
pub fn confidence_label(score: f32) -> ConfidenceLabel {
    if score > 95.0 {
        ConfidenceLabel::ExtremelyLikely
    } else if score > 90.0 {
        ConfidenceLabel::VeryLikely
    } else if score > 85.0 {
        ConfidenceLabel::Possibly
    } else {
        ConfidenceLabel::Unlikely
    }
}
