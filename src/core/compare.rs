use std::path::{Path, PathBuf};

use crate::core::embeddings::{EmbedOutcome, EmbeddingProvider};
use crate::core::similarity::{confidence_label, confidence_score, cosine_similarity};
use crate::models::report::{ComparisonResult, MatchRecord, SkippedCandidate};

/// Compare one reference image against a list of candidate images.
///
/// A candidate matches when its similarity is at or above `threshold`
/// (inclusive). Candidates that cannot be embedded are excluded from the
/// statistics and collected in `skipped`; an unembeddable reference yields
/// a zero-valued result. No per-candidate fault aborts the comparison.
pub fn compare_against<P: EmbeddingProvider + ?Sized>(
    provider: &P,
    reference: &Path,
    candidates: &[PathBuf],
    threshold: f32,
) -> ComparisonResult {
    let reference_embedding = match provider.embed_path(reference) {
        EmbedOutcome::Embedded(embedding) => embedding,
        EmbedOutcome::Skipped(reason) => {
            log::warn!("reference {} skipped: {}", reference.display(), reason);
            return ComparisonResult::empty();
        }
    };

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    let mut matches = 0usize;
    let mut similarity_sum = 0.0f32;

    for candidate in candidates {
        let embedding = match provider.embed_path(candidate) {
            EmbedOutcome::Embedded(embedding) => embedding,
            EmbedOutcome::Skipped(reason) => {
                log::warn!("candidate {} skipped: {}", candidate.display(), reason);
                skipped.push(SkippedCandidate {
                    candidate: candidate.display().to_string(),
                    reason,
                });
                continue;
            }
        };

        let similarity = cosine_similarity(&reference_embedding, &embedding);
        let confidence = confidence_score(similarity);
        let label = confidence_label(confidence);

        if similarity >= threshold {
            matches += 1;
            log::debug!(
                "match: {} (similarity {:.4}, confidence {:.2}%)",
                candidate.display(),
                similarity,
                confidence
            );
        }

        similarity_sum += similarity;
        records.push(MatchRecord {
            candidate: candidate.display().to_string(),
            similarity,
            confidence,
            label,
        });
    }

    let compared = records.len();
    let match_ratio = if compared > 0 {
        matches as f32 / compared as f32
    } else {
        0.0
    };
    let mean_similarity = if compared > 0 {
        similarity_sum / compared as f32
    } else {
        0.0
    };

    ComparisonResult {
        compared,
        matches,
        match_ratio,
        mean_similarity,
        is_duplicate: matches > 0,
        records,
        skipped,
    }
}
