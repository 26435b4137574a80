use std::collections::BTreeMap;
use std::path::Path;

use crate::core::compare::compare_against;
use crate::core::embeddings::EmbeddingProvider;
use crate::models::report::{BatchReport, BatchSummary, ReferenceMatches};
use crate::state::MatcherConfig;
use crate::utils::list_images;

/// Runs the pairwise comparator over a folder of reference images against a
/// folder of candidate images and assembles a [`BatchReport`].
///
/// The provider is injected once at construction and shared by every
/// comparison in the run, which keeps all embeddings of a batch comparable.
#[derive(Debug)]
pub struct BatchMatcher<P: EmbeddingProvider> {
    provider: P,
    config: MatcherConfig,
}

impl<P: EmbeddingProvider> BatchMatcher<P> {
    /// Create a matcher with the default configuration.
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, MatcherConfig::default())
    }

    /// Create a matcher with a custom configuration.
    pub fn with_config(provider: P, config: MatcherConfig) -> Self {
        Self { provider, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Compare every reference image against every candidate image.
    ///
    /// Missing or empty folders produce an empty report; per-image faults
    /// are absorbed candidate-by-candidate. For each reference the
    /// qualifying matches are sorted by similarity descending and capped to
    /// the configured top-N for presentation, while the statistics keep
    /// covering the entire candidate set.
    pub fn run(&self, reference_dir: &Path, candidate_dir: &Path) -> BatchReport {
        let references = list_images(reference_dir, &self.config.allowed_extensions);
        let candidates = list_images(candidate_dir, &self.config.allowed_extensions);

        if references.is_empty() {
            log::warn!("no reference images found in {}", reference_dir.display());
        }
        if candidates.is_empty() {
            log::warn!("no candidate images found in {}", candidate_dir.display());
        }
        log::info!(
            "comparing {} reference images against {} candidates (threshold {:.2})",
            references.len(),
            candidates.len(),
            self.config.similarity_threshold
        );

        let mut results = BTreeMap::new();
        for reference in &references {
            let comparison = compare_against(
                &self.provider,
                reference,
                &candidates,
                self.config.similarity_threshold,
            );
            log::info!(
                "{}: {} of {} candidates matched (mean similarity {:.4})",
                reference.display(),
                comparison.matches,
                comparison.compared,
                comparison.mean_similarity
            );

            let mut top_matches = comparison.records;
            top_matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
            top_matches.retain(|r| r.similarity >= self.config.similarity_threshold);
            top_matches.truncate(self.config.top_matches);

            let key = reference
                .file_name()
                .and_then(|n| n.to_str())
                .map(String::from)
                .unwrap_or_else(|| reference.display().to_string());

            results.insert(
                key,
                ReferenceMatches {
                    reference_path: reference.display().to_string(),
                    compared: comparison.compared,
                    matches: comparison.matches,
                    match_ratio: comparison.match_ratio,
                    mean_similarity: comparison.mean_similarity,
                    is_duplicate: comparison.is_duplicate,
                    top_matches,
                    skipped: comparison.skipped.len(),
                },
            );
        }

        BatchReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            threshold: self.config.similarity_threshold,
            summary: summarize(&results),
            results,
        }
    }
}

fn summarize(results: &BTreeMap<String, ReferenceMatches>) -> BatchSummary {
    let references = results.len();
    let references_with_matches = results.values().filter(|r| r.matches > 0).count();
    let total_matches = results.values().map(|r| r.matches).sum();
    let mean_similarity = if references > 0 {
        results.values().map(|r| r.mean_similarity).sum::<f32>() / references as f32
    } else {
        0.0
    };

    BatchSummary {
        references,
        references_with_matches,
        total_matches,
        mean_similarity,
    }
}
