use std::path::Path;

use crate::core::embeddings::{EmbedOutcome, Embedding, EmbeddingProvider};
use crate::core::similarity::{confidence_label, confidence_score, cosine_similarity};
use crate::error::{AppError, Result};
use crate::models::report::SearchHit;
use crate::state::default_extensions;
use crate::utils::list_images;

/// Exhaustive nearest-neighbor index over a fixed embedding corpus.
///
/// Rows are keyed by squared Euclidean distance. The corpus is a snapshot:
/// changing it means building a new index.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    vectors: Vec<Embedding>,
}

impl FlatIndex {
    /// Build an index over the given embeddings.
    ///
    /// The dimensionality is fixed by the first embedding; all embeddings
    /// are assumed to come from one provider. An empty corpus is rejected
    /// rather than producing a degenerate index.
    pub fn build(embeddings: &[Embedding]) -> Result<Self> {
        let first = embeddings.first().ok_or_else(|| {
            AppError::InvalidInput("cannot build a search index over zero embeddings".to_string())
        })?;
        Ok(Self {
            dim: first.dim(),
            vectors: embeddings.to_vec(),
        })
    }

    /// Number of indexed embeddings.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index holds no embeddings. Always false for a built index.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimensionality of the indexed embeddings.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Return the `k` nearest rows to `query` as `(row, distance)` pairs,
    /// ascending by squared Euclidean distance.
    ///
    /// `k` is clamped to the corpus size.
    pub fn search(&self, query: &Embedding, k: usize) -> Vec<(usize, f32)> {
        let k = k.min(self.vectors.len());
        let mut pairs: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(row, vector)| (row, squared_l2(query, vector)))
            .collect();
        pairs.sort_by(|a, b| a.1.total_cmp(&b.1));
        pairs.truncate(k);
        pairs
    }
}

fn squared_l2(a: &Embedding, b: &Embedding) -> f32 {
    a.vector()
        .iter()
        .zip(b.vector().iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Reverse-search a query image against a folder of corpus images.
///
/// Every image in `corpus_dir` that can be embedded goes into a flat index;
/// the top `top_k` neighbors of the query are returned with 1-based ranks.
/// An empty or fully-unembeddable corpus, or an unembeddable query, yields
/// an empty result rather than an error.
///
/// Ranking uses the index's squared Euclidean distance while the presented
/// similarity is cosine, recomputed from the raw vectors. For embeddings of
/// unequal norm the two orderings can differ; the distance of each hit is
/// included so callers can see both metrics.
pub fn reverse_search<P: EmbeddingProvider + ?Sized>(
    provider: &P,
    corpus_dir: &Path,
    query: &Path,
    top_k: usize,
) -> Result<Vec<SearchHit>> {
    let paths = list_images(corpus_dir, &default_extensions());

    let mut embeddings = Vec::new();
    let mut ids = Vec::new();
    for path in &paths {
        match provider.embed_path(path) {
            EmbedOutcome::Embedded(embedding) => {
                embeddings.push(embedding);
                ids.push(path.display().to_string());
            }
            EmbedOutcome::Skipped(reason) => {
                log::warn!("corpus image {} skipped: {}", path.display(), reason);
            }
        }
    }

    if embeddings.is_empty() {
        log::warn!("no valid images found in {}", corpus_dir.display());
        return Ok(Vec::new());
    }

    let index = FlatIndex::build(&embeddings)?;

    let query_embedding = match provider.embed_path(query) {
        EmbedOutcome::Embedded(embedding) => embedding,
        EmbedOutcome::Skipped(reason) => {
            log::warn!("query {} skipped: {}", query.display(), reason);
            return Ok(Vec::new());
        }
    };

    let hits = index
        .search(&query_embedding, top_k)
        .into_iter()
        .enumerate()
        .map(|(i, (row, distance))| {
            let similarity = cosine_similarity(&query_embedding, &embeddings[row]);
            let confidence = confidence_score(similarity);
            SearchHit {
                rank: i + 1,
                candidate: ids[row].clone(),
                similarity,
                confidence,
                label: confidence_label(confidence),
                distance,
            }
        })
        .collect();

    Ok(hits)
}
