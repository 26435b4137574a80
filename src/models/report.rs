use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::embeddings::SkipReason;
use crate::error::Result;

/// Qualitative verdict tier for a confidence score.
///
/// Tiers are ordered from weakest to strongest, so records can be compared
/// (`label >= ConfidenceLabel::VeryLikely`) without going back to the raw
/// score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceLabel {
    /// Confidence of 85 or below.
    #[serde(rename = "Unlikely to be the same image")]
    Unlikely,
    /// Confidence above 85.
    #[serde(rename = "Possibly the same image")]
    Possibly,
    /// Confidence above 90.
    #[serde(rename = "Very likely the same image")]
    VeryLikely,
    /// Confidence above 95.
    #[serde(rename = "Extremely likely the same image")]
    ExtremelyLikely,
}

impl fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Unlikely => "Unlikely to be the same image",
            Self::Possibly => "Possibly the same image",
            Self::VeryLikely => "Very likely the same image",
            Self::ExtremelyLikely => "Extremely likely the same image",
        };
        f.write_str(text)
    }
}

/// One scored (reference, candidate) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Path of the candidate image.
    pub candidate: String,
    /// Cosine similarity against the reference, in [-1, 1].
    pub similarity: f32,
    /// Similarity rescaled to a [0, 100] percentage.
    pub confidence: f32,
    /// Qualitative verdict derived from the confidence.
    pub label: ConfidenceLabel,
}

/// A candidate left out of a comparison, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCandidate {
    /// Path of the skipped candidate image.
    pub candidate: String,
    /// Why the candidate could not be embedded.
    pub reason: SkipReason,
}

/// Aggregate outcome of comparing one reference image against a candidate set.
///
/// Created fresh per reference and never mutated after return. Statistics
/// cover every candidate that produced an embedding; skipped candidates are
/// excluded from `compared` and listed separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Number of candidates that produced an embedding.
    pub compared: usize,
    /// Number of candidates at or above the similarity threshold.
    pub matches: usize,
    /// `matches / compared`, or 0.0 when nothing was compared.
    pub match_ratio: f32,
    /// Arithmetic mean over all recorded similarities, not just matches.
    pub mean_similarity: f32,
    /// Whether at least one candidate matched.
    pub is_duplicate: bool,
    /// One record per compared candidate, in candidate order.
    pub records: Vec<MatchRecord>,
    /// Candidates excluded from the comparison, with reasons.
    pub skipped: Vec<SkippedCandidate>,
}

impl ComparisonResult {
    /// Zero-valued result, returned when the reference itself cannot be
    /// embedded.
    pub(crate) fn empty() -> Self {
        Self {
            compared: 0,
            matches: 0,
            match_ratio: 0.0,
            mean_similarity: 0.0,
            is_duplicate: false,
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// One hit from a reverse image search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// 1-based position in the result list.
    pub rank: usize,
    /// Path of the matched corpus image.
    pub candidate: String,
    /// Cosine similarity recomputed from the raw vectors.
    pub similarity: f32,
    /// Similarity rescaled to a [0, 100] percentage.
    pub confidence: f32,
    /// Qualitative verdict derived from the confidence.
    pub label: ConfidenceLabel,
    /// The index's native squared Euclidean distance.
    pub distance: f32,
}

/// Per-reference entry in a batch report.
///
/// The statistics always reflect the entire candidate set; `top_matches` is
/// capped for presentation and contains only records at or above the
/// threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceMatches {
    /// Full path of the reference image.
    pub reference_path: String,
    /// Number of candidates that produced an embedding.
    pub compared: usize,
    /// Number of candidates at or above the similarity threshold.
    pub matches: usize,
    /// `matches / compared`, or 0.0 when nothing was compared.
    pub match_ratio: f32,
    /// Arithmetic mean over all recorded similarities.
    pub mean_similarity: f32,
    /// Whether at least one candidate matched.
    pub is_duplicate: bool,
    /// Qualifying matches, sorted by similarity descending, capped.
    pub top_matches: Vec<MatchRecord>,
    /// Number of candidates skipped for this reference.
    pub skipped: usize,
}

/// Corpus-wide aggregates over a batch report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// References processed.
    pub references: usize,
    /// References with at least one match.
    pub references_with_matches: usize,
    /// Total matches across all references.
    pub total_matches: usize,
    /// Mean of the per-reference mean similarities.
    pub mean_similarity: f32,
}

/// Top-level deliverable of a batch matching run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// When the report was generated (RFC 3339 format).
    pub generated_at: String,
    /// Similarity threshold the run was configured with.
    pub threshold: f32,
    /// Per-reference results, keyed by reference file name.
    pub results: BTreeMap<String, ReferenceMatches>,
    /// Aggregates over all references.
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Serializes the report to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a `BatchReport` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        Ok(serde_json::from_str(json_str)?)
    }
}
