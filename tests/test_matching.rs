use std::collections::HashMap;
use std::path::Path;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

use dropcheck::{
    reverse_search, BatchMatcher, BatchReport, ConfidenceLabel, EmbedOutcome, Embedding,
    EmbeddingProvider, MatcherConfig, SkipReason,
};

/// Deterministic provider mapping file stems to fixed vectors.
///
/// Existing files whose stem is unknown are treated as undecodable, which
/// mirrors how the real encoder classifies corrupt images.
struct FakeProvider {
    vectors: HashMap<String, Vec<f32>>,
}

impl FakeProvider {
    fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        let vectors = entries
            .iter()
            .map(|(stem, v)| (stem.to_string(), v.clone()))
            .collect();
        Self { vectors }
    }
}

impl EmbeddingProvider for FakeProvider {
    fn model_id(&self) -> &str {
        "fake-deterministic"
    }

    fn embed_image(&self, _image: &image::DynamicImage) -> anyhow::Result<Embedding> {
        anyhow::bail!("fake provider resolves images by path")
    }

    fn embed_path(&self, path: &Path) -> EmbedOutcome {
        if !path.exists() {
            return EmbedOutcome::Skipped(SkipReason::Missing);
        }
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        match self.vectors.get(stem) {
            Some(v) => EmbedOutcome::Embedded(Embedding::from_vec(v.clone())),
            None => EmbedOutcome::Skipped(SkipReason::Undecodable),
        }
    }
}

/// A 6-dimensional vector with cosine similarity `s` against the axis at
/// `offset`, and zero similarity against the other axes.
fn off_axis(offset: usize, s: f32) -> Vec<f32> {
    let mut v = vec![0.0; 6];
    v[offset] = s;
    v[offset + 1] = (1.0 - s * s).sqrt();
    v
}

fn axis(offset: usize) -> Vec<f32> {
    let mut v = vec![0.0; 6];
    v[offset] = 1.0;
    v
}

fn touch_all(dir: &TempDir, names: &[&str]) {
    for name in names {
        dir.child(name).touch().unwrap();
    }
}

#[test]
fn test_batch_counts_matches_per_reference() {
    let references = TempDir::new().unwrap();
    let candidates = TempDir::new().unwrap();
    touch_all(&references, &["ref_a.jpg", "ref_b.jpg", "ref_c.jpg"]);
    touch_all(
        &candidates,
        &["cand_high.jpg", "cand_mid.jpg", "cand_boundary.jpg"],
    );

    let provider = FakeProvider::new(&[
        ("ref_a", axis(0)),
        ("ref_b", axis(2)),
        ("ref_c", axis(4)),
        ("cand_high", off_axis(0, 0.9)),
        ("cand_mid", off_axis(0, 0.7)),
        // [3, 4] on the ref_c axis pair: similarity exactly 3/5 = 0.6
        ("cand_boundary", {
            let mut v = vec![0.0; 6];
            v[4] = 3.0;
            v[5] = 4.0;
            v
        }),
    ]);

    let config = MatcherConfig {
        similarity_threshold: 0.6,
        ..MatcherConfig::default()
    };
    let matcher = BatchMatcher::with_config(provider, config);
    let report = matcher.run(references.path(), candidates.path());

    assert_eq!(report.summary.references, 3);
    assert_eq!(report.summary.references_with_matches, 2);
    assert_eq!(report.summary.total_matches, 3);

    let a = &report.results["ref_a.jpg"];
    let b = &report.results["ref_b.jpg"];
    let c = &report.results["ref_c.jpg"];

    assert_eq!(a.matches, 2);
    assert_eq!(b.matches, 0);
    assert_eq!(c.matches, 1);
    assert!(a.is_duplicate);
    assert!(!b.is_duplicate);
    assert!(c.is_duplicate);
    for entry in [a, b, c] {
        assert_eq!(entry.compared, 3);
    }

    // Presented matches are sorted by similarity descending
    assert!(a.top_matches[0].candidate.ends_with("cand_high.jpg"));
    assert!(a.top_matches[1].candidate.ends_with("cand_mid.jpg"));
    // The match at exactly the threshold is kept
    assert!(c.top_matches[0].candidate.ends_with("cand_boundary.jpg"));
}

#[test]
fn test_top_n_capping_keeps_full_statistics() {
    let references = TempDir::new().unwrap();
    let candidates = TempDir::new().unwrap();
    touch_all(&references, &["ref.jpg"]);

    let mut entries: Vec<(String, Vec<f32>)> = vec![("ref".to_string(), vec![1.0, 0.0])];
    let mut names = Vec::new();
    for i in 0..15 {
        let s = 0.70 + 0.01 * i as f32;
        let stem = format!("m{:02}", i);
        names.push(format!("{}.jpg", stem));
        entries.push((stem, vec![s, (1.0 - s * s).sqrt()]));
    }
    for name in &names {
        candidates.child(name).touch().unwrap();
    }
    let entry_refs: Vec<(&str, Vec<f32>)> = entries
        .iter()
        .map(|(stem, v)| (stem.as_str(), v.clone()))
        .collect();

    let matcher = BatchMatcher::new(FakeProvider::new(&entry_refs));
    let report = matcher.run(references.path(), candidates.path());

    let entry = &report.results["ref.jpg"];
    assert_eq!(entry.compared, 15);
    assert_eq!(entry.matches, 15);
    assert_eq!(entry.top_matches.len(), 10);
    for pair in entry.top_matches.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
    assert!(entry.top_matches[0].candidate.ends_with("m14.jpg"));
    assert!(entry.top_matches[9].candidate.ends_with("m05.jpg"));

    // Statistics cover all 15 candidates, not the presented 10
    let expected_mean = (0..15).map(|i| 0.70 + 0.01 * i as f32).sum::<f32>() / 15.0;
    assert!((entry.mean_similarity - expected_mean).abs() < 1e-3);
    assert!((entry.match_ratio - 1.0).abs() < 1e-6);
}

#[test]
fn test_unreadable_candidates_are_reported_as_skipped() {
    let references = TempDir::new().unwrap();
    let candidates = TempDir::new().unwrap();
    touch_all(&references, &["ref.jpg"]);
    touch_all(&candidates, &["good.jpg", "broken.jpg"]);

    let provider = FakeProvider::new(&[("ref", vec![1.0, 0.0]), ("good", vec![1.0, 0.0])]);
    let matcher = BatchMatcher::new(provider);
    let report = matcher.run(references.path(), candidates.path());

    let entry = &report.results["ref.jpg"];
    assert_eq!(entry.compared, 1);
    assert_eq!(entry.matches, 1);
    assert_eq!(entry.skipped, 1);
}

#[test]
fn test_missing_folders_produce_empty_report() {
    let candidates = TempDir::new().unwrap();
    touch_all(&candidates, &["cand.jpg"]);

    let provider = FakeProvider::new(&[("cand", vec![1.0, 0.0])]);
    let matcher = BatchMatcher::new(provider);
    let report = matcher.run(Path::new("does/not/exist"), candidates.path());

    assert!(report.results.is_empty());
    assert_eq!(report.summary.references, 0);
    assert_eq!(report.summary.references_with_matches, 0);
    assert_eq!(report.summary.total_matches, 0);
    assert_eq!(report.summary.mean_similarity, 0.0);
}

#[test]
fn test_empty_candidate_folder_yields_zero_counts() {
    let references = TempDir::new().unwrap();
    let candidates = TempDir::new().unwrap();
    touch_all(&references, &["ref.jpg"]);

    let provider = FakeProvider::new(&[("ref", vec![1.0, 0.0])]);
    let matcher = BatchMatcher::new(provider);
    let report = matcher.run(references.path(), candidates.path());

    let entry = &report.results["ref.jpg"];
    assert_eq!(entry.compared, 0);
    assert_eq!(entry.matches, 0);
    assert_eq!(entry.match_ratio, 0.0);
    assert!(!entry.is_duplicate);
}

#[test]
fn test_reverse_search_finds_identical_image_first() {
    let corpus = TempDir::new().unwrap();
    let queries = TempDir::new().unwrap();
    touch_all(&corpus, &["c0.jpg", "c1.jpg", "c2.jpg", "c3.jpg", "c4.jpg"]);
    queries.child("query.jpg").touch().unwrap();

    let provider = FakeProvider::new(&[
        ("c0", off_axis(0, 0.2)),
        ("c1", off_axis(0, 0.4)),
        ("c2", off_axis(0, 0.8)),
        ("c3", off_axis(2, 0.5)),
        ("c4", axis(4)),
        ("query", off_axis(0, 0.8)),
    ]);

    let hits = reverse_search(
        &provider,
        corpus.path(),
        queries.child("query.jpg").path(),
        3,
    )
    .unwrap();

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].rank, 1);
    assert!(predicate::str::ends_with("c2.jpg").eval(&hits[0].candidate));
    assert!((hits[0].similarity - 1.0).abs() < 1e-5);
    assert!(hits[0].distance.abs() < 1e-5);
    assert_eq!(hits[0].label, ConfidenceLabel::ExtremelyLikely);
    for pair in hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[test]
fn test_reverse_search_empty_corpus_returns_no_hits() {
    let corpus = TempDir::new().unwrap();
    let queries = TempDir::new().unwrap();
    queries.child("query.jpg").touch().unwrap();

    let provider = FakeProvider::new(&[("query", vec![1.0, 0.0])]);
    let hits = reverse_search(
        &provider,
        corpus.path(),
        queries.child("query.jpg").path(),
        5,
    )
    .unwrap();

    assert!(hits.is_empty());
}

#[test]
fn test_report_round_trips_through_json() {
    let references = TempDir::new().unwrap();
    let candidates = TempDir::new().unwrap();
    touch_all(&references, &["ref.jpg"]);
    touch_all(&candidates, &["copy.jpg"]);

    let provider = FakeProvider::new(&[
        ("ref", vec![1.0, 0.0]),
        ("copy", off_axis(0, 0.99)),
    ]);
    let matcher = BatchMatcher::new(provider);
    let report = matcher.run(references.path(), candidates.path());

    let json = report.to_json().unwrap();
    assert!(predicate::str::contains("Extremely likely the same image").eval(&json));

    let restored = BatchReport::from_json(&json).unwrap();
    assert_eq!(restored.summary, report.summary);
    assert_eq!(
        restored.results["ref.jpg"].top_matches[0].label,
        ConfidenceLabel::ExtremelyLikely
    );
}
